//! Crate-wide error type.
//!
//! Variants map 1:1 onto the error kinds enumerated by the replication engine's
//! design: manifest parsing/conversion, tag filtering and architecture detection,
//! size estimation, planning, and batch execution. Network-facing code lives behind
//! the [`crate::registry`] capability traits, so most variants here carry enough
//! repository/tag/digest context to be actionable without a backtrace.

use std::time::Duration;

pub type Result<T> = std::result::Result<T, ReplicatorError>;

#[derive(Debug, thiserror::Error)]
pub enum ReplicatorError {
    /// Specification failed validation before any tasks ran.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Manifest bytes could not be parsed as JSON, or failed shape validation.
    #[error("failed to parse manifest for {repository}:{reference}: {message}")]
    ManifestParse {
        repository: String,
        reference: String,
        message: String,
    },

    /// Format detection did not recognize the media type / schema version.
    #[error("unknown manifest type (mediaType={media_type:?}, schemaVersion={schema_version:?})")]
    UnknownManifestType {
        media_type: Option<String>,
        schema_version: Option<u32>,
    },

    /// Docker Image Manifest v1 was encountered where conversion or size
    /// estimation was required; v1 is deprecated and carries no layer sizes.
    #[error("Docker v1 manifest for {repository}:{reference} is unsupported: {reason}")]
    DockerV1Unsupported {
        repository: String,
        reference: String,
        reason: String,
    },

    /// A manifest or config-blob fetch against the registry capability failed.
    #[error("failed to fetch manifest for {repository}:{reference}: {message}")]
    ManifestFetch {
        repository: String,
        reference: String,
        message: String,
    },

    /// Size estimation failed for a task; callers treat this as "unknown size".
    #[error("failed to estimate size for {repository}:{reference}: {message}")]
    SizeEstimate {
        repository: String,
        reference: String,
        message: String,
    },

    /// The copy driver's invocation of the external copy capability failed.
    #[error("copy failed for {source} -> {destination}: {message}")]
    CopyFailed {
        source: String,
        destination: String,
        message: String,
    },

    /// The task's context was cancelled or its deadline elapsed.
    #[error("task cancelled after {attempts} attempt(s) ({elapsed:?}): {cause}")]
    ContextCancelled {
        attempts: usize,
        elapsed: Duration,
        cause: String,
    },

    /// One or more batches failed and `continueOnError` was false.
    #[error("{failed_batches} of {total_batches} batch(es) failed")]
    BatchAggregate {
        failed_batches: usize,
        total_batches: usize,
    },

    /// Digest string did not parse as `algorithm:hex`.
    #[error("invalid digest {digest:?}: {message}")]
    InvalidDigest { digest: String, message: String },

    #[error("registry error: {0}")]
    Registry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ReplicatorError {
    fn from(err: serde_json::Error) -> Self {
        ReplicatorError::ManifestParse {
            repository: String::new(),
            reference: String::new(),
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ReplicatorError {
    fn from(err: serde_yaml::Error) -> Self {
        ReplicatorError::ConfigInvalid(err.to_string())
    }
}

impl From<reqwest::Error> for ReplicatorError {
    fn from(err: reqwest::Error) -> Self {
        ReplicatorError::Registry(err.to_string())
    }
}

impl From<regex::Error> for ReplicatorError {
    fn from(err: regex::Error) -> Self {
        ReplicatorError::ConfigInvalid(format!("invalid regex: {}", err))
    }
}

