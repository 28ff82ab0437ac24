//! Registry capability: a narrow async interface the rest of the engine is built
//! against, plus one concrete HTTP-backed implementation.
//!
//! Kept intentionally small — two read verbs for manifest/config-blob access, and a
//! thin `Repository`/`RemoteOptions` shape the copy driver consumes. Concrete auth
//! resolution and the byte-level copy itself stay out of this trait; see
//! [`crate::copy`] for the invocation point and [`http`] for the one adapter this
//! crate ships.

pub mod auth;
pub mod http;
pub mod pool;

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// A fetched manifest: raw bytes plus the `Content-Type`/`mediaType` the registry
/// reported, since format detection (`crate::manifest::detect`) needs both.
#[derive(Debug, Clone)]
pub struct FetchedManifest {
    pub bytes: Vec<u8>,
    pub media_type: Option<String>,
}

/// Authentication material the copy driver hands to the external copy capability.
/// Shape only — this crate does not interpret or validate credentials itself.
#[derive(Debug, Clone, Default)]
pub struct RemoteOptions {
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
    pub insecure: bool,
}

/// A named collection of tags within a registry; the copy driver's unit of auth
/// resolution.
#[async_trait]
pub trait Repository: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    async fn remote_options(&self) -> Result<RemoteOptions>;
}

/// The capability the tag filter pipeline, size estimator, and planner are built
/// against. A registry implementation of this trait is the only thing those
/// components know about the network.
#[async_trait]
pub trait RegistryCapability: Send + Sync {
    /// List tags in a repository.
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>>;

    /// Fetch a manifest by tag or digest.
    async fn get_manifest(&self, repository: &str, reference: &str) -> Result<FetchedManifest>;

    /// Fetch a content-addressed config blob by digest.
    async fn get_config_blob(&self, repository: &str, digest: &str) -> Result<Vec<u8>>;

    /// Resolve a `Repository` handle for the copy driver's auth needs.
    async fn get_repository(&self, name: &str) -> Result<Box<dyn Repository>>;

    /// The registry's base URL; used as the client pool's cache key.
    fn registry_url(&self) -> &str;
}

/// Stats the external copy capability reports back per task. `success = false`
/// without an accompanying `Err` is still a failure — the copy driver checks this
/// explicitly rather than trusting `Ok` alone.
#[derive(Debug, Clone, Copy)]
pub struct CopyStats {
    pub success: bool,
    pub bytes_transferred: u64,
    pub layer_count: u32,
    pub pull_ms: u64,
    pub push_ms: u64,
}

impl Default for CopyStats {
    fn default() -> Self {
        Self {
            success: true,
            bytes_transferred: 0,
            layer_count: 0,
            pull_ms: 0,
            push_ms: 0,
        }
    }
}

/// Options always passed to the copy capability by the copy driver; sync semantics
/// (destination is authoritative) pin `force_overwrite = true` and `dry_run = false`
/// unconditionally.
#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub force_overwrite: bool,
    pub dry_run: bool,
    pub skip_existing: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            force_overwrite: true,
            dry_run: false,
            skip_existing: false,
        }
    }
}

/// The external byte-level image copy capability. Deliberately trait-only: this
/// crate models the invocation point, not the tar/layer transfer itself.
#[async_trait]
pub trait CopyCapability: Send + Sync {
    async fn copy_image(
        &self,
        src_ref: &str,
        dst_ref: &str,
        src_auth: &RemoteOptions,
        dst_auth: &RemoteOptions,
        options: &CopyOptions,
    ) -> Result<CopyStats>;
}
