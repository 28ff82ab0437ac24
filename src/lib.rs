//! registry-replicator
//!
//! A declarative, multi-registry container-image replicator: given a YAML
//! specification naming a source registry, a destination registry, and a set of
//! image-selection rules, it materializes those rules into concrete
//! source→destination copy tasks and executes them with bounded concurrency,
//! adaptive batching, retries, and deduplicated per-registry client state.
//!
//! ## Main modules
//! - [`config`] - the YAML specification schema, validation, and registry-type
//!   auto-detection.
//! - [`manifest`] - Docker v2 / OCI v1 manifest model, format detection, and
//!   lossless conversion between the two.
//! - [`filter`] - the tag selection pipeline: primary criteria, secondary
//!   operators, and architecture-aware filtering.
//! - [`size`] - manifest-derived transfer size estimation.
//! - [`planner`] - expansion of specification entries into ordered `SyncTask`s.
//! - [`executor`] - the adaptive batch executor that drives tasks to completion.
//! - [`registry`] - the narrow registry capability trait plus its HTTP-backed
//!   implementation and client pool.
//! - [`copy`] - the copy driver invoking the external image-copy capability.
//! - [`digest`] - content digest parsing (`algorithm:hex`).
//! - [`error`] - the crate-wide error type.
//! - [`cli`] - command-line argument parsing.
//! - [`logging`] - user-facing output control.

pub mod cli;
pub mod config;
pub mod copy;
pub mod digest;
pub mod error;
pub mod executor;
pub mod filter;
pub mod logging;
pub mod manifest;
pub mod planner;
pub mod registry;
pub mod size;

pub use config::ReplicationSpec;
pub use digest::Digest;
pub use error::{ReplicatorError, Result};
pub use planner::{SyncResult, SyncTask};
