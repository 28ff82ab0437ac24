//! Manifest model: typed representations of Docker v2 Schema 2 and OCI v1
//! manifests (single-arch and multi-arch), format detection, and lossless
//! conversion between the two. Everything the engine reasons about — sizes,
//! architectures, layer digests — is derived from this model.

pub mod convert;
pub mod descriptor;
pub mod detect;
pub mod docker;
pub mod normalize;
pub mod oci;
pub mod platform;

pub use convert::{convert, ConvertOptions};
pub use descriptor::Descriptor;
pub use detect::{detect_and_parse, Manifest};
pub use normalize::{normalize, StandardManifest};
pub use platform::Platform;
