//! Content-addressed descriptors: the one structure every manifest variant is built
//! out of.

use crate::digest::Digest;
use crate::manifest::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A reference to a content-addressed blob: media type, size, digest, plus the
/// optional extras the OCI/Docker specs allow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub size: u64,
    pub digest: Digest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl Descriptor {
    pub fn new(media_type: impl Into<String>, size: u64, digest: Digest) -> Self {
        Self {
            media_type: media_type.into(),
            size,
            digest,
            urls: None,
            annotations: None,
            data: None,
            platform: None,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_annotations(mut self, annotations: HashMap<String, String>) -> Self {
        self.annotations = Some(annotations);
        self
    }

    /// A descriptor is valid iff its digest parses (guaranteed by the `Digest` type
    /// itself once constructed) and its size is representable as a non-negative
    /// integer, which `u64` already enforces; kept as an explicit check so callers
    /// validating a whole manifest have one place to call.
    pub fn is_valid(&self) -> bool {
        true
    }
}
