//! OCI Image Specification v1 wire shapes: single-arch manifest and image index.

use crate::manifest::descriptor::Descriptor;
use crate::manifest::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MEDIA_TYPE_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
pub const MEDIA_TYPE_INDEX: &str = "application/vnd.oci.image.index.v1+json";
pub const MEDIA_TYPE_CONFIG: &str = "application/vnd.oci.image.config.v1+json";
pub const MEDIA_TYPE_LAYER_GZIP: &str = "application/vnd.oci.image.layer.v1.tar+gzip";
pub const MEDIA_TYPE_LAYER: &str = "application/vnd.oci.image.layer.v1.tar";
pub const MEDIA_TYPE_LAYER_NONDISTRIBUTABLE_GZIP: &str =
    "application/vnd.oci.image.layer.nondistributable.v1.tar+gzip";

/// OCI single-arch image manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OciManifest {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    #[serde(rename = "mediaType", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(rename = "artifactType", skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    pub config: Descriptor,
    pub layers: Vec<Descriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
}

impl OciManifest {
    pub fn validate(&self, strict: bool) -> crate::error::Result<()> {
        if self.schema_version != 2 {
            return Err(crate::error::ReplicatorError::ManifestParse {
                repository: String::new(),
                reference: String::new(),
                message: format!("unsupported schemaVersion {}", self.schema_version),
            });
        }
        if strict && self.layers.is_empty() {
            return Err(crate::error::ReplicatorError::ManifestParse {
                repository: String::new(),
                reference: String::new(),
                message: "manifest must contain at least one layer".to_string(),
            });
        }
        Ok(())
    }
}

/// OCI image index: ordered list of platform-tagged manifest descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OciIndex {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    #[serde(rename = "mediaType", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(rename = "artifactType", skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    pub manifests: Vec<Descriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
}

impl OciIndex {
    pub fn validate(&self) -> crate::error::Result<()> {
        for (i, a) in self.manifests.iter().enumerate() {
            let Some(pa) = &a.platform else { continue };
            for b in &self.manifests[i + 1..] {
                let Some(pb) = &b.platform else { continue };
                if pa.matches(pb) {
                    return Err(crate::error::ReplicatorError::ManifestParse {
                        repository: String::new(),
                        reference: String::new(),
                        message: format!("duplicate platform entry {:?}", pa),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn platforms(&self) -> Vec<&Platform> {
        self.manifests.iter().filter_map(|d| d.platform.as_ref()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;

    fn descriptor(size: u64) -> Descriptor {
        Descriptor::new(
            MEDIA_TYPE_LAYER_GZIP,
            size,
            Digest::from_sha256_bytes(format!("layer-{size}").as_bytes()),
        )
    }

    #[test]
    fn index_rejects_duplicate_platforms() {
        let mut a = descriptor(10);
        a.platform = Some(Platform::new("linux", "arm64"));
        let mut b = descriptor(20);
        b.platform = Some(Platform::new("linux", "arm64"));
        let index = OciIndex {
            schema_version: 2,
            media_type: Some(MEDIA_TYPE_INDEX.to_string()),
            artifact_type: None,
            manifests: vec![a, b],
            subject: None,
            annotations: None,
        };
        assert!(index.validate().is_err());
    }

    #[test]
    fn manifest_strict_validate_requires_layers() {
        let m = OciManifest {
            schema_version: 2,
            media_type: Some(MEDIA_TYPE_MANIFEST.to_string()),
            artifact_type: None,
            config: descriptor(1),
            layers: vec![],
            subject: None,
            annotations: None,
        };
        assert!(m.validate(true).is_err());
        assert!(m.validate(false).is_ok());
    }
}
