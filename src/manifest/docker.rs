//! Docker Image Manifest v2 Schema 2 wire shapes, plus the deprecated Schema 1
//! variant we refuse to convert.

use crate::manifest::descriptor::Descriptor;
use crate::manifest::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MEDIA_TYPE_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub const MEDIA_TYPE_MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";
pub const MEDIA_TYPE_CONFIG: &str = "application/vnd.docker.container.image.v1+json";
pub const MEDIA_TYPE_LAYER_GZIP: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";
pub const MEDIA_TYPE_LAYER: &str = "application/vnd.docker.image.rootfs.diff.tar";
pub const MEDIA_TYPE_LAYER_FOREIGN: &str = "application/vnd.docker.image.rootfs.foreign.diff.tar.gzip";

/// Media types belonging to the deprecated, unconvertible Schema 1 image manifest.
pub const MEDIA_TYPE_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";
pub const MEDIA_TYPE_V1_SIGNED: &str = "application/vnd.docker.distribution.manifest.v1+prettyjws";

/// Docker v2 Schema 2 single-arch image manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerManifest {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub config: Descriptor,
    pub layers: Vec<Descriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
}

impl DockerManifest {
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

/// Docker v2 manifest list: ordered platform-tagged descriptors referencing
/// per-platform manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerManifestList {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub manifests: Vec<Descriptor>,
}

impl DockerManifestList {
    /// Index/list entries must be platform-unique under `Platform::matches`.
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

/// Deprecated Schema 1 image manifest. We only carry enough shape to detect it and
/// reject conversion/size estimation with a clear error; layer sizes are not
/// representable in this schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DockerV1Manifest {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    pub name: Option<String>,
    pub tag: Option<String>,
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
    fn validate_rejects_wrong_schema_version() {
        let m = DockerManifest {
            schema_version: 1,
            media_type: MEDIA_TYPE_MANIFEST_V2.to_string(),
            config: descriptor(100),
            layers: vec![descriptor(200)],
            annotations: None,
        };
        assert!(m.validate(false).is_err());
    }

    #[test]
    fn strict_validate_rejects_empty_layers() {
        let m = DockerManifest {
            schema_version: 2,
            media_type: MEDIA_TYPE_MANIFEST_V2.to_string(),
            config: descriptor(100),
            layers: vec![],
            annotations: None,
        };
        assert!(m.validate(true).is_err());
        assert!(m.validate(false).is_ok());
    }

    #[test]
    fn manifest_list_rejects_duplicate_platforms() {
        let mut a = descriptor(10);
        a.platform = Some(Platform::new("linux", "amd64"));
        let mut b = descriptor(20);
        b.platform = Some(Platform::new("linux", "amd64"));
        let list = DockerManifestList {
            schema_version: 2,
            media_type: MEDIA_TYPE_MANIFEST_LIST.to_string(),
            manifests: vec![a, b],
        };
        assert!(list.validate().is_err());
    }
}
