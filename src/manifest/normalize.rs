//! Normalization into `StandardManifest`, the common intermediate size estimation
//! and planner logic read instead of matching on every wire variant themselves.

use crate::manifest::descriptor::Descriptor;
use crate::manifest::detect::Manifest;
use std::collections::HashMap;

/// The common shape every single-arch or multi-arch manifest normalizes to.
/// Docker v1 normalizes with `config = None` and no layers, which is the reason
/// size estimation fails for it downstream (see [`crate::size`]).
#[derive(Debug, Clone, PartialEq)]
pub struct StandardManifest {
    pub schema_version: u32,
    pub media_type: Option<String>,
    pub config: Option<Descriptor>,
    pub layers: Vec<Descriptor>,
    pub platform_manifests: Vec<Descriptor>,
    pub annotations: Option<HashMap<String, String>>,
    pub subject: Option<Descriptor>,
    pub artifact_type: Option<String>,
}

impl StandardManifest {
    pub fn is_multi_arch(&self) -> bool {
        !self.platform_manifests.is_empty()
    }
}

pub fn normalize(m: &Manifest) -> StandardManifest {
    match m {
        Manifest::DockerV2Single(d) => StandardManifest {
            schema_version: d.schema_version,
            media_type: Some(d.media_type.clone()),
            config: Some(d.config.clone()),
            layers: d.layers.clone(),
            platform_manifests: Vec::new(),
            annotations: d.annotations.clone(),
            subject: None,
            artifact_type: None,
        },
        Manifest::OciSingle(o) => StandardManifest {
            schema_version: o.schema_version,
            media_type: o.media_type.clone(),
            config: Some(o.config.clone()),
            layers: o.layers.clone(),
            platform_manifests: Vec::new(),
            annotations: o.annotations.clone(),
            subject: o.subject.clone(),
            artifact_type: o.artifact_type.clone(),
        },
        Manifest::DockerList(l) => StandardManifest {
            schema_version: l.schema_version,
            media_type: Some(l.media_type.clone()),
            config: None,
            layers: Vec::new(),
            platform_manifests: l.manifests.clone(),
            annotations: None,
            subject: None,
            artifact_type: None,
        },
        Manifest::OciIndex(i) => StandardManifest {
            schema_version: i.schema_version,
            media_type: i.media_type.clone(),
            config: None,
            layers: Vec::new(),
            platform_manifests: i.manifests.clone(),
            annotations: i.annotations.clone(),
            subject: i.subject.clone(),
            artifact_type: i.artifact_type.clone(),
        },
        Manifest::DockerV1Single(v1) => StandardManifest {
            schema_version: v1.schema_version,
            media_type: None,
            config: None,
            layers: Vec::new(),
            platform_manifests: Vec::new(),
            annotations: None,
            subject: None,
            artifact_type: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;
    use crate::manifest::docker::{DockerManifest, MEDIA_TYPE_MANIFEST_V2};

    #[test]
    fn docker_v1_normalizes_with_zero_size_fields() {
        let v1 = Manifest::DockerV1Single(crate::manifest::docker::DockerV1Manifest {
            schema_version: 1,
            name: None,
            tag: None,
        });
        let standard = normalize(&v1);
        assert!(standard.config.is_none());
        assert!(standard.layers.is_empty());
    }

    #[test]
    fn docker_single_normalizes_config_and_layers() {
        let config = Descriptor::new(
            "application/vnd.docker.container.image.v1+json",
            10,
            Digest::from_sha256_bytes(b"cfg"),
        );
        let layer = Descriptor::new(
            "application/vnd.docker.image.rootfs.diff.tar.gzip",
            20,
            Digest::from_sha256_bytes(b"layer"),
        );
        let m = Manifest::DockerV2Single(DockerManifest {
            schema_version: 2,
            media_type: MEDIA_TYPE_MANIFEST_V2.to_string(),
            config: config.clone(),
            layers: vec![layer.clone()],
            annotations: None,
        });
        let standard = normalize(&m);
        assert_eq!(standard.config, Some(config));
        assert_eq!(standard.layers, vec![layer]);
        assert!(!standard.is_multi_arch());
    }
}
