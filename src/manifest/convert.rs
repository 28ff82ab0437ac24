//! Lossless Docker v2 Schema 2 ↔ OCI v1 conversion.
//!
//! Descriptor size/digest/URLs are always copied verbatim; only media types are
//! rewritten, following the table each direction's `rewrite_*` function implements.
//! Docker v1 cannot be converted in either direction — it's deprecated and carries
//! no layer sizes.

use crate::error::{ReplicatorError, Result};
use crate::manifest::descriptor::Descriptor;
use crate::manifest::detect::Manifest;
use crate::manifest::docker::{self, DockerManifest, DockerManifestList};
use crate::manifest::oci::{self, OciIndex, OciManifest};

/// Conversion options. `preserve_annotations` defaults to `true`; `strict`, when
/// set, runs the source format's own `validate()` before emitting the target.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    pub preserve_annotations: bool,
    pub strict: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            preserve_annotations: true,
            strict: false,
        }
    }
}

fn rewrite_descriptor(d: &Descriptor, new_media_type: String, opts: &ConvertOptions) -> Descriptor {
    let mut out = d.clone();
    out.media_type = new_media_type;
    if !opts.preserve_annotations {
        out.annotations = None;
    }
    out
}

fn docker_config_to_oci(media_type: &str) -> String {
    if media_type == docker::MEDIA_TYPE_CONFIG {
        oci::MEDIA_TYPE_CONFIG.to_string()
    } else {
        media_type.to_string()
    }
}

fn oci_config_to_docker(media_type: &str) -> String {
    if media_type == oci::MEDIA_TYPE_CONFIG {
        docker::MEDIA_TYPE_CONFIG.to_string()
    } else {
        media_type.to_string()
    }
}

fn docker_layer_to_oci(media_type: &str) -> String {
    match media_type {
        docker::MEDIA_TYPE_LAYER_GZIP => oci::MEDIA_TYPE_LAYER_GZIP.to_string(),
        docker::MEDIA_TYPE_LAYER => oci::MEDIA_TYPE_LAYER.to_string(),
        docker::MEDIA_TYPE_LAYER_FOREIGN => oci::MEDIA_TYPE_LAYER_NONDISTRIBUTABLE_GZIP.to_string(),
        other => other.to_string(),
    }
}

fn oci_layer_to_docker(media_type: &str) -> String {
    match media_type {
        oci::MEDIA_TYPE_LAYER_GZIP => docker::MEDIA_TYPE_LAYER_GZIP.to_string(),
        oci::MEDIA_TYPE_LAYER => docker::MEDIA_TYPE_LAYER.to_string(),
        oci::MEDIA_TYPE_LAYER_NONDISTRIBUTABLE_GZIP => docker::MEDIA_TYPE_LAYER_FOREIGN.to_string(),
        // Any other standard OCI layer type collapses to the Docker gzipped layer.
        other if other.starts_with("application/vnd.oci.image.layer.v1") => {
            docker::MEDIA_TYPE_LAYER_GZIP.to_string()
        }
        other => other.to_string(),
    }
}

pub fn docker_to_oci_single(m: &DockerManifest, opts: ConvertOptions) -> Result<OciManifest> {
    if opts.strict {
        m.validate(true)?;
    }
    let config = rewrite_descriptor(&m.config, docker_config_to_oci(&m.config.media_type), &opts);
    let layers = m
        .layers
        .iter()
        .map(|l| rewrite_descriptor(l, docker_layer_to_oci(&l.media_type), &opts))
        .collect();
    Ok(OciManifest {
        schema_version: m.schema_version,
        media_type: Some(oci::MEDIA_TYPE_MANIFEST.to_string()),
        artifact_type: None,
        config,
        layers,
        subject: None,
        annotations: if opts.preserve_annotations { m.annotations.clone() } else { None },
    })
}

pub fn oci_to_docker_single(m: &OciManifest, opts: ConvertOptions) -> Result<DockerManifest> {
    if opts.strict {
        m.validate(true)?;
    }
    let config = rewrite_descriptor(&m.config, oci_config_to_docker(&m.config.media_type), &opts);
    let layers = m
        .layers
        .iter()
        .map(|l| rewrite_descriptor(l, oci_layer_to_docker(&l.media_type), &opts))
        .collect();
    Ok(DockerManifest {
        schema_version: m.schema_version,
        media_type: docker::MEDIA_TYPE_MANIFEST_V2.to_string(),
        config,
        layers,
        annotations: if opts.preserve_annotations { m.annotations.clone() } else { None },
    })
}

fn rewrite_nested_manifest_media_type(media_type: &str, to_oci: bool) -> String {
    if to_oci && media_type == docker::MEDIA_TYPE_MANIFEST_V2 {
        oci::MEDIA_TYPE_MANIFEST.to_string()
    } else if !to_oci && media_type == oci::MEDIA_TYPE_MANIFEST {
        docker::MEDIA_TYPE_MANIFEST_V2.to_string()
    } else {
        media_type.to_string()
    }
}

pub fn docker_list_to_oci_index(m: &DockerManifestList, opts: ConvertOptions) -> Result<OciIndex> {
    if opts.strict {
        m.validate()?;
    }
    let manifests = m
        .manifests
        .iter()
        .map(|d| rewrite_descriptor(d, rewrite_nested_manifest_media_type(&d.media_type, true), &opts))
        .collect();
    Ok(OciIndex {
        schema_version: m.schema_version,
        media_type: Some(oci::MEDIA_TYPE_INDEX.to_string()),
        artifact_type: None,
        manifests,
        subject: None,
        annotations: None,
    })
}

pub fn oci_index_to_docker_list(m: &OciIndex, opts: ConvertOptions) -> Result<DockerManifestList> {
    if opts.strict {
        m.validate()?;
    }
    let manifests = m
        .manifests
        .iter()
        .map(|d| rewrite_descriptor(d, rewrite_nested_manifest_media_type(&d.media_type, false), &opts))
        .collect();
    Ok(DockerManifestList {
        schema_version: m.schema_version,
        media_type: docker::MEDIA_TYPE_MANIFEST_LIST.to_string(),
        manifests,
    })
}

/// Convert Docker v1 is always an error: v1 omits layer sizes and predates the
/// content-addressed layer model the rest of the engine relies on.
pub fn convert(m: &Manifest, opts: ConvertOptions) -> Result<Manifest> {
    match m {
        Manifest::DockerV2Single(d) => Ok(Manifest::OciSingle(docker_to_oci_single(d, opts)?)),
        Manifest::OciSingle(o) => Ok(Manifest::DockerV2Single(oci_to_docker_single(o, opts)?)),
        Manifest::DockerList(l) => Ok(Manifest::OciIndex(docker_list_to_oci_index(l, opts)?)),
        Manifest::OciIndex(i) => Ok(Manifest::DockerList(oci_index_to_docker_list(i, opts)?)),
        Manifest::DockerV1Single(_) => Err(ReplicatorError::DockerV1Unsupported {
            repository: String::new(),
            reference: String::new(),
            reason: "Docker Schema 1 manifests cannot be converted".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;

    fn layer_descriptor(media_type: &str, digest_seed: &str, size: u64) -> Descriptor {
        Descriptor::new(media_type, size, Digest::from_sha256_bytes(digest_seed.as_bytes()))
    }

    #[test]
    fn docker_to_oci_single_arch_scenario() {
        let config = Descriptor::new(
            docker::MEDIA_TYPE_CONFIG,
            1234,
            Digest::parse("sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08")
                .unwrap(),
        );
        let layer = Descriptor::new(
            docker::MEDIA_TYPE_LAYER_GZIP,
            5678,
            Digest::parse("sha256:6c3c624b58dbbcd3c0dd82b4c53f04194d1247c6eebdac95cd9ffda00893b3b")
                .unwrap(),
        );
        let docker_manifest = DockerManifest {
            schema_version: 2,
            media_type: docker::MEDIA_TYPE_MANIFEST_V2.to_string(),
            config: config.clone(),
            layers: vec![layer.clone()],
            annotations: None,
        };

        let oci = docker_to_oci_single(&docker_manifest, ConvertOptions::default()).unwrap();

        assert_eq!(oci.media_type.as_deref(), Some(oci::MEDIA_TYPE_MANIFEST));
        assert_eq!(oci.config.media_type, oci::MEDIA_TYPE_CONFIG);
        assert_eq!(oci.config.digest, config.digest);
        assert_eq!(oci.config.size, config.size);
        assert_eq!(oci.layers[0].media_type, oci::MEDIA_TYPE_LAYER_GZIP);
        assert_eq!(oci.layers[0].digest, layer.digest);
        assert_eq!(oci.layers[0].size, layer.size);
    }

    #[test]
    fn round_trip_preserves_digests_sizes_and_layer_count() {
        let config = layer_descriptor(docker::MEDIA_TYPE_CONFIG, "config-bytes", 111);
        let l1 = layer_descriptor(docker::MEDIA_TYPE_LAYER_GZIP, "layer-one", 222);
        let l2 = layer_descriptor(docker::MEDIA_TYPE_LAYER_GZIP, "layer-two", 333);
        let docker_manifest = DockerManifest {
            schema_version: 2,
            media_type: docker::MEDIA_TYPE_MANIFEST_V2.to_string(),
            config,
            layers: vec![l1, l2],
            annotations: None,
        };

        let oci = docker_to_oci_single(&docker_manifest, ConvertOptions::default()).unwrap();
        let back = oci_to_docker_single(&oci, ConvertOptions::default()).unwrap();

        assert_eq!(back.config.digest, docker_manifest.config.digest);
        assert_eq!(back.config.size, docker_manifest.config.size);
        assert_eq!(back.layers.len(), docker_manifest.layers.len());
        for (a, b) in back.layers.iter().zip(docker_manifest.layers.iter()) {
            assert_eq!(a.digest, b.digest);
        }
    }

    #[test]
    fn annotations_preserved_round_trip_when_enabled() {
        let mut annotations = std::collections::HashMap::new();
        annotations.insert("org.opencontainers.image.source".to_string(), "example".to_string());
        let docker_manifest = DockerManifest {
            schema_version: 2,
            media_type: docker::MEDIA_TYPE_MANIFEST_V2.to_string(),
            config: layer_descriptor(docker::MEDIA_TYPE_CONFIG, "cfg", 1),
            layers: vec![layer_descriptor(docker::MEDIA_TYPE_LAYER_GZIP, "l", 2)],
            annotations: Some(annotations.clone()),
        };
        let opts = ConvertOptions { preserve_annotations: true, strict: false };
        let oci = docker_to_oci_single(&docker_manifest, opts).unwrap();
        assert_eq!(oci.annotations, Some(annotations.clone()));
        let back = oci_to_docker_single(&oci, opts).unwrap();
        assert_eq!(back.annotations, Some(annotations));
    }

    #[test]
    fn annotations_dropped_when_preservation_disabled() {
        let mut annotations = std::collections::HashMap::new();
        annotations.insert("k".to_string(), "v".to_string());
        let docker_manifest = DockerManifest {
            schema_version: 2,
            media_type: docker::MEDIA_TYPE_MANIFEST_V2.to_string(),
            config: layer_descriptor(docker::MEDIA_TYPE_CONFIG, "cfg", 1),
            layers: vec![],
            annotations: Some(annotations),
        };
        let opts = ConvertOptions { preserve_annotations: false, strict: false };
        let oci = docker_to_oci_single(&docker_manifest, opts).unwrap();
        assert!(oci.annotations.is_none());
    }

    #[test]
    fn foreign_layer_maps_to_nondistributable() {
        let d = layer_descriptor(docker::MEDIA_TYPE_LAYER_FOREIGN, "x", 1);
        assert_eq!(
            docker_layer_to_oci(&d.media_type),
            oci::MEDIA_TYPE_LAYER_NONDISTRIBUTABLE_GZIP
        );
    }

    #[test]
    fn docker_v1_conversion_is_a_hard_error() {
        let m = Manifest::DockerV1Single(docker::DockerV1Manifest {
            schema_version: 1,
            name: Some("repo".to_string()),
            tag: Some("latest".to_string()),
        });
        let err = convert(&m, ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ReplicatorError::DockerV1Unsupported { .. }));
    }
}
