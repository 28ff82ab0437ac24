//! Format detection: classify raw manifest bytes before parsing into a typed variant.
//!
//! Dispatch on media type is the one place format-specific knowledge about the wire
//! shapes lives; everything downstream (converter, normalizer, size estimator) works
//! off the [`Manifest`] tagged variant this module produces.

use crate::error::{ReplicatorError, Result};
use crate::manifest::docker::{
    DockerManifest, DockerManifestList, DockerV1Manifest, MEDIA_TYPE_MANIFEST_LIST,
    MEDIA_TYPE_MANIFEST_V2, MEDIA_TYPE_V1, MEDIA_TYPE_V1_SIGNED,
};
use crate::manifest::oci::{OciIndex, OciManifest, MEDIA_TYPE_INDEX, MEDIA_TYPE_MANIFEST};
use serde_json::Value;

/// A manifest in one of the five concrete shapes the wire protocol defines.
/// Runtime polymorphism is unnecessary here: every operation dispatches by
/// pattern-matching the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    DockerV2Single(DockerManifest),
    DockerV1Single(DockerV1Manifest),
    DockerList(DockerManifestList),
    OciSingle(OciManifest),
    OciIndex(OciIndex),
}

impl Manifest {
    pub fn media_type(&self) -> Option<&str> {
        match self {
            Manifest::DockerV2Single(m) => Some(&m.media_type),
            Manifest::DockerV1Single(_) => Some(MEDIA_TYPE_V1),
            Manifest::DockerList(m) => Some(&m.media_type),
            Manifest::OciSingle(m) => m.media_type.as_deref(),
            Manifest::OciIndex(m) => m.media_type.as_deref(),
        }
    }

    pub fn is_multi_arch(&self) -> bool {
        matches!(self, Manifest::DockerList(_) | Manifest::OciIndex(_))
    }
}

/// Parse raw bytes as a generic JSON object, then dispatch to a concrete variant.
///
/// Detection order (mirrors the wire behavior of real registries, which do not
/// always set `mediaType`):
/// 1. A `manifests` field means multi-arch; `mediaType` picks Docker list vs OCI
///    index, defaulting to Docker list when absent under schema version 2.
/// 2. Otherwise dispatch on `mediaType` when present.
/// 3. Otherwise fall back on `schemaVersion`: 1 → Docker v1, 2 with a `config`
///    field → Docker v2.
/// 4. Anything else is an unknown-type error carrying the observed media type and
///    schema version for diagnostics.
pub fn detect_and_parse(bytes: &[u8], repository: &str, reference: &str) -> Result<Manifest> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| ReplicatorError::ManifestParse {
        repository: repository.to_string(),
        reference: reference.to_string(),
        message: e.to_string(),
    })?;

    let media_type = value.get("mediaType").and_then(Value::as_str);
    let schema_version = value.get("schemaVersion").and_then(Value::as_u64).map(|v| v as u32);
    let has_manifests_field = value.get("manifests").is_some();

    let parse_err = |message: String| ReplicatorError::ManifestParse {
        repository: repository.to_string(),
        reference: reference.to_string(),
        message,
    };

    if has_manifests_field {
        let is_oci_index = media_type == Some(MEDIA_TYPE_INDEX);
        return if is_oci_index {
            let index: OciIndex = serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
            Ok(Manifest::OciIndex(index))
        } else {
            let list: DockerManifestList =
                serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
            Ok(Manifest::DockerList(list))
        };
    }

    match media_type {
        Some(MEDIA_TYPE_MANIFEST_V2) => {
            let m: DockerManifest = serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
            Ok(Manifest::DockerV2Single(m))
        }
        Some(MEDIA_TYPE_MANIFEST) => {
            let m: OciManifest = serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
            Ok(Manifest::OciSingle(m))
        }
        Some(MEDIA_TYPE_V1) | Some(MEDIA_TYPE_V1_SIGNED) => {
            let m: DockerV1Manifest = serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
            Ok(Manifest::DockerV1Single(m))
        }
        None => match schema_version {
            Some(1) => {
                let m: DockerV1Manifest =
                    serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
                Ok(Manifest::DockerV1Single(m))
            }
            Some(2) if value.get("config").is_some() => {
                let m: DockerManifest = serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
                Ok(Manifest::DockerV2Single(m))
            }
            _ => Err(ReplicatorError::UnknownManifestType {
                media_type: media_type.map(str::to_string),
                schema_version,
            }),
        },
        Some(other) => Err(ReplicatorError::UnknownManifestType {
            media_type: Some(other.to_string()),
            schema_version,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docker_single_json() -> Value {
        serde_json::json!({
            "schemaVersion": 2,
            "mediaType": MEDIA_TYPE_MANIFEST_V2,
            "config": {
                "mediaType": "application/vnd.docker.container.image.v1+json",
                "size": 1234,
                "digest": "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
            },
            "layers": [{
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "size": 5678,
                "digest": "sha256:6c3c624b58dbbcd3c0dd82b4c53f04194d1247c6eebdac95cd9ffda00893b3b"
            }]
        })
    }

    #[test]
    fn detects_docker_v2_by_media_type() {
        let bytes = serde_json::to_vec(&docker_single_json()).unwrap();
        let m = detect_and_parse(&bytes, "repo", "tag").unwrap();
        assert!(matches!(m, Manifest::DockerV2Single(_)));
    }

    #[test]
    fn detects_docker_v2_without_media_type() {
        let mut json = docker_single_json();
        json.as_object_mut().unwrap().remove("mediaType");
        let bytes = serde_json::to_vec(&json).unwrap();
        let m = detect_and_parse(&bytes, "repo", "tag").unwrap();
        assert!(matches!(m, Manifest::DockerV2Single(_)));
    }

    #[test]
    fn detects_manifest_list_defaulting_to_docker() {
        let json = serde_json::json!({
            "schemaVersion": 2,
            "manifests": []
        });
        let bytes = serde_json::to_vec(&json).unwrap();
        let m = detect_and_parse(&bytes, "repo", "tag").unwrap();
        assert!(matches!(m, Manifest::DockerList(_)));
    }

    #[test]
    fn detects_oci_index_by_media_type() {
        let json = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": MEDIA_TYPE_INDEX,
            "manifests": []
        });
        let bytes = serde_json::to_vec(&json).unwrap();
        let m = detect_and_parse(&bytes, "repo", "tag").unwrap();
        assert!(matches!(m, Manifest::OciIndex(_)));
    }

    #[test]
    fn detects_docker_v1_by_schema_version() {
        let json = serde_json::json!({ "schemaVersion": 1, "name": "repo", "tag": "latest" });
        let bytes = serde_json::to_vec(&json).unwrap();
        let m = detect_and_parse(&bytes, "repo", "tag").unwrap();
        assert!(matches!(m, Manifest::DockerV1Single(_)));
    }

    #[test]
    fn unknown_media_type_is_an_error() {
        let json = serde_json::json!({ "schemaVersion": 2, "mediaType": "application/x-mystery" });
        let bytes = serde_json::to_vec(&json).unwrap();
        let err = detect_and_parse(&bytes, "repo", "tag").unwrap_err();
        assert!(matches!(err, ReplicatorError::UnknownManifestType { .. }));
    }

    #[test]
    fn malformed_json_is_manifest_parse_error() {
        let err = detect_and_parse(b"not json", "repo", "tag").unwrap_err();
        assert!(matches!(err, ReplicatorError::ManifestParse { .. }));
    }
}
