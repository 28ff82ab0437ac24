//! Content digests in `algorithm:hex` form.
//!
//! Descriptors (`spec.md` §3 "Descriptor") carry a digest string that must parse as
//! `algorithm:hex`. This module owns that parsing/validation and the one digest
//! algorithm the crate actually computes against (sha256, for test fixtures and for
//! identifying blobs the crate builds itself rather than receives from a registry).

use crate::error::{ReplicatorError, Result};
use sha2::Digest as _;
use std::fmt;

/// A parsed `algorithm:hex` content digest.
///
/// `Eq`/`Hash` compare on the normalized (lowercase hex) form, matching how registries
/// treat digests as case-insensitive over the hex part but case-sensitive over the
/// algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: String,
    hex: String,
}

impl Digest {
    /// Parse a digest string of the form `algorithm:hex`.
    ///
    /// Only validates shape (non-empty algorithm, non-empty lowercase-hex payload);
    /// it does not restrict the algorithm name to a fixed set, since the descriptor
    /// model must round-trip digests using algorithms this crate doesn't compute.
    pub fn parse(raw: &str) -> Result<Self> {
        let (algorithm, hex) = raw.split_once(':').ok_or_else(|| ReplicatorError::InvalidDigest {
            digest: raw.to_string(),
            message: "missing ':' separator".to_string(),
        })?;

        if algorithm.is_empty() {
            return Err(ReplicatorError::InvalidDigest {
                digest: raw.to_string(),
                message: "empty algorithm".to_string(),
            });
        }
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ReplicatorError::InvalidDigest {
                digest: raw.to_string(),
                message: "payload is not lowercase hex".to_string(),
            });
        }
        if algorithm == "sha256" && hex.len() != 64 {
            return Err(ReplicatorError::InvalidDigest {
                digest: raw.to_string(),
                message: format!("sha256 digest must be 64 hex chars, got {}", hex.len()),
            });
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            hex: hex.to_lowercase(),
        })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Compute the sha256 digest of `data` and wrap it as a [`Digest`].
    pub fn from_sha256_bytes(data: &[u8]) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);
        Self {
            algorithm: "sha256".to_string(),
            hex: format!("{:x}", hasher.finalize()),
        }
    }

    /// Truncate to a short, human-readable form for log lines: `sha256:abcdef012345`.
    pub fn short(&self) -> String {
        let shown = self.hex.len().min(12);
        format!("{}:{}", self.algorithm, &self.hex[..shown])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl std::str::FromStr for Digest {
    type Err = ReplicatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl serde::Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Digest::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Standard sha256 digest of the empty byte string, used as the config digest of
/// images with no configurable runtime settings and as a test fixture constant.
pub const EMPTY_SHA256_HEX: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sha256_digest() {
        let d = Digest::parse(
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
        )
        .unwrap();
        assert_eq!(d.algorithm(), "sha256");
        assert_eq!(d.hex().len(), 64);
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(Digest::parse("not-a-digest").is_err());
    }

    #[test]
    fn rejects_non_hex_payload() {
        assert!(Digest::parse("sha256:not-hex!!").is_err());
    }

    #[test]
    fn rejects_wrong_length_sha256() {
        assert!(Digest::parse("sha256:abcd").is_err());
    }

    #[test]
    fn normalizes_case_on_equality() {
        let lower = Digest::parse(
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
        )
        .unwrap();
        let upper = Digest::parse(
            "sha256:B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9",
        )
        .unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn compute_sha256_matches_known_vector() {
        let d = Digest::from_sha256_bytes(b"hello world");
        assert_eq!(
            d.to_string(),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn compute_is_deterministic() {
        let a = Digest::from_sha256_bytes(b"same bytes");
        let b = Digest::from_sha256_bytes(b"same bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_bytes_match_known_empty_digest() {
        let d = Digest::from_sha256_bytes(b"");
        assert_eq!(d.hex(), EMPTY_SHA256_HEX);
    }

    #[test]
    fn short_form_truncates() {
        let d = Digest::from_sha256_bytes(b"hello world");
        assert_eq!(d.short(), "sha256:b94d27b99345");
    }

    #[test]
    fn accepts_non_sha256_algorithms_by_shape_only() {
        assert!(Digest::parse("sha512:abcd1234").is_ok());
    }
}
