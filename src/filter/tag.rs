//! Tag metadata: the record the filter pipeline and size estimator carry through
//! selection and ordering.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Tag name, digest, creation time, size, platform string, annotations. Only the
/// tag name is required; creation time drives "latest-N" ordering when present.
#[derive(Debug, Clone, PartialEq)]
pub struct TagMetadata {
    pub name: String,
    pub digest: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub size: Option<u64>,
    pub platform: Option<String>,
    pub annotations: Option<HashMap<String, String>>,
}

impl TagMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            digest: None,
            created_at: None,
            size: None,
            platform: None,
            annotations: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}
