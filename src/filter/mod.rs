//! Tag filter pipeline: compose a primary selection criterion with secondary
//! operators and, optionally, architecture-aware filtering via manifest
//! inspection.

pub mod architecture;
pub mod criteria;
pub mod secondary;
pub mod tag;

pub use architecture::ArchitectureFilter;
pub use criteria::Criterion;
pub use tag::TagMetadata;

use std::collections::HashSet;

/// Secondary operators applied, in order, after the primary criterion.
#[derive(Debug, Clone, Default)]
pub struct SecondaryOps {
    pub exclude: Option<HashSet<String>>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub glob: Option<String>,
    pub dedup: bool,
}

impl SecondaryOps {
    pub fn apply(&self, mut tags: Vec<TagMetadata>) -> Vec<TagMetadata> {
        if let Some(excluded) = &self.exclude {
            tags = secondary::exclude(tags, excluded);
        }
        if let Some(prefix) = &self.prefix {
            tags = secondary::prefix(tags, prefix);
        }
        if let Some(suffix) = &self.suffix {
            tags = secondary::suffix(tags, suffix);
        }
        if let Some(pattern) = &self.glob {
            tags = secondary::glob(tags, pattern);
        }
        if self.dedup {
            tags = secondary::dedup(tags);
        }
        tags
    }
}

/// A complete tag selection: one primary criterion plus secondary operators, an
/// optional per-entry limit, and the desired architecture set.
pub struct TagFilterPipeline {
    pub criterion: Criterion,
    pub secondary: SecondaryOps,
    pub limit: Option<usize>,
}

impl TagFilterPipeline {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            secondary: SecondaryOps::default(),
            limit: None,
        }
    }

    /// Apply the primary criterion, then secondary operators, then the per-entry
    /// limit. Architecture filtering happens separately (it needs registry
    /// access) — see [`ArchitectureFilter`].
    pub fn apply(&self, tags: &[TagMetadata]) -> Vec<TagMetadata> {
        let mut result = self.criterion.apply(tags);
        result = self.secondary.apply(result);
        if let Some(limit) = self.limit {
            result.truncate(limit);
        }
        result
    }
}
