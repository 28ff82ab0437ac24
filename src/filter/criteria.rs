//! Primary selection criteria: exactly one of these is configured per spec entry
//! (enforced by the config schema's own validation, not here).

use crate::error::{ReplicatorError, Result};
use crate::filter::tag::TagMetadata;
use regex::Regex;
use semver::{Version, VersionReq};
use std::collections::HashSet;

/// One selection criterion. Each variant's `apply` returns a subset of the input
/// (never adds tags not present in the input, satisfying tag-filter totality).
#[derive(Debug, Clone)]
pub enum Criterion {
    Explicit(HashSet<String>),
    Regex(Regex),
    SemverConstraint(VersionReq),
    AllTags,
    LatestN(usize),
}

/// Common semver prefixes stripped before parsing, in the order authors tend to
/// use them.
const SEMVER_PREFIXES: &[&str] = &["version-", "release-", "ver-", "v", "V"];

fn strip_semver_prefix(tag: &str) -> &str {
    for prefix in SEMVER_PREFIXES {
        if let Some(stripped) = tag.strip_prefix(prefix) {
            return stripped;
        }
    }
    tag
}

impl Criterion {
    pub fn explicit(tags: impl IntoIterator<Item = String>) -> Self {
        Criterion::Explicit(tags.into_iter().collect())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Criterion::Regex(Regex::new(pattern)?))
    }

    pub fn semver_constraint(constraint: &str) -> Result<Self> {
        let req = VersionReq::parse(constraint).map_err(|e| {
            ReplicatorError::ConfigInvalid(format!("invalid semver constraint {:?}: {}", constraint, e))
        })?;
        Ok(Criterion::SemverConstraint(req))
    }

    pub fn apply(&self, tags: &[TagMetadata]) -> Vec<TagMetadata> {
        match self {
            Criterion::Explicit(set) => tags.iter().filter(|t| set.contains(&t.name)).cloned().collect(),
            Criterion::Regex(re) => tags.iter().filter(|t| re.is_match(&t.name)).cloned().collect(),
            Criterion::SemverConstraint(req) => {
                let mut matched: Vec<(Version, TagMetadata)> = tags
                    .iter()
                    .filter_map(|t| {
                        let stripped = strip_semver_prefix(&t.name);
                        let version = Version::parse(stripped).ok()?;
                        req.matches(&version).then(|| (version, t.clone()))
                    })
                    .collect();
                matched.sort_by(|a, b| b.0.cmp(&a.0));
                matched.into_iter().map(|(_, t)| t).collect()
            }
            Criterion::AllTags => tags.to_vec(),
            Criterion::LatestN(n) => {
                let mut sorted: Vec<TagMetadata> = tags.to_vec();
                if sorted.iter().any(|t| t.created_at.is_some()) {
                    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                }
                sorted.into_iter().take(*n).collect()
            }
        }
    }
}
