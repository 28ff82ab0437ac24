//! Architecture-aware filtering: for each tag, inspect its manifest (and, for
//! single-arch images, its config blob) to decide whether any of its platforms
//! match the desired architecture set.

use crate::error::Result;
use crate::filter::tag::TagMetadata;
use crate::manifest::{detect_and_parse, Manifest};
use crate::registry::RegistryCapability;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ConfigArchitecture {
    architecture: Option<String>,
}

/// Architecture filter. `strict` controls the conservative fallback on config-blob
/// fetch/parse failure: the spec's own default is permissive (include the tag);
/// `strict = true` opts into excluding it instead, per the spec's suggested
/// configurability for downstream tooling that cannot tolerate extra copies.
pub struct ArchitectureFilter {
    pub strict: bool,
}

impl Default for ArchitectureFilter {
    fn default() -> Self {
        Self { strict: false }
    }
}

impl ArchitectureFilter {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Filter `tags` in `repository` down to those with at least one platform
    /// variant in `desired`. An empty `desired` set means no filtering.
    pub async fn filter(
        &self,
        registry: &Arc<dyn RegistryCapability>,
        repository: &str,
        tags: Vec<TagMetadata>,
        desired: &HashSet<String>,
    ) -> Vec<TagMetadata> {
        if desired.is_empty() {
            return tags;
        }

        let mut kept = Vec::with_capacity(tags.len());
        for tag in tags {
            if self.matches(registry, repository, &tag.name, desired).await {
                kept.push(tag);
            }
        }
        kept
    }

    async fn matches(
        &self,
        registry: &Arc<dyn RegistryCapability>,
        repository: &str,
        reference: &str,
        desired: &HashSet<String>,
    ) -> bool {
        let fetched = match registry.get_manifest(repository, reference).await {
            Ok(f) => f,
            // Fetch error: skip this tag.
            Err(_) => return false,
        };

        let parsed = match detect_and_parse(&fetched.bytes, repository, reference) {
            Ok(m) => m,
            Err(_) => return false,
        };

        match parsed {
            Manifest::OciIndex(index) => index
                .platforms()
                .iter()
                .any(|p| desired.contains(&p.architecture)),
            Manifest::DockerList(list) => list
                .platforms()
                .iter()
                .any(|p| desired.contains(&p.architecture)),
            Manifest::DockerV2Single(single) => {
                if let Some(platform) = &single.config.platform {
                    return desired.contains(&platform.architecture);
                }
                self.architecture_from_config_blob(registry, repository, &single.config.digest.to_string(), desired)
                    .await
            }
            Manifest::OciSingle(single) => {
                if let Some(platform) = &single.config.platform {
                    return desired.contains(&platform.architecture);
                }
                self.architecture_from_config_blob(registry, repository, &single.config.digest.to_string(), desired)
                    .await
            }
            // Docker v1 and anything format detection didn't recognize excludes the tag.
            Manifest::DockerV1Single(_) => false,
        }
    }

    async fn architecture_from_config_blob(
        &self,
        registry: &Arc<dyn RegistryCapability>,
        repository: &str,
        digest: &str,
        desired: &HashSet<String>,
    ) -> bool {
        let result = self.fetch_config_architecture(registry, repository, digest).await;
        match result {
            Ok(Some(arch)) => desired.contains(&arch),
            // Conservative fallback: blob fetch or parse failure includes the tag
            // unless strict mode is on.
            Ok(None) | Err(_) => !self.strict,
        }
    }

    async fn fetch_config_architecture(
        &self,
        registry: &Arc<dyn RegistryCapability>,
        repository: &str,
        digest: &str,
    ) -> Result<Option<String>> {
        let bytes = registry.get_config_blob(repository, digest).await?;
        let config: ConfigArchitecture = serde_json::from_slice(&bytes)?;
        Ok(config.architecture)
    }
}
