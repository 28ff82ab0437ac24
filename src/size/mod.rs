//! Size estimator: from a manifest, compute the total transfer size used to drive
//! task ordering and batch sizing. Never a byte-exact prediction — only good
//! enough to sort tasks.

use crate::error::{ReplicatorError, Result};
use crate::manifest::{detect_and_parse, normalize, Manifest};
use crate::registry::RegistryCapability;
use std::collections::HashMap;
use std::sync::Arc;

/// A concrete (source tag) task the estimator can size.
#[derive(Debug, Clone)]
pub struct SizableTask {
    pub repository: String,
    pub reference: String,
}

/// Estimate total transfer size for one repository/reference.
///
/// - OCI single-arch or Docker v2: `config.size + sum(layer.size)`.
/// - Multi-arch (either format): sum of platform-manifest descriptor sizes. This
///   estimates the budget to replicate *every* platform; callers wanting a single
///   platform should filter first. Intentionally an overestimate in the
///   single-platform case — acceptable because the result is used only for
///   ordering, never billed or reported to the user as an exact figure.
/// - Docker v1: an error; v1 carries no layer sizes.
pub async fn estimate_size(
    registry: &Arc<dyn RegistryCapability>,
    repository: &str,
    reference: &str,
) -> Result<u64> {
    let fetched = registry.get_manifest(repository, reference).await.map_err(|e| {
        ReplicatorError::SizeEstimate {
            repository: repository.to_string(),
            reference: reference.to_string(),
            message: e.to_string(),
        }
    })?;

    let parsed = detect_and_parse(&fetched.bytes, repository, reference)?;
    estimate_from_manifest(&parsed, repository, reference)
}

fn estimate_from_manifest(manifest: &Manifest, repository: &str, reference: &str) -> Result<u64> {
    if matches!(manifest, Manifest::DockerV1Single(_)) {
        return Err(ReplicatorError::SizeEstimate {
            repository: repository.to_string(),
            reference: reference.to_string(),
            message: "Docker Schema 1 manifests carry no size information".to_string(),
        });
    }

    let standard = normalize(manifest);
    if standard.is_multi_arch() {
        Ok(standard.platform_manifests.iter().map(|d| d.size).sum())
    } else {
        let config_size = standard.config.as_ref().map(|c| c.size).unwrap_or(0);
        let layers_size: u64 = standard.layers.iter().map(|l| l.size).sum();
        Ok(config_size + layers_size)
    }
}

/// Sum per-task estimates, silently discarding tasks whose estimation fails.
pub async fn estimate_batch_size(
    registry: &Arc<dyn RegistryCapability>,
    tasks: &[SizableTask],
) -> u64 {
    let mut total = 0u64;
    for task in tasks {
        if let Ok(size) = estimate_size(registry, &task.repository, &task.reference).await {
            total += size;
        }
    }
    total
}

/// A sparse index→size map, omitting tasks whose estimation failed.
pub async fn estimate_batch_sizes(
    registry: &Arc<dyn RegistryCapability>,
    tasks: &[SizableTask],
) -> HashMap<usize, u64> {
    let mut sizes = HashMap::new();
    for (i, task) in tasks.iter().enumerate() {
        if let Ok(size) = estimate_size(registry, &task.repository, &task.reference).await {
            sizes.insert(i, size);
        }
    }
    sizes
}
