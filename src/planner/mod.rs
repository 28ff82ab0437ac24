//! Planner: expand specification entries into ordered `SyncTask`s.
//!
//! Expansion obtains the source tag universe, runs it through the tag filter
//! pipeline, then the architecture filter (if any), then applies the per-entry
//! limit. Each surviving tag becomes a `SyncTask`; the resulting list is ordered by
//! priority, then source registry, then estimated size.

use crate::config::{ImageSync, SignVerification};
use crate::error::Result;
use crate::filter::{ArchitectureFilter, TagFilterPipeline, TagMetadata};
use crate::registry::RegistryCapability;
use crate::size::estimate_size;
use std::cmp::Ordering;
use std::sync::Arc;

/// A concrete (source tag) → (destination tag) copy instruction.
#[derive(Debug, Clone)]
pub struct SyncTask {
    pub source_registry: String,
    pub source_repository: String,
    pub source_tag: String,
    pub destination_registry: String,
    pub destination_repository: String,
    pub destination_tag: String,
    pub architecture: Option<String>,
    pub sign_verification: Option<SignVerification>,
    pub priority: i32,
    /// Filled in by the planner from the size estimator; `None` when estimation
    /// failed or wasn't attempted, and sorts last.
    pub estimated_size: Option<u64>,
}

impl SyncTask {
    pub fn source_ref(&self) -> String {
        format!("{}/{}:{}", self.source_registry, self.source_repository, self.source_tag)
    }

    pub fn destination_ref(&self) -> String {
        format!(
            "{}/{}:{}",
            self.destination_registry, self.destination_repository, self.destination_tag
        )
    }
}

/// Destination rewrite rule derived from an `ImageSync` entry.
#[derive(Debug, Clone, Default)]
pub struct DestinationRewrite {
    pub repository: Option<String>,
    pub prefix: String,
    pub suffix: String,
}

impl DestinationRewrite {
    pub fn destination_repository(&self, source_repository: &str) -> String {
        self.repository.clone().unwrap_or_else(|| source_repository.to_string())
    }

    pub fn destination_tag(&self, source_tag: &str) -> String {
        format!("{}{}{}", self.prefix, source_tag, self.suffix)
    }
}

/// Expand one image-sync entry into ordered tasks. `estimate_sizes` gates whether
/// the planner calls the size estimator (it always uses the destination
/// registry's capability only to resolve rewrites, not to estimate against).
pub async fn expand_entry(
    source_registry_url: &str,
    source_registry: &Arc<dyn RegistryCapability>,
    destination_registry_url: &str,
    entry: &ImageSync,
    pipeline: &TagFilterPipeline,
    architecture_filter: Option<&ArchitectureFilter>,
    priority: i32,
    estimate_sizes: bool,
) -> Result<Vec<SyncTask>> {
    let tag_names = source_registry.list_tags(&entry.repository).await?;
    let tags: Vec<TagMetadata> = tag_names.into_iter().map(TagMetadata::named).collect();

    let mut selected = pipeline.apply(&tags);

    if let Some(arch_filter) = architecture_filter {
        if let Some(desired) = &entry.architectures {
            let desired_set = desired.iter().cloned().collect();
            selected = arch_filter
                .filter(source_registry, &entry.repository, selected, &desired_set)
                .await;
        }
    }

    if let Some(limit) = entry.limit {
        selected.truncate(limit);
    }

    let rewrite = DestinationRewrite {
        repository: entry.destination_repository.clone(),
        prefix: entry.destination_prefix.clone().unwrap_or_default(),
        suffix: entry.destination_suffix.clone().unwrap_or_default(),
    };

    let mut tasks = Vec::with_capacity(selected.len());
    for tag in selected {
        let estimated_size = if estimate_sizes {
            estimate_size(source_registry, &entry.repository, &tag.name).await.ok()
        } else {
            None
        };

        tasks.push(SyncTask {
            source_registry: source_registry_url.to_string(),
            source_repository: entry.repository.clone(),
            source_tag: tag.name.clone(),
            destination_registry: destination_registry_url.to_string(),
            destination_repository: rewrite.destination_repository(&entry.repository),
            destination_tag: rewrite.destination_tag(&tag.name),
            architecture: entry.architectures.as_ref().and_then(|a| a.first().cloned()),
            sign_verification: entry.sign_verification.clone(),
            priority,
            estimated_size,
        });
    }

    Ok(tasks)
}

/// Stable-sort tasks: priority descending, then source registry ascending, then
/// estimated size ascending with unknown sizes sorted last. Never reorders across
/// a priority boundary.
pub fn order_tasks(tasks: &mut [SyncTask]) {
    tasks.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.source_registry.cmp(&b.source_registry))
            .then_with(|| compare_estimated_size(a.estimated_size, b.estimated_size))
    });
}

fn compare_estimated_size(a: Option<u64>, b: Option<u64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The result of executing one `SyncTask`.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub success: bool,
    pub error: Option<String>,
    pub bytes_copied: u64,
    pub duration_ms: u64,
    pub retries: u32,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

impl SyncResult {
    pub fn cancelled_before_first_attempt(cause: String) -> Self {
        Self {
            success: false,
            error: Some(cause),
            bytes_copied: 0,
            duration_ms: 0,
            retries: 0,
            skipped: false,
            skip_reason: None,
        }
    }
}
