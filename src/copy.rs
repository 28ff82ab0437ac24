//! Copy driver: resolves per-registry auth via the registry capability, then
//! invokes the external byte-level copy capability with sync semantics pinned.

use crate::error::{ReplicatorError, Result};
use crate::planner::SyncTask;
use crate::registry::{CopyCapability, CopyOptions, CopyStats, RegistryCapability};
use std::sync::Arc;

/// Copy one task's image from source to destination, using `copier` for the
/// actual transfer. `skip_existing` is forwarded to the copy capability
/// unmodified; `force_overwrite` and `dry_run` are always pinned regardless of
/// caller configuration, per sync semantics (the destination is authoritative).
pub async fn copy_task(
    task: &SyncTask,
    source: &Arc<dyn RegistryCapability>,
    destination: &Arc<dyn RegistryCapability>,
    copier: &Arc<dyn CopyCapability>,
    skip_existing: bool,
) -> Result<CopyStats> {
    let src_repo = source.get_repository(&task.source_repository).await?;
    let dst_repo = destination.get_repository(&task.destination_repository).await?;

    let src_auth = src_repo.remote_options().await?;
    let dst_auth = dst_repo.remote_options().await?;

    let options = CopyOptions {
        force_overwrite: true,
        dry_run: false,
        skip_existing,
    };

    let stats = copier
        .copy_image(&task.source_ref(), &task.destination_ref(), &src_auth, &dst_auth, &options)
        .await?;

    if !stats.success {
        return Err(ReplicatorError::CopyFailed {
            source: task.source_ref(),
            destination: task.destination_ref(),
            message: "copy capability reported success = false".to_string(),
        });
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FetchedManifest, RemoteOptions, Repository};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct StubRepo(String);

    #[async_trait]
    impl Repository for StubRepo {
        fn name(&self) -> &str {
            &self.0
        }
        async fn remote_options(&self) -> Result<RemoteOptions> {
            Ok(RemoteOptions::default())
        }
    }

    struct StubRegistry;

    #[async_trait]
    impl RegistryCapability for StubRegistry {
        async fn list_tags(&self, _repository: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn get_manifest(&self, _repository: &str, _reference: &str) -> Result<FetchedManifest> {
            unimplemented!()
        }
        async fn get_config_blob(&self, _repository: &str, _digest: &str) -> Result<Vec<u8>> {
            unimplemented!()
        }
        async fn get_repository(&self, name: &str) -> Result<Box<dyn Repository>> {
            Ok(Box::new(StubRepo(name.to_string())))
        }
        fn registry_url(&self) -> &str {
            "stub://"
        }
    }

    struct RecordingCopier {
        calls: AtomicUsize,
        result: CopyStats,
    }

    #[async_trait]
    impl CopyCapability for RecordingCopier {
        async fn copy_image(
            &self,
            _src_ref: &str,
            _dst_ref: &str,
            _src_auth: &RemoteOptions,
            _dst_auth: &RemoteOptions,
            options: &CopyOptions,
        ) -> Result<CopyStats> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(options.force_overwrite);
            assert!(!options.dry_run);
            Ok(self.result)
        }
    }

    fn task() -> SyncTask {
        SyncTask {
            source_registry: "src.example.com".to_string(),
            source_repository: "library/nginx".to_string(),
            source_tag: "1.25".to_string(),
            destination_registry: "dst.example.com".to_string(),
            destination_repository: "library/nginx".to_string(),
            destination_tag: "1.25".to_string(),
            architecture: None,
            sign_verification: None,
            priority: 0,
            estimated_size: None,
        }
    }

    #[tokio::test]
    async fn successful_copy_always_forces_overwrite_and_disables_dry_run() {
        let source: Arc<dyn RegistryCapability> = Arc::new(StubRegistry);
        let destination: Arc<dyn RegistryCapability> = Arc::new(StubRegistry);
        let copier: Arc<dyn CopyCapability> = Arc::new(RecordingCopier {
            calls: AtomicUsize::new(0),
            result: CopyStats { success: true, bytes_transferred: 42, layer_count: 3, pull_ms: 10, push_ms: 20 },
        });

        let stats = copy_task(&task(), &source, &destination, &copier, false).await.unwrap();
        assert_eq!(stats.bytes_transferred, 42);
    }

    #[tokio::test]
    async fn reported_failure_without_error_is_treated_as_failure() {
        let source: Arc<dyn RegistryCapability> = Arc::new(StubRegistry);
        let destination: Arc<dyn RegistryCapability> = Arc::new(StubRegistry);
        let copier: Arc<dyn CopyCapability> = Arc::new(RecordingCopier {
            calls: AtomicUsize::new(0),
            result: CopyStats { success: false, ..CopyStats::default() },
        });

        let result = copy_task(&task(), &source, &destination, &copier, false).await;
        assert!(matches!(result, Err(ReplicatorError::CopyFailed { .. })));
    }
}
