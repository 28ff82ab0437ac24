//! `registry-replicator` — declarative, multi-registry container image replication.
//!
//! Loads a YAML specification, plans an ordered set of copy tasks across the
//! configured source/destination registries, and drives them through the
//! adaptive batch executor.

use clap::Parser;
use registry_replicator::cli::{Args, Commands};
use registry_replicator::config::ReplicationSpec;
use registry_replicator::error::{ReplicatorError, Result};
use registry_replicator::executor::{Executor, ExecutorConfig};
use registry_replicator::logging::Logger;
use registry_replicator::planner::{expand_entry, order_tasks, SyncTask};
use registry_replicator::registry::auth::Credentials;
use registry_replicator::registry::http::HttpRegistry;
use registry_replicator::registry::pool::ClientPool;
use registry_replicator::registry::{CopyCapability, CopyOptions, CopyStats, RegistryCapability, RemoteOptions};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The external byte-level image copy capability isn't shipped by this crate
/// (see `registry::CopyCapability`); this stand-in surfaces that clearly instead
/// of pretending to transfer bytes.
struct UnimplementedCopier;

#[async_trait::async_trait]
impl CopyCapability for UnimplementedCopier {
    async fn copy_image(
        &self,
        src_ref: &str,
        dst_ref: &str,
        _src_auth: &RemoteOptions,
        _dst_auth: &RemoteOptions,
        _options: &CopyOptions,
    ) -> Result<CopyStats> {
        Err(ReplicatorError::CopyFailed {
            source: src_ref.to_string(),
            destination: dst_ref.to_string(),
            message: "no copy capability is wired into this binary; link one that implements \
                      registry_replicator::registry::CopyCapability"
                .to_string(),
        })
    }
}

fn registry_credentials(cfg: &registry_replicator::config::RegistryConfig) -> Credentials {
    let auth = cfg.auth.clone().unwrap_or_default();
    Credentials {
        username: auth.username,
        password: auth.password,
        bearer_token: auth.bearer_token,
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(err) = args.validate() {
        eprintln!("error: {err}");
        std::process::exit(2);
    }

    let result = match &args.command {
        Some(Commands::Validate(validate_args)) => run_validate(validate_args),
        Some(Commands::Run(run_args)) => run(run_args).await,
        None => unreachable!("validated above"),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_validate(args: &registry_replicator::cli::ValidateArgs) -> Result<()> {
    let spec = ReplicationSpec::load_from_path(&args.spec)?;
    println!("specification valid: {} image(s) across {} -> {}", spec.images.len(), spec.source.registry, spec.destination.registry);
    Ok(())
}

async fn run(args: &registry_replicator::cli::RunArgs) -> Result<()> {
    let logger = if args.quiet { Logger::new_quiet() } else { Logger::new(args.verbose) };
    let spec = ReplicationSpec::load_from_path(&args.spec)?;

    logger.info(&format!(
        "loaded specification: {} -> {} ({} image entries)",
        spec.source.registry,
        spec.destination.registry,
        spec.images.len()
    ));

    let source_factory_options = registry_credentials(&spec.source);
    let source_insecure = spec.source.insecure;
    let source_pool = ClientPool::new(Arc::new(move |url: &str| {
        let client: Arc<dyn RegistryCapability> =
            Arc::new(HttpRegistry::new(url, source_factory_options.clone(), source_insecure)?);
        Ok(client)
    }));

    let destination_factory_options = registry_credentials(&spec.destination);
    let destination_insecure = spec.destination.insecure;
    let destination_pool = ClientPool::new(Arc::new(move |url: &str| {
        let client: Arc<dyn RegistryCapability> =
            Arc::new(HttpRegistry::new(url, destination_factory_options.clone(), destination_insecure)?);
        Ok(client)
    }));

    let source_registry = source_pool.get(&spec.source.registry).await?;
    let destination_registry = destination_pool.get(&spec.destination.registry).await?;

    let mut tasks: Vec<SyncTask> = Vec::new();
    for entry in &spec.images {
        let pipeline = registry_replicator::filter::TagFilterPipeline::new(entry.criterion()?);
        let architecture_filter = entry
            .architectures
            .as_ref()
            .map(|_| registry_replicator::filter::ArchitectureFilter::default());

        let expanded = expand_entry(
            &spec.source.registry,
            &source_registry,
            &spec.destination.registry,
            entry,
            &pipeline,
            architecture_filter.as_ref(),
            0,
            true,
        )
        .await?;
        tasks.extend(expanded);
    }

    order_tasks(&mut tasks);
    logger.info(&format!("planned {} task(s)", tasks.len()));

    if args.dry_run {
        for task in &tasks {
            println!("{} -> {}", task.source_ref(), task.destination_ref());
        }
        return Ok(());
    }

    let executor_config = ExecutorConfig {
        parallel: spec.parallel,
        batch_size: spec.batch_size,
        enable_adaptive_batching: spec.enable_adaptive_batching,
        min_batch_size: spec.min_batch_size,
        max_batch_size: spec.max_batch_size,
        retry_policy: registry_replicator::executor::retry::RetryPolicy {
            timeout: std::time::Duration::from_secs(spec.timeout),
            attempts: spec.retry_attempts,
            backoff_base: std::time::Duration::from_secs(spec.retry_backoff),
        },
        continue_on_error: spec.continue_on_error,
        max_intra_batch: None,
    };

    let mut executor = Executor::new(executor_config).with_logger(logger.clone());
    let copier: Arc<dyn CopyCapability> = Arc::new(UnimplementedCopier);
    let skip_existing = spec.skip_existing;

    let source_for_tasks = source_registry.clone();
    let destination_for_tasks = destination_registry.clone();
    let copier_for_tasks = copier.clone();

    let results = executor
        .execute(&tasks, CancellationToken::new(), move |task| {
            let source = source_for_tasks.clone();
            let destination = destination_for_tasks.clone();
            let copier = copier_for_tasks.clone();
            async move {
                let stats = registry_replicator::copy::copy_task(&task, &source, &destination, &copier, skip_existing).await?;
                Ok(stats.bytes_transferred)
            }
        })
        .await?;

    let succeeded = results.iter().filter(|r| r.success).count();
    logger.info(&format!("completed {succeeded}/{} task(s)", results.len()));

    Ok(())
}
