//! Narrated video worker binary.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use narrato_queue::{JobQueue, QueueConfig};
use narrato_worker::{metrics, JobExecutor, ProcessingContext, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("narrato=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting narrato-worker");

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid worker config: {}", e);
            std::process::exit(1);
        }
    };
    info!("Worker config: {:?}", config);

    if let Some(port) = config.metrics_port {
        match metrics::init_metrics(port) {
            Ok(()) => info!("Metrics available on port {}", port),
            Err(e) => warn!("Failed to start metrics exporter: {}", e),
        }
    }

    let queue_config = QueueConfig::from_env();
    let queue = match JobQueue::new(queue_config.clone()) {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ctx = match ProcessingContext::from_env(config.clone(), &queue_config, shutdown_rx) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to create processing context: {}", e);
            std::process::exit(1);
        }
    };

    let queue = queue.with_status_store(Arc::clone(&ctx.status));

    let shutdown_timeout = config.shutdown_timeout;
    let executor = Arc::new(JobExecutor::new(config, queue, ctx, shutdown_tx));

    let mut run_handle = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move { executor.run().await })
    };

    tokio::select! {
        result = &mut run_handle => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Executor error: {}", e);
                    std::process::exit(1);
                }
                Err(e) => {
                    error!("Executor task panicked: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            executor.shutdown();
            if tokio::time::timeout(shutdown_timeout, run_handle).await.is_err() {
                warn!("Executor did not stop within {:?}", shutdown_timeout);
            }
        }
    }

    info!("Worker shutdown complete");
}
