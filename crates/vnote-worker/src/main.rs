//! Video note worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vnote_worker::{FfmpegProcessor, JobApiClient, JobExecutor, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON when LOG_FORMAT=json
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vnote=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("Starting vnote-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Err(e) = vnote_media::check_ffmpeg() {
        error!("{}", e);
        std::process::exit(1);
    }

    let client = match JobApiClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create API client: {}", e);
            std::process::exit(1);
        }
    };

    let processor = FfmpegProcessor::new(&config);
    let executor = Arc::new(JobExecutor::new(config, client, processor));

    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_executor.shutdown();
        }
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
