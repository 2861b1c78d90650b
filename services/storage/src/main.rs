use anyhow::{bail, Context, Result};
use futures::future::try_join_all;
use murmur_storage::config::LogFormat;
use murmur_storage::{Config, File, FileService, FileValidator, Uploader};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    init_tracing(&config.service.log_level, config.service.log_format);

    info!(
        service = %config.service.name,
        "Starting Murmur Storage Service"
    );

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: murmur-storage <file>...");
    }

    let uploader = Uploader::connect(&config.object_store)
        .await
        .context("Failed to initialize uploader")?;
    let service = FileService::new(uploader, FileValidator::new(config.validation.clone()));

    let files: Vec<File> = try_join_all(paths.iter().map(File::open))
        .await
        .context("Failed to open input files")?;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            warn!("Cancelling upload batch");
            cancel.cancel();
        }
    });

    let result = service.upload_many_files(files, &cancel).await;
    watcher.abort();

    let urls = match result {
        Ok(urls) => urls,
        Err(e) => {
            error!(error = %e, "Upload failed");
            return Err(e).context("Failed to upload files");
        }
    };

    println!("{}", serde_json::to_string_pretty(&urls)?);

    info!(files = urls.len(), "Storage service finished");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
