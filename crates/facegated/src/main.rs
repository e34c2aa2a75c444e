use anyhow::{Context, Result};
use facegate_core::{OnnxFaceEncoder, TargetStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod error;
mod http;
mod service;
mod state;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = config::Config::from_env();
    tracing::info!(
        listen = %config.listen_addr(),
        store = %config.store_path.display(),
        models = %config.model_dir.display(),
        tolerance = config.tolerance,
        "facegated starting"
    );

    let encoder = OnnxFaceEncoder::load(&config.model_dir).context("failed to load face models")?;
    let engine = engine::spawn_engine(encoder).context("failed to start engine")?;

    let target = Arc::new(state::TargetState::load(TargetStore::new(&config.store_path)));
    let service = service::FaceService::new(engine, target, config.tolerance);
    let app = http::router(service, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    tracing::info!(addr = %config.listen_addr(), "facegated ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("facegated shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
