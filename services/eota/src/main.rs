use anyhow::{Context, Result};
use eota::app::{build_router, build_state};
use eota::config::EotaConfig;
use eota::observability::{init_observability, serve_metrics};

#[tokio::main]
async fn main() -> Result<()> {
    let config = EotaConfig::from_env_or_yaml()?;
    let metrics_handle = init_observability();

    let metrics_bind = config.metrics_bind;
    tokio::spawn(async move {
        if let Err(err) = serve_metrics(metrics_handle, metrics_bind).await {
            tracing::error!(error = %err, "metrics server failed");
        }
    });

    let state = build_state(&config)?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, mdq_url = %config.mdq_url, "eota listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "serve eota")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
