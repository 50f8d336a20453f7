use std::sync::Arc;

use carbon_api::{
    api,
    config::ServerConfig,
    encoding::CategoryEncoder,
    model::ArtifactLoader,
    service::PredictionService,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServerConfig::from_env()?;
    tracing::info!("config: {:?}", cfg);

    let loader = ArtifactLoader::new(cfg.model_path.clone());
    let svc = PredictionService::start(Box::new(loader), CategoryEncoder::default())
        .with_prediction_logging(cfg.log_predictions);

    let health = svc.health();
    if health.model_loaded {
        // Warmup to surface a broken artifact before the first request
        match svc.warmup() {
            Ok(y) => tracing::info!("warmup forward ok ({:.3})", y),
            Err(e) => tracing::warn!("warmup forward failed: {:#}", e),
        }
    } else {
        tracing::warn!(
            "serving without a model ({}); /predict will retry loading from {}",
            health.last_error.as_deref().unwrap_or("unknown error"),
            health.source
        );
    }

    let app = api::router(Arc::new(svc));

    let addr = cfg.socket_addr();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
