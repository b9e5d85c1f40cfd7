use anyhow::Context;

use warden_api::app::{AppServices, build_app};
use warden_auth::{SessionSweeper, WardenConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warden_observability::init();

    let config = WardenConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "configuration loaded");

    let services = AppServices::from_config(&config).context("failed to wire services")?;
    let sweeper = SessionSweeper::spawn(
        services.orchestrator.sessions().clone(),
        config.sweep_interval,
    );

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
