use anyhow::Context;
use clap::Parser;
use huddle_server::{ServerConfig, build_coordinator, router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    config.validate().context("invalid configuration")?;
    info!(
        bind = %config.bind,
        room_code_len = config.room_code_len,
        room_capacity = config.room_capacity,
        "Starting huddle server"
    );

    let coordinator = build_coordinator(&config);
    let app = router(coordinator);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("Signaling server listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler; run until killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
