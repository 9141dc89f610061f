use reportflow_api::ApiContext;
use reportflow_core::constants::DEFAULT_LISTEN_ADDR;
use reportflow_core::utils::logging::{LogFormat, init_tracing};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment directly
    let _ = dotenvy::dotenv();

    init_tracing(LogFormat::from_env());

    info!(version = reportflow_core::VERSION, "Starting Reportflow API");

    let ctx = ApiContext::from_env()?;
    let listen = std::env::var("LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!(addr = %listen, "Listening");

    axum::serve(listener, reportflow_api::router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
