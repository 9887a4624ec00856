use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forecast_gateway::config::Args;
use forecast_gateway::rate_limit::RateLimiter;
use forecast_gateway::routes::router;
use forecast_gateway::state::AppState;
use forecast_gateway::sweeper::spawn_idle_sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();
    args.validate()?;

    let registry = Arc::new(args.registry());
    tracing::info!(keys = registry.len(), "Key registry loaded");

    let limiter = Arc::new(RateLimiter::new(registry));
    let sweeper = spawn_idle_sweeper(limiter.clone(), args.sweep_every(), args.idle_after());

    let app = router(AppState::new(limiter));

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(port = args.port, "Forecast gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    tracing::info!("Forecast gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
