use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backend_lib::{config::Settings, create_router, logging, storage, AppState};
use clap::Parser;
use tokio::net::TcpListener;

/// Task board web server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the configured host and port
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // a missing .env is fine
    let _ = dotenvy::dotenv();

    let settings = match &args.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load settings")?;

    logging::init_tracing(&settings);

    let addr = match args.bind {
        Some(addr) => addr,
        None => settings.bind_addr()?,
    };

    let storage = storage::from_settings(&settings.storage)?;
    let seed = settings.storage.seed;
    let state = Arc::new(AppState::new(storage, settings)?);
    if seed {
        state.tasks.seed_sample_tasks().await?;
    }

    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
