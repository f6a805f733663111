//! Road issue sync service.
//!
//! ```bash
//! # HTTP API, plus a background push/pull every SYNC_INTERVAL_SECS when set
//! sync serve
//!
//! # One drained cycle, printed as JSON
//! sync push
//! sync pull
//! sync drain
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sea_orm::Database;
use tracing::info;

use roadwatch_core::tracing::init_tracing;
use roadwatch_sync::config::{CloudBackend, SyncConfig};
use roadwatch_sync::infra::cloud::{Cloud, FirestoreCloudStore, MemoryCloudStore};
use roadwatch_sync::router::build_router;
use roadwatch_sync::state::AppState;
use roadwatch_sync::usecase::driver::run_scheduler;

#[derive(Parser)]
#[command(about = "Replicate road issues between the local database and the cloud store")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
    /// Run the HTTP API (default)
    #[default]
    Serve,
    /// Drain the outbox to the cloud store once
    Push,
    /// Apply remote changes once
    Pull,
    /// Push then pull once
    Drain,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = SyncConfig::from_env();
    let command = args.command.unwrap_or_default();
    match command {
        Command::Push => config.cloud_backend.ensure_durable("push")?,
        Command::Drain => config.cloud_backend.ensure_durable("drain")?,
        Command::Serve | Command::Pull => {}
    }

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let cloud = match config.cloud_backend {
        CloudBackend::Memory => Cloud::Memory(MemoryCloudStore::new()),
        CloudBackend::Firestore => {
            let firestore = config
                .firestore
                .as_ref()
                .context("firestore backend selected without firestore settings")?;
            Cloud::Firestore(FirestoreCloudStore::new(firestore, config.cloud_timeout)?)
        }
    };
    info!(backend = cloud.backend(), "cloud store configured");

    let state = AppState::new(db, cloud, config.retry);

    match command {
        Command::Serve => serve(state, &config).await,
        Command::Push => print(&state.driver().drain_push().await?),
        Command::Pull => print(&state.driver().drain_pull().await?),
        Command::Drain => print(&state.driver().cycle().await?),
    }
}

async fn serve(state: AppState, config: &SyncConfig) -> Result<()> {
    if let Some(interval) = config.sync_interval {
        let scheduled = state.clone();
        tokio::spawn(async move {
            run_scheduler(interval, || {
                let driver = scheduled.driver();
                async move { driver.cycle().await }
            })
            .await;
        });
    }

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.sync_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("sync service listening on {addr}");
    axum::serve(listener, router).await.context("server error")
}

fn print(report: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
