#![doc = include_str!("../README.md")]

mod proto;
mod server;

use clap::Parser;
use goflake::{Generator, MonotonicClock};
use server::config::{CliArgs, ServerConfig, ServerType};
use server::state::AppState;
use server::telemetry::init_telemetry;
use server::{grpc, rest};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry(&config)?;

    let generator = Arc::new(Generator::new(config.generator, MonotonicClock::new())?);
    let state = AppState::new(Arc::clone(&generator));
    log_startup_info(&config);

    match config.server_type {
        ServerType::Grpc => grpc::serve(&config, state, shutdown_signal()).await?,
        ServerType::Rest => {
            let listener = TcpListener::bind(config.server_addr).await?;
            axum::serve(listener, rest::router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    // In-flight requests have drained; stop the ticker last.
    generator.shutdown();

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting {:?} ID service on {} with full config: {:#?}",
            config.server_type,
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting {:?} ID service on {} as datacenter {} machine {} ({})",
            config.server_type,
            config.server_addr,
            config.generator.datacenter_id,
            config.generator.machine_id,
            config.generator.layout
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
