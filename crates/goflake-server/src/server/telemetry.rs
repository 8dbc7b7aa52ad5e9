//! # Logging
//!
//! Events are written to stdout through `tracing_subscriber::fmt`:
//!
//! - `development`: multi-line, human-readable output with thread ids, source
//!   locations and RFC 3339 local timestamps.
//! - `production`: one JSON object per line, for log shippers.
//!
//! The filter comes from `RUST_LOG` when it is set, and from `LOG_LEVEL`
//! otherwise.
//!
//! ## Example usage
//!
//! ```bash
//! APP_ENV=production LOG_LEVEL=goflake=debug,info cargo run
//! ```

use crate::server::config::{AppEnv, ServerConfig};
use anyhow::Context;
use tracing_subscriber::{
    EnvFilter, fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt,
};

pub fn init_telemetry(config: &ServerConfig) -> anyhow::Result<()> {
    let filter = build_filter(&config.log_level)?;

    let pretty = (config.app_env == AppEnv::Development).then(|| {
        tracing_subscriber::fmt::layer()
            .with_thread_ids(true)
            .with_line_number(true)
            .with_target(false)
            .with_timer(ChronoLocal::rfc_3339())
            .with_file(true)
            .pretty()
    });

    let json = (config.app_env == AppEnv::Production).then(|| {
        tracing_subscriber::fmt::layer()
            .with_thread_ids(true)
            .with_timer(ChronoLocal::rfc_3339())
            .json()
            .flatten_event(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
        .context("failed to install the global tracing subscriber")?;

    Ok(())
}

fn build_filter(log_level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("LOG_LEVEL ({log_level}) is not a valid filter")),
    }
}
