use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use core::time::Duration;
use goflake::{BitLayout, DEFAULT_EPOCH, GeneratorConfig, OverflowPolicy, SequenceReset};
use std::net::SocketAddr;

/// Runtime configuration for the `goflake-server` binary.
///
/// Every setting can be passed as a CLI flag or through the environment (a
/// `.env` file in the working directory is loaded first). Defaults match the
/// reference deployment: epoch `1659034655453`, a 1 ms tick and a
/// `5/5/41/12` bit layout.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "goflake-server",
    version,
    about = "A gRPC or HTTP service for generating and decoding Snowflake-style IDs"
)]
pub struct CliArgs {
    /// Datacenter id embedded in every generated ID. Must fit in
    /// `FLAKE_DATACENTER_BITS`.
    ///
    /// Environment variable: `DATACENTER_ID`
    #[arg(long, env = "DATACENTER_ID", default_value_t = 0)]
    pub datacenter_id: u64,

    /// Machine id embedded in every generated ID. Must fit in
    /// `FLAKE_MACHINE_BITS`.
    ///
    /// Environment variable: `MACHINE_ID`
    #[arg(long, env = "MACHINE_ID", default_value_t = 0)]
    pub machine_id: u64,

    /// Custom epoch, in milliseconds since the Unix epoch.
    ///
    /// Environment variable: `FLAKE_EPOCH`
    #[arg(long, env = "FLAKE_EPOCH", default_value_t = DEFAULT_EPOCH)]
    pub epoch: u64,

    /// How often the sequence counter is reset, in milliseconds. Only used
    /// with the `interval` reset strategy.
    ///
    /// Environment variable: `FLAKE_TICK_MS`
    #[arg(long, env = "FLAKE_TICK_MS", default_value_t = 1)]
    pub tick_ms: u64,

    /// Width of the datacenter id field.
    ///
    /// Environment variable: `FLAKE_DATACENTER_BITS`
    #[arg(long, env = "FLAKE_DATACENTER_BITS", default_value_t = 5)]
    pub datacenter_bits: u8,

    /// Width of the machine id field.
    ///
    /// Environment variable: `FLAKE_MACHINE_BITS`
    #[arg(long, env = "FLAKE_MACHINE_BITS", default_value_t = 5)]
    pub machine_bits: u8,

    /// Width of the timestamp field.
    ///
    /// Environment variable: `FLAKE_TIME_BITS`
    #[arg(long, env = "FLAKE_TIME_BITS", default_value_t = 41)]
    pub time_bits: u8,

    /// Width of the sequence field. The four widths must add up to 63.
    ///
    /// Environment variable: `FLAKE_SEQUENCE_BITS`
    #[arg(long, env = "FLAKE_SEQUENCE_BITS", default_value_t = 12)]
    pub sequence_bits: u8,

    /// How the sequence returns to zero for a new tick.
    ///
    /// Environment variable: `FLAKE_SEQUENCE_RESET`
    #[arg(long, env = "FLAKE_SEQUENCE_RESET", value_enum, default_value_t = ResetArg::Interval)]
    pub sequence_reset: ResetArg,

    /// What to do when a tick runs out of sequence values.
    ///
    /// Environment variable: `FLAKE_OVERFLOW`
    #[arg(long, env = "FLAKE_OVERFLOW", value_enum, default_value_t = OverflowArg::Reject)]
    pub overflow: OverflowArg,

    /// Transport to serve: `grpc` (`goflake.FlakeService`) or `rest` (JSON over
    /// HTTP).
    ///
    /// Environment variable: `SERVER_TYPE`
    #[arg(long, env = "SERVER_TYPE", value_enum, default_value_t = ServerType::Grpc)]
    pub server_type: ServerType,

    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Deployment environment. Selects pretty (development) or JSON
    /// (production) log output. gRPC reflection is only served in
    /// development.
    ///
    /// Environment variable: `APP_ENV`
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = AppEnv::Development)]
    pub app_env: AppEnv,

    /// Log filter used when `RUST_LOG` is not set, e.g. `info` or
    /// `goflake=debug,info`.
    ///
    /// Environment variable: `LOG_LEVEL`
    #[arg(long, env = "LOG_LEVEL", default_value_t = String::from("info"))]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ServerType {
    Grpc,
    Rest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AppEnv {
    Development,
    Production,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResetArg {
    Interval,
    Timestamp,
}

impl From<ResetArg> for SequenceReset {
    fn from(arg: ResetArg) -> Self {
        match arg {
            ResetArg::Interval => Self::Interval,
            ResetArg::Timestamp => Self::Timestamp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OverflowArg {
    Reject,
    Block,
}

impl From<OverflowArg> for OverflowPolicy {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Reject => Self::Reject,
            OverflowArg::Block => Self::Block,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_type: ServerType,
    pub server_addr: SocketAddr,
    pub app_env: AppEnv,
    pub log_level: String,
    pub generator: GeneratorConfig,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.log_level.trim().is_empty() {
            bail!("LOG_LEVEL must not be empty");
        }

        let server_addr: SocketAddr = args.server_addr.parse().with_context(|| {
            format!("SERVER_ADDR ({}) is not a socket address", args.server_addr)
        })?;

        let layout = BitLayout::new(
            args.datacenter_bits,
            args.machine_bits,
            args.time_bits,
            args.sequence_bits,
        )
        .context("FLAKE_*_BITS do not form a valid layout")?;

        let generator = GeneratorConfig::default()
            .with_datacenter_id(args.datacenter_id)
            .with_machine_id(args.machine_id)
            .with_epoch(args.epoch)
            .with_tick_interval(Duration::from_millis(args.tick_ms))
            .with_layout(layout)
            .with_reset(args.sequence_reset.into())
            .with_overflow(args.overflow.into());
        generator
            .validate()
            .context("invalid generator configuration")?;

        Ok(Self {
            server_type: args.server_type,
            server_addr,
            app_env: args.app_env,
            log_level: args.log_level,
            generator,
        })
    }
}
