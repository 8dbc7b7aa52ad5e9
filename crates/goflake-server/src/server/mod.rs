pub mod config;
pub mod error;
pub mod grpc;
pub mod rest;
pub mod state;
pub mod telemetry;
