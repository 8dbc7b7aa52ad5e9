//! Wire types and generated server for the `goflake.FlakeService` gRPC API.
//!
//! The messages mirror `proto/goflake.proto`; `build.rs` generates
//! [`flake_service_server`] around them and encodes the matching
//! [`FILE_DESCRIPTOR_SET`] for reflection.

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GetUuidRequest {}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GetUuidResponse {
    #[prost(uint64, tag = "1")]
    pub uuid: u64,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct DecomposeRequest {
    #[prost(uint64, tag = "1")]
    pub uuid: u64,
}

/// Every numeric field is a decimal string.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DecomposeResponse {
    #[prost(string, tag = "1")]
    pub uuid: String,
    /// Milliseconds since the configured epoch.
    #[prost(string, tag = "2")]
    pub timestamp: String,
    #[prost(string, tag = "3")]
    pub datacenter_id: String,
    #[prost(string, tag = "4")]
    pub machine_id: String,
    #[prost(string, tag = "5")]
    pub sequence: String,
    /// The unused top bit, `false` for every ID this service issues.
    #[prost(bool, tag = "6")]
    pub msb: bool,
}

include!(concat!(env!("OUT_DIR"), "/goflake.FlakeService.rs"));

pub const FILE_DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/goflake_descriptor.bin"));
