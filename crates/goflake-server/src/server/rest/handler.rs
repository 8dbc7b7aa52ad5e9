//! Route handlers for ID generation and decoding.

use crate::server::{error::ApiError, state::AppState};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UuidResponse {
    pub uuid: u64,
}

#[derive(Debug, Serialize)]
pub struct DecomposeResponse {
    pub uuid: u64,
    /// The unused top bit, `0` for every ID this service issues.
    pub msb: u64,
    /// Milliseconds since the configured epoch.
    pub time: u64,
    pub datacenter_id: u64,
    pub machine_id: u64,
    pub sequence: u64,
}

pub async fn next_uuid(State(state): State<AppState>) -> Result<Json<UuidResponse>, ApiError> {
    let uuid = state.next_id().await?;
    Ok(Json(UuidResponse { uuid }))
}

pub async fn decompose(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DecomposeResponse>, ApiError> {
    let uuid = parse_uuid(raw)?;
    let parts = state.decompose(uuid);
    Ok(Json(DecomposeResponse {
        uuid,
        msb: u64::from(parts.top_bit),
        time: parts.relative_timestamp,
        datacenter_id: parts.datacenter_id,
        machine_id: parts.machine_id,
        sequence: parts.sequence,
    }))
}

/// Plain decimal digits only. `u64::from_str` would also take a leading `+`.
fn parse_uuid(raw: String) -> Result<u64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::InvalidUuid(raw));
    }
    raw.parse().map_err(|_| ApiError::InvalidUuid(raw))
}

pub async fn health() -> &'static str {
    "ok"
}
