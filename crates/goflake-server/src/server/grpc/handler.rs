//! `goflake.FlakeService` implementation.

use crate::proto::{
    DecomposeRequest, DecomposeResponse, GetUuidRequest, GetUuidResponse,
    flake_service_server::FlakeService,
};
use crate::server::state::AppState;
use tonic::{Request, Response, Status};

/// Serves `GetUUID` and `Decompose` from the shared generator.
#[derive(Clone, Debug)]
pub struct UuidService {
    state: AppState,
}

impl UuidService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[tonic::async_trait]
impl FlakeService for UuidService {
    async fn get_uuid(
        &self,
        _request: Request<GetUuidRequest>,
    ) -> Result<Response<GetUuidResponse>, Status> {
        tracing::debug!("Generating new uuid");
        let uuid = self.state.next_id().await?;
        Ok(Response::new(GetUuidResponse { uuid }))
    }

    async fn decompose(
        &self,
        request: Request<DecomposeRequest>,
    ) -> Result<Response<DecomposeResponse>, Status> {
        let uuid = request.into_inner().uuid;
        tracing::debug!(uuid, "Decomposing");

        let parts = self.state.decompose(uuid);
        Ok(Response::new(DecomposeResponse {
            uuid: uuid.to_string(),
            timestamp: parts.relative_timestamp.to_string(),
            datacenter_id: parts.datacenter_id.to_string(),
            machine_id: parts.machine_id.to_string(),
            sequence: parts.sequence.to_string(),
            msb: parts.top_bit,
        }))
    }
}
