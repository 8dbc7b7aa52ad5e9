//! gRPC transport, the default (`SERVER_TYPE=grpc`).
//!
//! Serves `goflake.FlakeService` next to the standard `grpc.health.v1`
//! service. The reflection service is only registered when
//! `APP_ENV=development`.

pub mod handler;

use crate::proto::{FILE_DESCRIPTOR_SET, flake_service_server::FlakeServiceServer};
use crate::server::config::{AppEnv, ServerConfig};
use crate::server::state::AppState;
use handler::UuidService;
use tonic::transport::Server;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Serves until `shutdown` resolves, then reports `NOT_SERVING` and drains
/// in-flight calls.
pub async fn serve(
    config: &ServerConfig,
    state: AppState,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<FlakeServiceServer<UuidService>>()
        .await;

    let mut router = Server::builder()
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_grpc()))
        .add_service(health_service)
        .add_service(FlakeServiceServer::new(UuidService::new(state)));

    if config.app_env == AppEnv::Development {
        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        router = router.add_service(reflection);
        tracing::debug!("gRPC reflection enabled");
    }

    router
        .serve_with_shutdown(config.server_addr, async move {
            shutdown.await;
            health_reporter
                .set_not_serving::<FlakeServiceServer<UuidService>>()
                .await;
        })
        .await?;

    Ok(())
}
