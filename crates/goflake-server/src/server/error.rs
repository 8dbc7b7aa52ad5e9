//! Errors returned by both transports.
//!
//! Over HTTP every error is rendered as `{"error": "<message>"}` with a
//! status code chosen by [`ApiError::status`]. Over gRPC it becomes a
//! [`Status`] with the matching code:
//!
//! | Error | HTTP | gRPC |
//! | --- | --- | --- |
//! | `InvalidUuid` | `400` | `INVALID_ARGUMENT` |
//! | Retryable (sequence exhausted, clock moved back) | `503` + `Retry-After: 1` | `UNAVAILABLE` |
//! | `Stopped` | `503` | `UNAVAILABLE` |
//! | Clock before the epoch, time field overflow, failed blocking task | `500` | `INTERNAL` |

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tonic::Status;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The input is not an unsigned 64-bit decimal integer.
    #[error("invalid uuid: {0}")]
    InvalidUuid(String),

    #[error(transparent)]
    Generator(#[from] goflake::Error),

    /// The blocking task running the generator panicked or was cancelled.
    #[error("id generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUuid(_) => StatusCode::BAD_REQUEST,
            Self::Generator(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Generator(goflake::Error::Stopped) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Generator(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generator(e) if e.is_retryable())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "rejected request");
        }

        let retryable = self.is_retryable();
        let mut response = (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response();
        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

impl From<ApiError> for Status {
    fn from(err: ApiError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!(error = %err, "rpc failed");
        }

        let message = err.to_string();
        match err {
            ApiError::InvalidUuid(_) => Status::invalid_argument(message),
            _ if status == StatusCode::SERVICE_UNAVAILABLE => Status::unavailable(message),
            _ => Status::internal(message),
        }
    }
}
