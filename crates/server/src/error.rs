//! API error type and its HTTP mapping.
//!
//! Handlers return [`ApiError`]; its `IntoResponse` impl renders the
//! `{"detail": "..."}` body. Warehouse failures are logged with the route
//! context and never echoed to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use snowglass_warehouse::{ErrorKind, WarehouseError};

/// Detail sent in place of any warehouse failure.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested schema or table has no metadata.
    #[error("{0}")]
    NotFound(&'static str),

    /// A warehouse call failed while serving the request.
    #[error("{context}: {source}")]
    Warehouse {
        context: &'static str,
        #[source]
        source: WarehouseError,
    },
}

/// HTTP status for each warehouse error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Connection => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Query => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Execution => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail.to_string()),
            ApiError::Warehouse { context, source } => {
                error!(error = %source, kind = ?source.kind(), "{}", context);
                (status_for(source.kind()), INTERNAL_ERROR_DETAIL.to_string())
            }
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Attach a route context to warehouse results.
pub trait WarehouseResultExt<T> {
    fn context(self, context: &'static str) -> Result<T, ApiError>;
}

impl<T> WarehouseResultExt<T> for Result<T, WarehouseError> {
    fn context(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::Warehouse { context, source })
    }
}
