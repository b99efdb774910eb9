//! Endpoint modules.

pub mod doc;
mod health;
mod schemas;

use crate::error::ApiError;

pub use health::{health, HealthResponse};
pub use schemas::{
    list_columns, list_schemas, list_tables, table_summary, ColumnInfo, ColumnsResponse,
    SchemasResponse, TablesResponse,
};

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found")
}
