//! Schema, table, column and summary endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use snowglass_warehouse::{ColumnDescriptor, TableSummary};

use crate::error::{ApiError, ErrorResponse, WarehouseResultExt};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SchemasResponse {
    pub schemas: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

/// One column of a table.
#[derive(Debug, Serialize, ToSchema)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub description: Option<String>,
}

impl From<ColumnDescriptor> for ColumnInfo {
    fn from(col: ColumnDescriptor) -> Self {
        Self {
            name: col.name,
            data_type: col.data_type,
            description: col.description,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ColumnsResponse {
    pub columns: Vec<ColumnInfo>,
}

#[utoipa::path(
    get,
    path = "/schemas",
    tag = "Schemas",
    responses(
        (status = 200, description = "Schema names", body = SchemasResponse),
        (status = 500, description = "Warehouse failure", body = ErrorResponse)
    )
)]
pub async fn list_schemas(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchemasResponse>, ApiError> {
    let schemas = state
        .client
        .get_schemas()
        .await
        .context("Error listing schemas")?;
    Ok(Json(SchemasResponse { schemas }))
}

#[utoipa::path(
    get,
    path = "/schemas/{schema}/tables",
    tag = "Schemas",
    params(("schema" = String, Path, description = "Schema name (case-insensitive)")),
    responses(
        (status = 200, description = "Table names", body = TablesResponse),
        (status = 404, description = "Schema not found", body = ErrorResponse),
        (status = 500, description = "Warehouse failure", body = ErrorResponse)
    )
)]
pub async fn list_tables(
    State(state): State<Arc<AppState>>,
    Path(schema): Path<String>,
) -> Result<Json<TablesResponse>, ApiError> {
    let tables = state
        .client
        .get_tables(&schema)
        .await
        .context("Error listing tables")?;
    if tables.is_empty() {
        debug!(schema = %schema, "No tables found");
        return Err(ApiError::NotFound("Schema not found"));
    }
    Ok(Json(TablesResponse { tables }))
}

#[utoipa::path(
    get,
    path = "/schemas/{schema}/tables/{table}/columns",
    tag = "Schemas",
    params(
        ("schema" = String, Path, description = "Schema name (case-insensitive)"),
        ("table" = String, Path, description = "Table name (case-insensitive)")
    ),
    responses(
        (status = 200, description = "Column metadata", body = ColumnsResponse),
        (status = 404, description = "Table or schema not found", body = ErrorResponse),
        (status = 500, description = "Warehouse failure", body = ErrorResponse)
    )
)]
pub async fn list_columns(
    State(state): State<Arc<AppState>>,
    Path((schema, table)): Path<(String, String)>,
) -> Result<Json<ColumnsResponse>, ApiError> {
    let columns = state
        .client
        .get_columns(&schema, &table)
        .await
        .context("Error listing columns")?;
    if columns.is_empty() {
        return Err(ApiError::NotFound("Table or schema not found"));
    }
    Ok(Json(ColumnsResponse {
        columns: columns.into_iter().map(ColumnInfo::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/schemas/{schema}/tables/{table}/summary",
    tag = "Schemas",
    params(
        ("schema" = String, Path, description = "Schema name (case-insensitive)"),
        ("table" = String, Path, description = "Table name (case-insensitive)")
    ),
    responses(
        (status = 200, description = "Flat <column>_<statistic> mapping", body = Object),
        (status = 404, description = "Table not found", body = ErrorResponse),
        (status = 500, description = "Warehouse failure", body = ErrorResponse)
    )
)]
pub async fn table_summary(
    State(state): State<Arc<AppState>>,
    Path((schema, table)): Path<(String, String)>,
) -> Result<Json<TableSummary>, ApiError> {
    let summary = state
        .client
        .get_table_summary(&schema, &table)
        .await
        .context("Error computing table summary")?;
    if summary.is_empty() {
        return Err(ApiError::NotFound("Table not found"));
    }
    Ok(Json(summary))
}
