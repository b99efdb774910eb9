//! OpenAPI documentation aggregator.
//!
//! Collects the `#[utoipa::path]`-annotated handlers into one OpenAPI spec,
//! served as JSON at `/openapi.json` and through Scalar UI at `/docs`.

use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "snowglass API",
        description = "Read-only access to Snowflake schemas, tables, columns and table summaries.",
    ),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Schemas", description = "Warehouse metadata and per-table summaries"),
    ),
    paths(
        crate::api::health::health,
        crate::api::schemas::list_schemas,
        crate::api::schemas::list_tables,
        crate::api::schemas::list_columns,
        crate::api::schemas::table_summary,
    ),
    components(schemas(
        crate::api::health::HealthResponse,
        crate::api::schemas::SchemasResponse,
        crate::api::schemas::TablesResponse,
        crate::api::schemas::ColumnInfo,
        crate::api::schemas::ColumnsResponse,
        crate::error::ErrorResponse,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
