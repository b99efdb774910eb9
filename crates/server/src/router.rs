//! HTTP router construction.
//!
//! Assembles the routes, CORS middleware and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/schemas", get(api::list_schemas))
        .route("/schemas/{schema}/tables", get(api::list_tables))
        .route(
            "/schemas/{schema}/tables/{table}/columns",
            get(api::list_columns),
        )
        .route(
            "/schemas/{schema}/tables/{table}/summary",
            get(api::table_summary),
        )
        .route("/openapi.json", get(api::doc::openapi_json))
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
        .fallback(api::not_found)
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

/// `*` allows any origin; otherwise a comma-separated origin list.
fn cors_layer(cors_origin: &str) -> CorsLayer {
    if cors_origin.trim() == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cors_origin
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}
