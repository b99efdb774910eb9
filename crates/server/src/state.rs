//! Shared application state.

use std::sync::Arc;

use snowglass_warehouse::WarehouseClient;

/// State handed to every handler through `State<Arc<AppState>>`.
pub struct AppState {
    /// The single warehouse client; its session is shared by all requests.
    pub client: Arc<WarehouseClient>,
}

impl AppState {
    pub fn new(client: Arc<WarehouseClient>) -> Self {
        Self { client }
    }
}
