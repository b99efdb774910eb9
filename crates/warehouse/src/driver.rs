//! Driver capability consumed by [`crate::WarehouseClient`].
//!
//! The client only needs to open a session and run statements on it; the
//! wire protocol lives behind these traits so tests can substitute an
//! in-memory driver.

use async_trait::async_trait;

use crate::config::WarehouseConfig;
use crate::error::WarehouseError;
use crate::result::QueryResult;

/// Opens sessions against a warehouse.
#[async_trait]
pub trait WarehouseDriver: Send + Sync {
    /// Authenticate with the configured credentials and return a live session.
    ///
    /// Failures must be reported as [`WarehouseError::Connection`].
    async fn connect(
        &self,
        config: &WarehouseConfig,
    ) -> Result<Box<dyn WarehouseSession>, WarehouseError>;
}

/// One authenticated session.
#[async_trait]
pub trait WarehouseSession: Send + Sync {
    /// Execute `sql` with positional text bindings and return the complete
    /// result set.
    async fn execute(&self, sql: &str, params: &[&str]) -> Result<QueryResult, WarehouseError>;

    /// End the session on the warehouse side.
    async fn close(&self) -> Result<(), WarehouseError>;
}
