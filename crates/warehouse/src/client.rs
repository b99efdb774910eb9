//! Warehouse metadata client.
//!
//! [`WarehouseClient`] owns the configuration, a driver and at most one live
//! session. The session is opened lazily on first use and shared by every
//! caller; statements on it are serialized.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::WarehouseConfig;
use crate::driver::{WarehouseDriver, WarehouseSession};
use crate::error::WarehouseError;
use crate::result::{ColumnDescriptor, QueryResult, Row, TableSummary};
use crate::snowflake::SnowflakeDriver;
use crate::summary::{build_summary_query, summary_keys};

const SCHEMAS_SQL: &str = "SELECT schema_name AS name FROM information_schema.schemata \
     WHERE schema_name NOT IN ('INFORMATION_SCHEMA', 'PUBLIC') ORDER BY schema_name";

const TABLES_SQL: &str = "SELECT table_name AS name FROM information_schema.tables \
     WHERE table_schema = ? ORDER BY table_name";

const COLUMNS_SQL: &str = "SELECT column_name AS name, data_type AS type, comment AS description \
     FROM information_schema.columns \
     WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position";

/// Read-only client for warehouse metadata and table summaries.
pub struct WarehouseClient {
    config: WarehouseConfig,
    driver: Arc<dyn WarehouseDriver>,
    session: Mutex<Option<Box<dyn WarehouseSession>>>,
    connected: AtomicBool,
}

impl WarehouseClient {
    /// Client backed by the Snowflake HTTP driver.
    pub fn new(config: WarehouseConfig) -> Self {
        Self::with_driver(config, Arc::new(SnowflakeDriver::new()))
    }

    pub fn with_driver(config: WarehouseConfig, driver: Arc<dyn WarehouseDriver>) -> Self {
        Self {
            config,
            driver,
            session: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// `true` once a login succeeded and until the session is released.
    /// Never contacts the warehouse.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Open a new session, replacing any existing one.
    pub async fn connect(&self) -> Result<(), WarehouseError> {
        let mut guard = self.session.lock().await;
        self.connected.store(false, Ordering::Release);
        *guard = None;
        *guard = Some(self.open_session().await?);
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn open_session(&self) -> Result<Box<dyn WarehouseSession>, WarehouseError> {
        match self.driver.connect(&self.config).await {
            Ok(session) => {
                info!(
                    account = %self.config.account,
                    database = %self.config.database,
                    warehouse = %self.config.warehouse,
                    "Connected to warehouse"
                );
                Ok(session)
            }
            Err(e) => {
                error!(error = %e, account = %self.config.account, "Warehouse connection failed");
                Err(e)
            }
        }
    }

    /// Release the session, if any.
    pub async fn close(&self) -> Result<(), WarehouseError> {
        let session = self.session.lock().await.take();
        self.connected.store(false, Ordering::Release);
        let Some(session) = session else {
            return Ok(());
        };
        match session.close().await {
            Ok(()) => {
                info!("Warehouse connection closed");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to close warehouse connection");
                Err(e)
            }
        }
    }

    /// Execute `sql` with positional text parameters and return every row,
    /// keyed by lower-cased column name.
    ///
    /// Connects first when no session is open. Errors propagate unchanged.
    pub async fn run_query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>, WarehouseError> {
        let result = self.execute(sql, params).await?;
        Ok(result.into_rows())
    }

    /// Run one statement on the shared session, opening it first if needed.
    ///
    /// An expired session is dropped so the next call logs in again.
    async fn execute(&self, sql: &str, params: &[&str]) -> Result<QueryResult, WarehouseError> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            *guard = Some(self.open_session().await?);
            self.connected.store(true, Ordering::Release);
        }
        let Some(session) = guard.as_ref() else {
            return Err(WarehouseError::Connection("no active session".into()));
        };

        debug!(sql = %sql, params = ?params, "Executing statement");
        let start = Instant::now();

        match session.execute(sql, params).await {
            Ok(result) => {
                debug!(
                    rows = result.row_count(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Statement returned"
                );
                Ok(result)
            }
            Err(e @ WarehouseError::SessionExpired(_)) => {
                warn!(error = %e, "Warehouse session expired, dropping it");
                *guard = None;
                self.connected.store(false, Ordering::Release);
                Err(e)
            }
            Err(e @ WarehouseError::Query { .. }) => {
                error!(error = %e, "Query error");
                Err(e)
            }
            Err(e) => {
                error!(error = ?e, "Query execution failed");
                Err(e)
            }
        }
    }

    /// Schema names in the configured database, excluding
    /// `INFORMATION_SCHEMA` and `PUBLIC`.
    pub async fn get_schemas(&self) -> Result<Vec<String>, WarehouseError> {
        let rows = self.run_query(SCHEMAS_SQL, &[]).await?;
        Ok(names(rows))
    }

    /// Table names in `schema`. Empty when the schema is unknown.
    pub async fn get_tables(&self, schema: &str) -> Result<Vec<String>, WarehouseError> {
        let schema = schema.to_uppercase();
        let rows = self.run_query(TABLES_SQL, &[&schema]).await?;
        debug!(schema = %schema, tables = rows.len(), "Listed tables");
        Ok(names(rows))
    }

    /// Columns of `schema.table` in declaration order. Empty when the table
    /// is unknown.
    pub async fn get_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, WarehouseError> {
        let schema = schema.to_uppercase();
        let table = table.to_uppercase();
        let rows = self.run_query(COLUMNS_SQL, &[&schema, &table]).await?;
        Ok(rows.iter().filter_map(ColumnDescriptor::from_row).collect())
    }

    /// Per-column aggregate statistics for `schema.table`, computed by one
    /// full-table scan. Empty when the table has no columns.
    pub async fn get_table_summary(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<TableSummary, WarehouseError> {
        let columns = self.get_columns(schema, table).await?;

        // Unquoted identifiers fold to upper case, including the login database.
        let database = self.config.database.to_uppercase();
        let schema = schema.to_uppercase();
        let table = table.to_uppercase();
        let Some(sql) = build_summary_query(&database, &schema, &table, &columns) else {
            return Ok(TableSummary::new());
        };

        let start = Instant::now();
        // Keyed by position: result column names fold case and can collide.
        let first_row = self.execute(&sql, &[]).await?.into_values().into_iter().next();
        let summary: TableSummary = match first_row {
            Some(values) => summary_keys(&columns).into_iter().zip(values).collect(),
            None => TableSummary::new(),
        };

        info!(
            schema = %schema,
            table = %table,
            columns = columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Computed table summary"
        );
        Ok(summary)
    }
}

/// Collect the `name` column of metadata rows.
fn names(rows: Vec<Row>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|mut row| match row.shift_remove("name") {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        })
        .collect()
}
