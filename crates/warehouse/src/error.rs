//! Warehouse error taxonomy.

use serde::Serialize;

/// Coarse classification of a [`WarehouseError`], used by callers that map
/// failures onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    Query,
    Execution,
}

/// Errors that can occur during warehouse operations.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// A session could not be established (login rejected, host unreachable).
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The session token is no longer accepted; a new login is required.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// The warehouse rejected the statement (syntax, missing object, privileges).
    #[error("Query error {code} (SQL state {sql_state}): {message}")]
    Query {
        code: String,
        sql_state: String,
        message: String,
    },

    /// Any other failure while executing a statement or reading its result.
    #[error("Execution error: {0}")]
    Execution(String),
}

impl WarehouseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) | Self::SessionExpired(_) => ErrorKind::Connection,
            Self::Query { .. } => ErrorKind::Query,
            Self::Execution(_) => ErrorKind::Execution,
        }
    }
}
