pub mod client;
pub mod config;
mod convert;
pub mod driver;
pub mod error;
pub mod ident;
pub mod result;
pub mod snowflake;
pub mod summary;

pub use client::WarehouseClient;
pub use config::WarehouseConfig;
pub use driver::{WarehouseDriver, WarehouseSession};
pub use error::{ErrorKind, WarehouseError};
pub use ident::{render_ident, render_path};
pub use result::{ColumnDescriptor, QueryResult, ResultColumn, Row, TableSummary};
pub use snowflake::{SnowflakeDriver, SnowflakeSession};
pub use summary::{build_summary_query, summary_expressions, summary_keys};
