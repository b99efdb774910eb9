use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::convert::parse_cell;

/// One result row: lower-cased column name to scalar value, in result order.
pub type Row = IndexMap<String, serde_json::Value>;

/// Flat `<column>_<statistic>` mapping produced by the summary query.
pub type TableSummary = Row;

/// Column definition returned alongside a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultColumn {
    /// Column name as declared in the result set.
    pub name: String,
    /// Snowflake wire type (e.g. "fixed", "real", "text", "boolean").
    pub data_type: String,
    /// Decimal scale for `fixed` columns.
    #[serde(default)]
    pub scale: Option<i64>,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            scale: None,
        }
    }

    pub fn with_scale(mut self, scale: i64) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Raw result set from one statement.
///
/// Rows are stored as `Vec<Option<String>>` where `None` represents SQL NULL.
/// Column ordering in each row matches the `columns` vector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Warehouse-assigned query id, when the driver reports one.
    pub query_id: Option<String>,
    /// Column definitions in result-set order.
    pub columns: Vec<ResultColumn>,
    /// Row data. Each inner vector has the same length as `columns`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Convert every cell according to its column type, keeping result order.
    pub fn into_values(self) -> Vec<Vec<serde_json::Value>> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|cells| {
                columns
                    .iter()
                    .zip(cells)
                    .map(|(col, cell)| parse_cell(cell.as_deref(), col))
                    .collect()
            })
            .collect()
    }

    /// Shape every row into a [`Row`] keyed by lower-cased column name, with
    /// cells converted according to their column type.
    pub fn into_rows(self) -> Vec<Row> {
        let keys: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.name.to_lowercase())
            .collect();

        self.into_values()
            .into_iter()
            .map(|values| keys.iter().cloned().zip(values).collect())
            .collect()
    }
}

/// One column of a table as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub description: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            description: None,
        }
    }

    /// Build a descriptor from a metadata row with `name`, `type` and
    /// `description` keys. Returns `None` when the name is missing.
    pub fn from_row(row: &Row) -> Option<Self> {
        let text = |key: &str| row.get(key).and_then(|v| v.as_str()).map(str::to_string);
        Some(Self {
            name: text("name")?,
            data_type: text("type").unwrap_or_default(),
            description: text("description"),
        })
    }
}
