//! Table summary query builder.
//!
//! A summary is one row of per-column aggregates computed by a single
//! full-table scan: numeric columns get count/avg/min/max, every other
//! column gets count and distinct count.

use std::collections::HashSet;

use crate::ident::{is_canonical, render_ident, render_path};
use crate::result::ColumnDescriptor;

/// Declared types that receive the numeric aggregate set.
pub const NUMERIC_TYPES: &[&str] = &["NUMBER", "INT", "FLOAT", "DOUBLE", "DECIMAL"];

/// One statistic computed for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    NonNull,
    Avg,
    Min,
    Max,
    Distinct,
}

impl Statistic {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::NonNull => "non_null",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::Distinct => "distinct",
        }
    }

    fn aggregate(self, column: &str) -> String {
        match self {
            Self::NonNull => format!("COUNT({column})"),
            Self::Avg => format!("AVG({column})"),
            Self::Min => format!("MIN({column})"),
            Self::Max => format!("MAX({column})"),
            Self::Distinct => format!("COUNT(DISTINCT {column})"),
        }
    }
}

pub fn is_numeric(data_type: &str) -> bool {
    NUMERIC_TYPES.contains(&data_type)
}

/// Statistics generated for a column of the given declared type.
pub fn statistics_for(data_type: &str) -> &'static [Statistic] {
    if is_numeric(data_type) {
        &[Statistic::NonNull, Statistic::Avg, Statistic::Min, Statistic::Max]
    } else {
        &[Statistic::NonNull, Statistic::Distinct]
    }
}

/// Alias for a column statistic. The suffix is a fixed lower-case token, so a
/// canonical column keeps a bare alias and the warehouse folds it to upper case.
fn alias(column: &str, stat: Statistic) -> String {
    let alias = format!("{}_{}", column, stat.suffix());
    if is_canonical(column) {
        alias
    } else {
        render_ident(&alias)
    }
}

/// Aggregate expressions (`AGG(col) AS col_stat`) for every column, in
/// column order.
pub fn summary_expressions(columns: &[ColumnDescriptor]) -> Vec<String> {
    columns
        .iter()
        .flat_map(|col| {
            let column = render_ident(&col.name);
            statistics_for(&col.data_type)
                .iter()
                .map(move |stat| format!("{} AS {}", stat.aggregate(&column), alias(&col.name, *stat)))
        })
        .collect()
}

/// Result keys for the summary row, one per expression of
/// [`summary_expressions`] and in the same order.
///
/// Canonical columns are case-insensitive in Snowflake and are keyed by their
/// lower-cased name; quoted columns keep their exact name. A key that would
/// shadow an earlier one falls back to the column's rendered identifier.
pub fn summary_keys(columns: &[ColumnDescriptor]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for col in columns {
        for stat in statistics_for(&col.data_type) {
            let preferred = if is_canonical(&col.name) {
                format!("{}_{}", col.name.to_lowercase(), stat.suffix())
            } else {
                format!("{}_{}", col.name, stat.suffix())
            };
            let key = if seen.contains(&preferred) {
                format!("{}_{}", render_ident(&col.name), stat.suffix())
            } else {
                preferred
            };
            seen.insert(key.clone());
            keys.push(key);
        }
    }
    keys
}

/// Build the summary statement for `database.schema.table`.
///
/// Returns `None` when there are no columns to aggregate.
pub fn build_summary_query(
    database: &str,
    schema: &str,
    table: &str,
    columns: &[ColumnDescriptor],
) -> Option<String> {
    if columns.is_empty() {
        return None;
    }
    Some(format!(
        "SELECT {} FROM {}",
        summary_expressions(columns).join(", "),
        render_path(&[database, schema, table])
    ))
}
