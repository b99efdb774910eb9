//! Tests for WarehouseClient: statement text, parameter binding, lazy
//! sessions and error propagation.

use std::sync::Arc;

use serde_json::json;
use snowglass_warehouse::*;

use crate::support::{columns, names, test_config, RecordingDriver};

/// Single-row summary result with one `fixed` cell per value.
fn summary_row(values: &[&str]) -> QueryResult {
    QueryResult {
        query_id: None,
        columns: values
            .iter()
            .enumerate()
            .map(|(i, _)| ResultColumn::new(format!("C{i}"), "fixed").with_scale(0))
            .collect(),
        rows: vec![values.iter().map(|v| Some(v.to_string())).collect()],
    }
}

// ── Metadata listings ────────────────────────────────────────────────

#[tokio::test]
async fn test_get_schemas_excludes_system_schemas() {
    let driver = RecordingDriver::new();
    driver.respond(names(&["FINANCE", "SALES"]));
    let client = driver.client();

    let schemas = client.get_schemas().await.unwrap();
    assert_eq!(schemas, vec!["FINANCE", "SALES"]);

    let executed = driver.executed();
    assert_eq!(executed.len(), 1);
    let sql = &executed[0].sql;
    assert!(sql.contains("information_schema.schemata"));
    assert!(sql.contains("NOT IN ('INFORMATION_SCHEMA', 'PUBLIC')"));
    assert!(sql.ends_with("ORDER BY schema_name"));
    assert!(executed[0].params.is_empty());
}

#[tokio::test]
async fn test_get_tables_uppercases_bound_schema() {
    let driver = RecordingDriver::new();
    driver.respond(names(&["CUSTOMERS", "ORDERS"]));
    let client = driver.client();

    let tables = client.get_tables("sales").await.unwrap();
    assert_eq!(tables, vec!["CUSTOMERS", "ORDERS"]);

    let executed = driver.executed();
    assert_eq!(executed[0].params, vec!["SALES"]);
    assert!(!executed[0].sql.contains("sales"));
    assert!(executed[0].sql.contains("table_schema = ?"));
}

#[tokio::test]
async fn test_get_tables_unknown_schema_is_empty() {
    let driver = RecordingDriver::new();
    let client = driver.client();

    assert!(client.get_tables("nope").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_columns_uppercases_both_identifiers() {
    let driver = RecordingDriver::new();
    driver.respond(columns(&[("ID", "NUMBER"), ("NAME", "TEXT")]));
    let client = driver.client();

    let cols = client.get_columns("sales", "Orders").await.unwrap();
    assert_eq!(
        cols,
        vec![
            ColumnDescriptor::new("ID", "NUMBER"),
            ColumnDescriptor::new("NAME", "TEXT"),
        ]
    );
    assert_eq!(driver.executed()[0].params, vec!["SALES", "ORDERS"]);
    assert!(driver.executed()[0].sql.ends_with("ORDER BY ordinal_position"));
}

// ── Table summary ────────────────────────────────────────────────────

#[tokio::test]
async fn test_summary_of_table_without_columns_skips_aggregate() {
    let driver = RecordingDriver::new();
    let client = driver.client();

    let summary = client.get_table_summary("SALES", "MISSING").await.unwrap();
    assert!(summary.is_empty());
    assert_eq!(driver.executed().len(), 1, "only the column lookup runs");
}

#[tokio::test]
async fn test_summary_orders_scenario() {
    let driver = RecordingDriver::new();
    driver
        .respond(columns(&[("ID", "NUMBER"), ("NAME", "VARCHAR")]))
        .respond(QueryResult {
            query_id: Some("01b2".into()),
            columns: vec![
                ResultColumn::new("ID_NON_NULL", "fixed").with_scale(0),
                ResultColumn::new("ID_AVG", "fixed").with_scale(6),
                ResultColumn::new("ID_MIN", "fixed").with_scale(0),
                ResultColumn::new("ID_MAX", "fixed").with_scale(0),
                ResultColumn::new("NAME_NON_NULL", "fixed").with_scale(0),
                ResultColumn::new("NAME_DISTINCT", "fixed").with_scale(0),
            ],
            rows: vec![vec![
                Some("3".into()),
                Some("2.000000".into()),
                Some("1".into()),
                Some("3".into()),
                Some("3".into()),
                Some("2".into()),
            ]],
        });
    let client = driver.client();

    let summary = client.get_table_summary("sales", "orders").await.unwrap();

    let executed = driver.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(
        executed[1].sql,
        "SELECT COUNT(ID) AS ID_non_null, AVG(ID) AS ID_avg, MIN(ID) AS ID_min, \
         MAX(ID) AS ID_max, COUNT(NAME) AS NAME_non_null, \
         COUNT(DISTINCT NAME) AS NAME_distinct FROM LONG_TAIL_COMPANIONS.SALES.ORDERS"
    );
    assert!(executed[1].params.is_empty());

    assert_eq!(summary.len(), 6);
    assert_eq!(summary["id_non_null"], json!(3));
    assert_eq!(summary["id_avg"], json!(2.0));
    assert_eq!(summary["name_distinct"], json!(2));
}

#[tokio::test]
async fn test_summary_folds_lowercase_database() {
    let driver = RecordingDriver::new();
    driver
        .respond(columns(&[("ID", "NUMBER")]))
        .respond(summary_row(&["1", "1", "1", "1"]));
    let client = driver.client_with(WarehouseConfig {
        database: "long_tail_companions".into(),
        ..test_config()
    });

    client.get_table_summary("sales", "orders").await.unwrap();

    let sql = &driver.executed()[1].sql;
    assert!(
        sql.ends_with("FROM LONG_TAIL_COMPANIONS.SALES.ORDERS"),
        "{sql}"
    );
    assert!(!sql.contains('"'));
}

#[tokio::test]
async fn test_summary_keys_for_quoted_and_mixed_case_columns() {
    let driver = RecordingDriver::new();
    driver
        .respond(columns(&[
            ("ID", "NUMBER"),
            ("Id", "NUMBER"),
            ("order date", "DATE"),
        ]))
        .respond(summary_row(&[
            "10", "11", "12", "13", // ID
            "20", "21", "22", "23", // Id
            "30", "31", // order date
        ]));
    let client = driver.client();

    let summary = client.get_table_summary("SALES", "ORDERS").await.unwrap();

    let sql = &driver.executed()[1].sql;
    assert!(sql.contains("COUNT(\"order date\") AS \"order date_non_null\""));
    assert!(sql.contains("AVG(\"Id\") AS \"Id_avg\""));

    assert_eq!(summary.len(), 10, "no key may shadow another");
    assert_eq!(summary["id_non_null"], json!(10));
    assert_eq!(summary["id_max"], json!(13));
    assert_eq!(summary["Id_non_null"], json!(20));
    assert_eq!(summary["Id_max"], json!(23));
    assert_eq!(summary["order date_non_null"], json!(30));
    assert_eq!(summary["order date_distinct"], json!(31));
}

#[tokio::test]
async fn test_summary_with_no_result_row_is_empty() {
    let driver = RecordingDriver::new();
    driver.respond(columns(&[("ID", "NUMBER")]));
    let client = driver.client();

    let summary = client.get_table_summary("SALES", "ORDERS").await.unwrap();
    assert!(summary.is_empty());
    assert_eq!(driver.executed().len(), 2);
}

// ── Session lifecycle ────────────────────────────────────────────────

#[tokio::test]
async fn test_session_is_opened_lazily_once() {
    let driver = RecordingDriver::new();
    let client = driver.client();
    assert!(!client.is_connected());
    assert_eq!(driver.connects(), 0);

    client.get_schemas().await.unwrap();
    client.get_tables("SALES").await.unwrap();

    assert_eq!(driver.connects(), 1);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_connect_replaces_session_and_close_releases_it() {
    let driver = RecordingDriver::new();
    let client = driver.client();

    client.connect().await.unwrap();
    client.connect().await.unwrap();
    assert_eq!(driver.connects(), 2);

    client.close().await.unwrap();
    assert_eq!(driver.closes(), 1);
    assert!(!client.is_connected());

    // Closing without a session is a no-op.
    client.close().await.unwrap();
    assert_eq!(driver.closes(), 1);
}

#[tokio::test]
async fn test_not_connected_while_login_is_pending() {
    let driver = RecordingDriver::new();
    let gate = driver.hold_logins();
    let client = Arc::new(driver.client());

    let pending = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get_schemas().await }
    });
    while driver.login_attempts() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(!client.is_connected());

    gate.notify_one();
    pending.await.unwrap().unwrap();
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_expired_session_is_dropped_and_reopened() {
    let driver = RecordingDriver::new();
    driver
        .fail(WarehouseError::SessionExpired(
            "(390112) Your session has expired. Please login again.".into(),
        ))
        .respond(names(&["SALES"]));
    let client = driver.client();

    let err = client.get_schemas().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(!client.is_connected());

    let schemas = client.get_schemas().await.unwrap();
    assert_eq!(schemas, vec!["SALES"]);
    assert_eq!(driver.connects(), 2);
    assert_eq!(driver.executed().len(), 2, "the failed statement is not retried");
}

// ── Errors ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_query_error_propagates_unchanged() {
    let driver = RecordingDriver::new();
    driver.fail(WarehouseError::Query {
        code: "002003".into(),
        sql_state: "42S02".into(),
        message: "Object does not exist".into(),
    });
    let client = driver.client();

    let err = client.get_schemas().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Query);
    assert!(err.to_string().contains("42S02"));
    assert_eq!(driver.executed().len(), 1, "no retry");
}

#[tokio::test]
async fn test_execution_error_propagates_unchanged() {
    let driver = RecordingDriver::new();
    driver.fail(WarehouseError::Execution("socket closed".into()));
    let client = driver.client();

    let err = client.run_query("SELECT 1", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
}

#[tokio::test]
async fn test_connection_failure_surfaces_on_first_query() {
    let driver = RecordingDriver::new();
    driver.refuse_login("Incorrect username or password was specified.");
    let client = driver.client();

    let err = client.get_schemas().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(driver.executed().is_empty());
    assert!(!client.is_connected());
}
