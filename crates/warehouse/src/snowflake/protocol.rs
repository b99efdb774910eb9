//! Request/response payloads of the Snowflake HTTP session protocol.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::WarehouseError;
use crate::result::{QueryResult, ResultColumn};

pub(crate) const CLIENT_APP_ID: &str = "snowglass";

/// Response codes meaning "statement accepted, result not ready yet".
const QUERY_IN_PROGRESS: &str = "333333";
const QUERY_IN_PROGRESS_ASYNC: &str = "333334";

/// Response codes meaning the session token is no longer valid.
const SESSION_EXPIRED: &str = "390112";
const TOKEN_EXPIRED: &str = "390114";

/// Common envelope around every response body.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    fn code(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }

    fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("unknown error")
    }
}

// ── Login ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginData {
    pub token: Option<String>,
    pub session_id: Option<i64>,
}

/// JSON body of `POST /session/v1/login-request`.
pub(crate) fn login_body(account: &str, user: &str, password: &str) -> Value {
    json!({
        "data": {
            "CLIENT_APP_ID": CLIENT_APP_ID,
            "CLIENT_APP_VERSION": env!("CARGO_PKG_VERSION"),
            "ACCOUNT_NAME": account_name(account),
            "LOGIN_NAME": user,
            "PASSWORD": password,
            "SESSION_PARAMETERS": {
                "QUERY_RESULT_FORMAT": "JSON",
            },
        }
    })
}

/// The login payload wants the bare account locator, without region or
/// cloud suffixes.
pub(crate) fn account_name(account: &str) -> &str {
    account.split('.').next().unwrap_or(account)
}

/// Extract the session token from a login response.
pub(crate) fn parse_login(body: &str) -> Result<LoginData, WarehouseError> {
    let env: Envelope<LoginData> = serde_json::from_str(body)
        .map_err(|e| WarehouseError::Connection(format!("malformed login response: {e}")))?;

    if !env.success {
        return Err(WarehouseError::Connection(format!(
            "login rejected ({}): {}",
            env.code(),
            env.message()
        )));
    }

    match env.data {
        Some(data) if data.token.is_some() => Ok(data),
        _ => Err(WarehouseError::Connection(
            "login response carried no session token".into(),
        )),
    }
}

// ── Query ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryData {
    #[serde(default)]
    pub rowtype: Vec<RowType>,
    #[serde(default)]
    pub rowset: Vec<Vec<Value>>,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    #[serde(default)]
    pub chunk_headers: Option<HashMap<String, String>>,
    pub qrmk: Option<String>,
    pub query_id: Option<String>,
    pub sql_state: Option<String>,
    pub get_result_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RowType {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub scale: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Chunk {
    pub url: String,
    #[serde(default)]
    pub row_count: u64,
}

/// What a query-request (or result poll) response means for the caller.
#[derive(Debug)]
pub(crate) enum QueryOutcome {
    /// The result set (first page plus chunk references) is available.
    Done(QueryData),
    /// The statement is still running; poll `result_url`.
    InProgress {
        query_id: Option<String>,
        result_url: String,
    },
}

/// JSON body of `POST /queries/v1/query-request`.
pub(crate) fn query_body(sql: &str, params: &[&str], sequence_id: u64) -> Value {
    let mut body = json!({
        "sqlText": sql,
        "asyncExec": false,
        "sequenceId": sequence_id,
    });
    if !params.is_empty() {
        let bindings: serde_json::Map<String, Value> = params
            .iter()
            .enumerate()
            .map(|(i, value)| {
                (
                    (i + 1).to_string(),
                    json!({ "type": "TEXT", "value": value }),
                )
            })
            .collect();
        body["bindings"] = Value::Object(bindings);
    }
    body
}

/// Classify a query-request response body.
///
/// Rejections that carry an SQL state are statement errors; anything else
/// that is not a success is an execution failure.
pub(crate) fn parse_query(body: &str) -> Result<QueryOutcome, WarehouseError> {
    let env: Envelope<QueryData> = serde_json::from_str(body)
        .map_err(|e| WarehouseError::Execution(format!("malformed query response: {e}")))?;

    let code = env.code().to_string();
    if code == QUERY_IN_PROGRESS || code == QUERY_IN_PROGRESS_ASYNC {
        let data = env.data.unwrap_or_default();
        let result_url = match (&data.get_result_url, &data.query_id) {
            (Some(url), _) => url.clone(),
            (None, Some(id)) => format!("/queries/{id}/result"),
            (None, None) => {
                return Err(WarehouseError::Execution(
                    "query in progress but no result location was returned".into(),
                ))
            }
        };
        return Ok(QueryOutcome::InProgress {
            query_id: data.query_id,
            result_url,
        });
    }

    if code == SESSION_EXPIRED || code == TOKEN_EXPIRED {
        return Err(WarehouseError::SessionExpired(format!(
            "({code}) {}",
            env.message()
        )));
    }

    if !env.success {
        let message = env.message().to_string();
        let sql_state = env.data.as_ref().and_then(|d| d.sql_state.clone());
        return Err(match sql_state {
            Some(sql_state) => WarehouseError::Query {
                code,
                sql_state,
                message,
            },
            None => WarehouseError::Execution(format!("({code}) {message}")),
        });
    }

    Ok(QueryOutcome::Done(env.data.unwrap_or_default()))
}

/// Parse the body of a result chunk: a comma-separated sequence of JSON row
/// arrays without the enclosing brackets.
pub(crate) fn parse_chunk(body: &str) -> Result<Vec<Vec<Option<String>>>, WarehouseError> {
    let wrapped = format!("[{}]", body.trim());
    let rows: Vec<Vec<Value>> = serde_json::from_str(&wrapped)
        .map_err(|e| WarehouseError::Execution(format!("malformed result chunk: {e}")))?;
    Ok(rows.into_iter().map(row_cells).collect())
}

/// Snowflake's JSON result format carries every cell as a string or null.
fn cell(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn row_cells(row: Vec<Value>) -> Vec<Option<String>> {
    row.into_iter().map(cell).collect()
}

impl QueryData {
    /// Turn the first page into a [`QueryResult`]; chunk rows are appended by
    /// the session.
    pub(crate) fn into_result(self) -> QueryResult {
        QueryResult {
            query_id: self.query_id,
            columns: self
                .rowtype
                .into_iter()
                .map(|rt| ResultColumn {
                    name: rt.name,
                    data_type: rt.data_type,
                    scale: rt.scale,
                })
                .collect(),
            rows: self.rowset.into_iter().map(row_cells).collect(),
        }
    }

    /// Headers required to download result chunks.
    pub(crate) fn chunk_request_headers(&self) -> Vec<(String, String)> {
        if let Some(headers) = &self.chunk_headers {
            return headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }
        match &self.qrmk {
            Some(key) => vec![
                (
                    "x-amz-server-side-encryption-customer-algorithm".into(),
                    "AES256".into(),
                ),
                ("x-amz-server-side-encryption-customer-key".into(), key.clone()),
            ],
            None => Vec::new(),
        }
    }
}
