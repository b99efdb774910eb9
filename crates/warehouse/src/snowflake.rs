//! Snowflake driver over the HTTP session protocol.
//!
//! Provides [`SnowflakeDriver`], which logs in with user/password credentials
//! and hands out [`SnowflakeSession`]s that execute statements, poll
//! long-running ones with exponential backoff, and download every result
//! chunk so callers always see the complete result set.

mod protocol;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WarehouseConfig;
use crate::driver::{WarehouseDriver, WarehouseSession};
use crate::error::WarehouseError;
use crate::result::QueryResult;

use protocol::{Chunk, QueryData, QueryOutcome};

const SNOWFLAKE_CONTENT: &str = "application/snowflake";
const JSON_CONTENT: &str = "application/json";

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Opens password-authenticated sessions against a Snowflake account.
#[derive(Debug, Default, Clone)]
pub struct SnowflakeDriver;

impl SnowflakeDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WarehouseDriver for SnowflakeDriver {
    async fn connect(
        &self,
        config: &WarehouseConfig,
    ) -> Result<Box<dyn WarehouseSession>, WarehouseError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("{}/{}", protocol::CLIENT_APP_ID, env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WarehouseError::Connection(e.to_string()))?;

        let base_url = config.base_url();
        let url = format!("{}/session/v1/login-request", base_url);
        let request_id = Uuid::new_v4().to_string();

        debug!(url = %url, user = %config.user, "Logging in to Snowflake");

        let response = http
            .post(&url)
            .query(&[
                ("request_id", request_id.as_str()),
                ("warehouse", config.warehouse.as_str()),
                ("databaseName", config.database.as_str()),
                ("roleName", config.role.as_str()),
            ])
            .header(ACCEPT, JSON_CONTENT)
            .header(CONTENT_TYPE, JSON_CONTENT)
            .json(&protocol::login_body(&config.account, &config.user, &config.password))
            .send()
            .await
            .map_err(|e| WarehouseError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WarehouseError::Connection(e.to_string()))?;
        if !status.is_success() {
            return Err(WarehouseError::Connection(format!(
                "login request returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let login = protocol::parse_login(&body)?;
        let token = login.token.unwrap_or_default();

        info!(
            account = %config.account,
            session_id = ?login.session_id,
            "Snowflake session opened"
        );

        Ok(Box::new(SnowflakeSession {
            http,
            base_url,
            token,
            sequence: AtomicU64::new(0),
            timeout: config.timeout(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated Snowflake session.
pub struct SnowflakeSession {
    http: reqwest::Client,
    base_url: String,
    token: String,
    sequence: AtomicU64,
    timeout: Duration,
}

impl SnowflakeSession {
    fn auth_header(&self) -> String {
        format!("Snowflake Token=\"{}\"", self.token)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Read a response body, turning transport and HTTP failures into
    /// [`WarehouseError::Execution`]. Snowflake reports statement errors
    /// inside a 200 body, so any non-2xx status is a transport-level failure.
    async fn read_body(response: reqwest::Response) -> Result<String, WarehouseError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WarehouseError::Execution(e.to_string()))?;
        if !status.is_success() {
            return Err(WarehouseError::Execution(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(body)
    }

    async fn submit(&self, sql: &str, params: &[&str]) -> Result<QueryOutcome, WarehouseError> {
        let sequence_id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let request_id = Uuid::new_v4().to_string();

        let response = self
            .http
            .post(self.url("/queries/v1/query-request"))
            .query(&[("requestId", request_id.as_str())])
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, SNOWFLAKE_CONTENT)
            .header(CONTENT_TYPE, JSON_CONTENT)
            .json(&protocol::query_body(sql, params, sequence_id))
            .send()
            .await
            .map_err(|e| WarehouseError::Execution(e.to_string()))?;

        protocol::parse_query(&Self::read_body(response).await?)
    }

    /// Poll the result location with exponential backoff until the statement
    /// finishes or the session timeout is exceeded.
    async fn poll_until_complete(
        &self,
        query_id: Option<String>,
        result_url: String,
    ) -> Result<QueryData, WarehouseError> {
        let start = Instant::now();

        let initial_delay_ms: u64 = 200;
        let max_delay_ms: u64 = 2000;
        let backoff_factor: f64 = 1.5;

        let mut delay_ms = initial_delay_ms;
        let mut result_url = result_url;

        loop {
            if start.elapsed() > self.timeout {
                warn!(
                    query_id = ?query_id,
                    timeout_seconds = self.timeout.as_secs(),
                    "Query did not finish in time"
                );
                return Err(WarehouseError::Execution(format!(
                    "query {} timed out after {}s",
                    query_id.as_deref().unwrap_or("<unknown>"),
                    self.timeout.as_secs()
                )));
            }

            // Jitter without rand: nanosecond fraction of the current time.
            let jitter_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
                % 100;
            tokio::time::sleep(Duration::from_millis(delay_ms + jitter_ms as u64)).await;

            let response = self
                .http
                .get(self.url(&result_url))
                .header(AUTHORIZATION, self.auth_header())
                .header(ACCEPT, SNOWFLAKE_CONTENT)
                .send()
                .await
                .map_err(|e| WarehouseError::Execution(e.to_string()))?;

            match protocol::parse_query(&Self::read_body(response).await?)? {
                QueryOutcome::Done(data) => return Ok(data),
                QueryOutcome::InProgress { result_url: next, .. } => {
                    debug!(
                        query_id = ?query_id,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Query still running"
                    );
                    result_url = next;
                }
            }

            delay_ms = ((delay_ms as f64 * backoff_factor) as u64).min(max_delay_ms);
        }
    }

    /// Download `chunks` in order and append their rows to `result`.
    async fn fetch_chunks(
        &self,
        chunks: Vec<Chunk>,
        headers: &[(String, String)],
        result: &mut QueryResult,
    ) -> Result<(), WarehouseError> {
        if chunks.is_empty() {
            return Ok(());
        }

        debug!(
            query_id = ?result.query_id,
            chunks = chunks.len(),
            "Downloading result chunks"
        );

        for chunk in chunks {
            let mut request = self.http.get(&chunk.url);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
            let response = request
                .send()
                .await
                .map_err(|e| WarehouseError::Execution(e.to_string()))?;
            let rows = protocol::parse_chunk(&Self::read_body(response).await?)?;

            if chunk.row_count != 0 && rows.len() as u64 != chunk.row_count {
                return Err(WarehouseError::Execution(format!(
                    "result chunk advertised {} rows but contained {}",
                    chunk.row_count,
                    rows.len()
                )));
            }
            result.rows.extend(rows);
        }
        Ok(())
    }
}

#[async_trait]
impl WarehouseSession for SnowflakeSession {
    async fn execute(&self, sql: &str, params: &[&str]) -> Result<QueryResult, WarehouseError> {
        let start = Instant::now();

        let mut data = match self.submit(sql, params).await? {
            QueryOutcome::Done(data) => data,
            QueryOutcome::InProgress {
                query_id,
                result_url,
            } => {
                debug!(query_id = ?query_id, "Query accepted, polling for result");
                self.poll_until_complete(query_id, result_url).await?
            }
        };

        let chunks = std::mem::take(&mut data.chunks);
        let headers = data.chunk_request_headers();
        let mut result = data.into_result();
        self.fetch_chunks(chunks, &headers, &mut result).await?;

        debug!(
            query_id = ?result.query_id,
            rows = result.row_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Statement finished"
        );
        Ok(result)
    }

    async fn close(&self) -> Result<(), WarehouseError> {
        let response = self
            .http
            .post(self.url("/session"))
            .query(&[("delete", "true")])
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, SNOWFLAKE_CONTENT)
            .send()
            .await
            .map_err(|e| WarehouseError::Execution(e.to_string()))?;
        Self::read_body(response).await?;
        debug!("Snowflake session deleted");
        Ok(())
    }
}
