use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use snowglass_core::config::{active_profile, profiled_env_opt, profiled_env_or, profiled_env_parse};
use snowglass_core::ConfigError;

pub const DEFAULT_ROLE: &str = "LONG_TAIL_READ_ONLY";
pub const DEFAULT_WAREHOUSE: &str = "COMPUTE_WH";
pub const DEFAULT_DATABASE: &str = "LONG_TAIL_COMPANIONS";

/// Default per-request timeout for warehouse HTTP calls.
const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

// ── WarehouseConfig ──────────────────────────────────────────────

/// Credentials and session defaults for the Snowflake warehouse.
///
/// Reads `SNOWFLAKE_*` environment variables with optional profile prefix.
/// When `SNOWGLASS_PROFILE=PROD`, checks `PROD_SNOWFLAKE_DATABASE` before
/// `SNOWFLAKE_DATABASE`.
#[derive(Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Account identifier, e.g. `xy12345.eu-central-1`.
    pub account: String,
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub role: String,
    pub warehouse: String,
    pub database: String,
    /// Host override; defaults to `<account>.snowflakecomputing.com`.
    pub host: Option<String>,
    /// Timeout applied to every HTTP request against the warehouse.
    pub timeout_seconds: u64,
}

impl WarehouseConfig {
    /// Build config from environment variables using the active profile.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_profiled(&active_profile())
    }

    /// Build config for a specific named profile and validate it.
    pub fn from_env_profiled(profile: &str) -> Result<Self, ConfigError> {
        let cfg = Self {
            account: profiled_env_or(profile, "SNOWFLAKE_ACCOUNT", ""),
            user: profiled_env_or(profile, "SNOWFLAKE_USER", ""),
            password: profiled_env_or(profile, "SNOWFLAKE_PASSWORD", ""),
            role: profiled_env_or(profile, "SNOWFLAKE_ROLE", DEFAULT_ROLE),
            warehouse: profiled_env_or(profile, "SNOWFLAKE_WAREHOUSE", DEFAULT_WAREHOUSE),
            database: profiled_env_or(profile, "SNOWFLAKE_DATABASE", DEFAULT_DATABASE),
            host: profiled_env_opt(profile, "SNOWFLAKE_HOST"),
            timeout_seconds: profiled_env_parse(
                profile,
                "SNOWFLAKE_TIMEOUT_SECONDS",
                DEFAULT_TIMEOUT_SECONDS,
            )?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that account, user and password were supplied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account.is_empty() {
            return Err(ConfigError::Missing("SNOWFLAKE_ACCOUNT"));
        }
        if self.user.is_empty() {
            return Err(ConfigError::Missing("SNOWFLAKE_USER"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Missing("SNOWFLAKE_PASSWORD"));
        }
        Ok(())
    }

    /// Base URL of the account's HTTP endpoint.
    pub fn base_url(&self) -> String {
        match &self.host {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(host) => format!("https://{}", host.trim_end_matches('/')),
            None => format!("https://{}.snowflakecomputing.com", self.account),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            "  warehouse:   account={}, user={}, role={}, warehouse={}, database={}",
            self.account,
            self.user,
            self.role,
            self.warehouse,
            self.database
        );
    }
}

impl fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("host", &self.host)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────
