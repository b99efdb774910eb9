//! Tests for WarehouseConfig: environment loading, defaults and profiles.

use std::env;
use std::sync::Mutex;

use snowglass_core::ConfigError;
use snowglass_warehouse::*;

// Env-based tests must run serially to avoid interfering with each other.
static ENV_LOCK: Mutex<()> = Mutex::new(());

// Helper: clear all SNOWFLAKE_* and profile env vars used by the config.
fn clear_snowflake_env() {
    let keys = [
        "SNOWGLASS_PROFILE",
        "SNOWFLAKE_ACCOUNT",
        "SNOWFLAKE_USER",
        "SNOWFLAKE_PASSWORD",
        "SNOWFLAKE_ROLE",
        "SNOWFLAKE_WAREHOUSE",
        "SNOWFLAKE_DATABASE",
        "SNOWFLAKE_HOST",
        "SNOWFLAKE_TIMEOUT_SECONDS",
        "TEST_SNOWFLAKE_ACCOUNT",
        "TEST_SNOWFLAKE_DATABASE",
    ];
    for k in keys {
        env::remove_var(k);
    }
}

fn set_credentials() {
    env::set_var("SNOWFLAKE_ACCOUNT", "xy12345.eu-central-1");
    env::set_var("SNOWFLAKE_USER", "reporter");
    env::set_var("SNOWFLAKE_PASSWORD", "hunter2");
}

#[test]
fn test_config_defaults() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_snowflake_env();
    set_credentials();

    let cfg = WarehouseConfig::from_env().unwrap();

    assert_eq!(cfg.account, "xy12345.eu-central-1");
    assert_eq!(cfg.role, "LONG_TAIL_READ_ONLY");
    assert_eq!(cfg.warehouse, "COMPUTE_WH");
    assert_eq!(cfg.database, "LONG_TAIL_COMPANIONS");
    assert_eq!(cfg.host, None);
    assert_eq!(cfg.timeout_seconds, 300);
    assert_eq!(
        cfg.base_url(),
        "https://xy12345.eu-central-1.snowflakecomputing.com"
    );

    clear_snowflake_env();
}

#[test]
fn test_config_overrides() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_snowflake_env();
    set_credentials();
    env::set_var("SNOWFLAKE_ROLE", "ANALYST");
    env::set_var("SNOWFLAKE_DATABASE", "ANALYTICS");
    env::set_var("SNOWFLAKE_HOST", "acct.privatelink.snowflakecomputing.com");
    env::set_var("SNOWFLAKE_TIMEOUT_SECONDS", "30");

    let cfg = WarehouseConfig::from_env().unwrap();

    assert_eq!(cfg.role, "ANALYST");
    assert_eq!(cfg.database, "ANALYTICS");
    assert_eq!(cfg.timeout_seconds, 30);
    assert_eq!(
        cfg.base_url(),
        "https://acct.privatelink.snowflakecomputing.com"
    );

    clear_snowflake_env();
}

#[test]
fn test_config_missing_credentials() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_snowflake_env();
    env::set_var("SNOWFLAKE_ACCOUNT", "xy12345");
    env::set_var("SNOWFLAKE_USER", "reporter");

    let err = WarehouseConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing("SNOWFLAKE_PASSWORD")));

    clear_snowflake_env();
}

#[test]
fn test_config_invalid_timeout() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_snowflake_env();
    set_credentials();
    env::set_var("SNOWFLAKE_TIMEOUT_SECONDS", "soon");

    let err = WarehouseConfig::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid { key: "SNOWFLAKE_TIMEOUT_SECONDS", .. }
    ));

    clear_snowflake_env();
}

#[test]
fn test_config_profile_takes_precedence() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_snowflake_env();
    set_credentials();
    env::set_var("SNOWGLASS_PROFILE", "test");
    env::set_var("TEST_SNOWFLAKE_ACCOUNT", "staging42");
    env::set_var("TEST_SNOWFLAKE_DATABASE", "STAGING_DB");

    let cfg = WarehouseConfig::from_env().unwrap();

    assert_eq!(cfg.account, "staging42");
    assert_eq!(cfg.database, "STAGING_DB");
    // Unprefixed keys still apply when the profile does not override them.
    assert_eq!(cfg.user, "reporter");

    clear_snowflake_env();
}

#[test]
fn test_config_debug_hides_password() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_snowflake_env();
    set_credentials();

    let cfg = WarehouseConfig::from_env().unwrap();
    assert!(!format!("{cfg:?}").contains("hunter2"));

    clear_snowflake_env();
}
