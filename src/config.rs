// src/config.rs

//! Configuration loading.
//!
//! A TOML file provides the base configuration; a few environment variables
//! override it so deployments never need secrets on disk.
//!
//! - `STATEMENT_CONFIG`: path of the TOML file (default `data/config.toml`)
//! - `JUTGE_EMAIL`, `JUTGE_PASSWORD`: login credentials
//! - `JUTGE_COOKIE`: raw cookie forwarded on API calls
//! - `STATEMENT_TIMEOUT_SECS`: upstream request timeout

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Config;

pub const CONFIG_PATH_ENV: &str = "STATEMENT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "data/config.toml";

/// Pick the config file: explicit path, then `STATEMENT_CONFIG`, then the
/// default location.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load, override from the process environment and validate.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = config_path(explicit);
    let mut config = if path.exists() {
        Config::load_or_default(&path)
    } else {
        log::debug!("No config file at {}; using defaults", path.display());
        Config::default()
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Apply environment overrides read through `lookup`. Empty values are
/// ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(email) = get("JUTGE_EMAIL") {
        config.auth.email = Some(email);
    }
    if let Some(password) = get("JUTGE_PASSWORD") {
        config.auth.password = Some(password);
    }
    if let Some(cookie) = get("JUTGE_COOKIE") {
        config.upstream.api_cookie = Some(cookie);
    }
    if let Some(timeout) = get("STATEMENT_TIMEOUT_SECS") {
        config.upstream.timeout_secs = timeout.trim().parse().map_err(|e| {
            AppError::config(format!("STATEMENT_TIMEOUT_SECS={timeout:?}: {e}"))
        })?;
    }
    Ok(())
}
