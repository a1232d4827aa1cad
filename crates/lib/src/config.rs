//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.parrot/config.json`) and environment.
//! Secrets (channel access token, database connection) are usually supplied via env.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default LINE Messaging API origin.
pub const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// LINE channel settings.
    #[serde(default)]
    pub line: LineConfig,

    /// Message store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 7071).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    7071
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// LINE channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Long-lived channel access token. Overridden by LINE_CHANNEL_ACCESS_TOKEN env when set.
    pub channel_access_token: Option<String>,
    /// API origin (default https://api.line.me). Overridden by LINE_API_BASE env when set.
    pub api_base: Option<String>,
}

/// Message store config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://messages.db`. Overridden by SQLDB_CONNECTION env.
    pub connection: Option<String>,
}

pub const ACCESS_TOKEN_ENV: &str = "LINE_CHANNEL_ACCESS_TOKEN";
pub const DATABASE_URL_ENV: &str = "SQLDB_CONNECTION";
pub const LINE_API_BASE_ENV: &str = "LINE_API_BASE";

/// Settings the gateway cannot start without, after env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub access_token: String,
    pub database_url: String,
    pub api_base: String,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Env value wins over the configured one; blank values count as unset.
fn env_or_config(env: Option<&str>, configured: Option<&str>) -> Option<String> {
    non_empty(env).or_else(|| non_empty(configured))
}

fn access_token_from(config: &Config, env: Option<&str>) -> Option<String> {
    env_or_config(env, config.line.channel_access_token.as_deref())
}

fn database_url_from(config: &Config, env: Option<&str>) -> Option<String> {
    env_or_config(env, config.database.connection.as_deref())
}

fn line_api_base_from(config: &Config, env: Option<&str>) -> String {
    env_or_config(env, config.line.api_base.as_deref())
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_LINE_API_BASE.to_string())
}

/// Resolve gateway settings with `env` looking up environment variables by name.
/// Fails when the access token or the database connection is unset.
pub fn gateway_settings_from<F>(config: &Config, env: F) -> Result<GatewaySettings>
where
    F: Fn(&str) -> Option<String>,
{
    let access_token = access_token_from(config, env(ACCESS_TOKEN_ENV).as_deref()).context(
        "LINE channel access token not configured (set line.channelAccessToken or LINE_CHANNEL_ACCESS_TOKEN)",
    )?;
    let database_url = database_url_from(config, env(DATABASE_URL_ENV).as_deref()).context(
        "database connection not configured (set database.connection or SQLDB_CONNECTION)",
    )?;
    let api_base = line_api_base_from(config, env(LINE_API_BASE_ENV).as_deref());
    Ok(GatewaySettings {
        access_token,
        database_url,
        api_base,
    })
}

/// Resolve gateway settings against the process environment.
pub fn resolve_gateway_settings(config: &Config) -> Result<GatewaySettings> {
    gateway_settings_from(config, |key| std::env::var(key).ok())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("PARROT_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".parrot").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, or the default path (or PARROT_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
