//! Environment configuration for the backend connection and the dashboard server.
//!
//! The backend URL and access key are mandatory; both are validated before the
//! server binds so a misconfigured deployment fails at startup.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

pub const BACKEND_URL_ENV: &str = "GAMEDASH_BACKEND_URL";
pub const BACKEND_KEY_ENV: &str = "GAMEDASH_BACKEND_KEY";
pub const REQUEST_TIMEOUT_ENV: &str = "GAMEDASH_REQUEST_TIMEOUT_MS";
pub const DASHBOARD_ADDR_ENV: &str = "GAMEDASH_DASHBOARD_ADDR";
pub const AUTO_REFRESH_ENV: &str = "GAMEDASH_AUTO_REFRESH";

const DEFAULT_DASHBOARD_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub access_key: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub auto_refresh: bool,
    pub backend: BackendConfig,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {0} must be set")]
    MissingVar(&'static str),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

pub fn backend_config_from_env() -> Result<BackendConfig, ConfigError> {
    backend_config_from_lookup(env_lookup)
}

pub fn server_config_from_env() -> Result<ServerConfig, ConfigError> {
    server_config_from_lookup(env_lookup)
}

pub fn backend_config_from_lookup<F>(lookup: F) -> Result<BackendConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw_url = required(&lookup, BACKEND_URL_ENV)?;
    let access_key = required(&lookup, BACKEND_KEY_ENV)?;

    if !(raw_url.starts_with("http://") || raw_url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key: BACKEND_URL_ENV,
            reason: "expected an http:// or https:// URL".to_string(),
        });
    }

    let request_timeout_ms = match optional(&lookup, REQUEST_TIMEOUT_ENV) {
        None => DEFAULT_REQUEST_TIMEOUT_MS,
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) | Err(_) => {
                return Err(ConfigError::InvalidValue {
                    key: REQUEST_TIMEOUT_ENV,
                    reason: format!("expected a positive number of milliseconds, got {raw:?}"),
                })
            }
            Ok(ms) => ms,
        },
    };

    Ok(BackendConfig {
        base_url: raw_url.trim_end_matches('/').to_string(),
        access_key,
        request_timeout_ms,
    })
}

pub fn server_config_from_lookup<F>(lookup: F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let backend = backend_config_from_lookup(&lookup)?;

    let raw_addr =
        optional(&lookup, DASHBOARD_ADDR_ENV).unwrap_or_else(|| DEFAULT_DASHBOARD_ADDR.to_string());
    let bind_addr = raw_addr
        .parse::<SocketAddr>()
        .map_err(|err| ConfigError::InvalidValue {
            key: DASHBOARD_ADDR_ENV,
            reason: err.to_string(),
        })?;

    let auto_refresh = match optional(&lookup, AUTO_REFRESH_ENV) {
        None => true,
        Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
            key: AUTO_REFRESH_ENV,
            reason: format!("expected a boolean, got {raw:?}"),
        })?,
    };

    Ok(ServerConfig {
        bind_addr,
        auto_refresh,
        backend,
    })
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or(ConfigError::MissingVar(key))
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
