//! Process configuration read from environment variables.
//!
//! | variable                   | default          |
//! |----------------------------|------------------|
//! | `BIND_ADDR`                | `0.0.0.0:8080`   |
//! | `USE_PERSISTENT_STORES`    | `false`          |
//! | `DATABASE_URL`             | required if persistent |
//! | `DATABASE_MAX_CONNECTIONS` | `5`              |
//! | `INVENTORY_ADJUST_POLICY`  | `last-write-wins`|
//! | `LOG_FORMAT`               | `json`           |

use std::net::SocketAddr;

use thiserror::Error;

use wms_observability::LogFormat;

use crate::adjuster::AdjustPolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not valid: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("{var} must be set when USE_PERSISTENT_STORES is enabled")]
    Missing { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` means in-memory stores.
    pub database: Option<DatabaseConfig>,
    pub adjust_policy: AdjustPolicy,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| invalid("BIND_ADDR", e))?;

        let persistent = match get("USE_PERSISTENT_STORES") {
            None => false,
            Some(v) => parse_flag(&v).ok_or_else(|| ConfigError::Invalid {
                var: "USE_PERSISTENT_STORES",
                message: format!("expected a boolean, got '{v}'"),
            })?,
        };

        let database = if persistent {
            let url = get("DATABASE_URL").ok_or(ConfigError::Missing { var: "DATABASE_URL" })?;
            let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
                None => DEFAULT_MAX_CONNECTIONS,
                Some(v) => v
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        message: format!("expected a positive integer, got '{v}'"),
                    })?,
            };
            Some(DatabaseConfig { url, max_connections })
        } else {
            None
        };

        let adjust_policy = match get("INVENTORY_ADJUST_POLICY") {
            None => AdjustPolicy::default(),
            Some(v) => v.parse().map_err(|e| invalid("INVENTORY_ADJUST_POLICY", e))?,
        };

        let log_format = match get("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(v) => v.parse().map_err(|e| invalid("LOG_FORMAT", e))?,
        };

        Ok(Self {
            bind_addr,
            database,
            adjust_policy,
            log_format,
        })
    }

    pub fn use_persistent_stores(&self) -> bool {
        self.database.is_some()
    }
}

fn invalid(var: &'static str, err: impl core::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        message: err.to_string(),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
