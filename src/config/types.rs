//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use super::defaults::{default_events, default_server_name};
use crate::schema::{CommandSchema, SchemaFileError};

/// Environment variable that overrides `auth.token`.
pub const AUTH_ENV_VAR: &str = "ENDPOINT_AUTH";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server identity.
    #[serde(default)]
    pub server: ServerConfig,
    /// HTTP listen configuration.
    pub listen: ListenConfig,
    /// Shared-secret authorization.
    pub auth: AuthConfig,
    /// Command schema source.
    #[serde(default)]
    pub schema: SchemaConfig,
    /// Known gateway event names.
    #[serde(default)]
    pub events: EventsConfig,
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_auth_override(std::env::var(AUTH_ENV_VAR).ok());
        Ok(config)
    }

    /// Replace the configured token when an override is present and non-empty.
    pub fn apply_auth_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.auth.token = token;
        }
    }

    /// Load the command schema from `schema.path`, or the built-in table.
    pub fn load_schema(&self) -> Result<CommandSchema, SchemaFileError> {
        match self.schema.path {
            Some(ref path) => CommandSchema::load(path),
            None => Ok(crate::schema::builtin()?),
        }
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name reported in logs.
    #[serde(default = "default_server_name")]
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind (e.g., "0.0.0.0:2000").
    pub address: SocketAddr,
}

/// Shared-secret authorization configuration.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Value the `Authorization` header must equal.
    pub token: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Command schema source.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SchemaConfig {
    /// Path to a TOML schema file. The built-in schema is used when unset.
    pub path: Option<String>,
}

/// Gateway event catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Event names accepted by `POST /events`.
    #[serde(default = "default_events")]
    pub known: Vec<String>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            known: default_events(),
        }
    }
}
