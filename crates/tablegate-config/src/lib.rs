//! Configuration loading for the tablegate server.
//!
//! Settings come from a TOML file layered with `TABLEGATE__`-prefixed
//! environment variables (`TABLEGATE__SERVER__PORT=9090` overrides
//! `[server] port`). The crate also owns the secret cipher used to encrypt
//! connection passwords and client secrets at rest.

pub mod secrets;

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

pub use secrets::SecretCipher;

/// Errors raised while loading configuration or handling secrets.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Encryption error: {0}")]
    Encryption(String),
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn encryption(message: impl Into<String>) -> Self {
        Self::Encryption(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.security.cipher_secret.is_empty() {
            return Err("security.cipher_secret must not be empty".into());
        }
        if self.security.jwt_secret.len() < 32 {
            return Err("security.jwt_secret must be at least 32 bytes".into());
        }
        if self.security.token_ttl_secs == 0 {
            return Err("security.token_ttl_secs must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Base URL used as the token issuer and in links.
    /// If not configured, computed from host:port.
    pub fn base_url(&self) -> String {
        self.server
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server.host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Passphrase the secret cipher key is derived from.
    #[serde(default = "default_cipher_secret")]
    pub cipher_secret: String,
    /// HMAC secret for signing bearer tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Bearer token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Scope string stamped into every issued token.
    #[serde(default = "default_scope")]
    pub default_scope: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cipher_secret: default_cipher_secret(),
            jwt_secret: default_jwt_secret(),
            token_ttl_secs: default_token_ttl(),
            default_scope: default_scope(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}
fn default_cipher_secret() -> String {
    "change-me-cipher-secret".into()
}
fn default_jwt_secret() -> String {
    "change-me-jwt-secret-at-least-32-bytes!".into()
}
fn default_token_ttl() -> u64 {
    3600
}
fn default_scope() -> String {
    "api:read api:write".into()
}
fn default_log_level() -> String {
    "info".into()
}

/// Load configuration from an optional TOML file plus environment overrides.
///
/// A missing file at the default path is not an error; an explicitly named
/// file that fails to parse is.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path).required(false));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("TABLEGATE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    cfg.validate().map_err(ConfigError::validation)?;
    Ok(cfg)
}
