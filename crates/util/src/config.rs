use std::{env, net::SocketAddr};

use thiserror::Error;
use url::Url;

use super::{database_url, server_bind_address};

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Location and credentials of the outbound mail relay.
#[derive(Debug, Clone)]
pub struct MailRelayConfig {
    pub base_url: Url,
    pub token: Option<String>,
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub database_url: String,
    /// `None` when `MAIL_RELAY_URL` is unset; mail is then only logged.
    pub mail_relay: Option<MailRelayConfig>,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;
        let mail_relay = mail_relay_from_env()?;

        Ok(Self {
            bind_addr,
            environment,
            database_url: database_url(),
            mail_relay,
        })
    }
}

fn mail_relay_from_env() -> Result<Option<MailRelayConfig>, ConfigError> {
    let Some(raw) = non_empty_var("MAIL_RELAY_URL") else {
        return Ok(None);
    };

    // Url::join drops the last path segment unless the base ends with a slash.
    let normalized = if raw.ends_with('/') {
        raw
    } else {
        format!("{raw}/")
    };
    let base_url = Url::parse(&normalized).map_err(ConfigError::MailRelayUrl)?;

    Ok(Some(MailRelayConfig {
        base_url,
        token: non_empty_var("MAIL_RELAY_TOKEN"),
    }))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("APP_ENV must be one of 'development', 'production', or 'test' (got {0})")]
    InvalidEnvironment(String),
    #[error("invalid APP_BIND_ADDR value: {0}")]
    BindAddress(#[source] std::net::AddrParseError),
    #[error("invalid MAIL_RELAY_URL value: {0}")]
    MailRelayUrl(#[source] url::ParseError),
}
