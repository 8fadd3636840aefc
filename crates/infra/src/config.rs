//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use catalog_events::DEFAULT_EXCHANGE;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_BROKER_PORT: u16 = 6379;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub hostname: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl BrokerConfig {
    /// `redis://[user[:password]@]host:port`, credentials percent-encoded.
    pub fn redis_url(&self) -> String {
        let user = self.username.as_deref().map(urlencoding::encode);
        let password = self.password.as_deref().map(urlencoding::encode);
        let auth = match (user, password) {
            (Some(user), Some(password)) => format!("{user}:{password}@"),
            (Some(user), None) => format!("{user}@"),
            (None, Some(password)) => format!(":{password}@"),
            (None, None) => String::new(),
        };
        format!("redis://{}{}:{}", auth, self.hostname, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Postgres storage when set, in-memory otherwise.
    pub database_url: Option<String>,
    /// Redis-backed broker when set, in-memory otherwise.
    pub broker: Option<BrokerConfig>,
    pub exchange: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let broker = match get("BROKER_HOSTNAME") {
            Some(hostname) => {
                let port = match get("BROKER_PORT") {
                    Some(port) => port.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        key: "BROKER_PORT",
                        reason: e.to_string(),
                    })?,
                    None => DEFAULT_BROKER_PORT,
                };
                Some(BrokerConfig {
                    hostname,
                    port,
                    username: get("BROKER_USERNAME"),
                    password: get("BROKER_PASSWORD"),
                })
            }
            None => None,
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            broker,
            exchange: get("PRODUCTS_EXCHANGE").unwrap_or_else(|| DEFAULT_EXCHANGE.to_string()),
        })
    }
}
