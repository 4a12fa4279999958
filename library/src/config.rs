use std::env;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sensors.db";
pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_POOL_SIZE: u32 = 4;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub server_address: String,
    /// Pooled connections, also the number of storage actors
    pub pool_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            server_address: DEFAULT_SERVER_ADDRESS.to_owned(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl Config {
    /// Load `.env` if present, then read settings from the process environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenvy::dotenv().ok();
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let pool_size = match lookup("DATABASE_POOL_SIZE") {
            Some(raw) => parse_pool_size(&raw)?,
            None => defaults.pool_size,
        };
        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            server_address: lookup("SERVER_ADDRESS").unwrap_or(defaults.server_address),
            pool_size,
        })
    }
}

fn parse_pool_size(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: "DATABASE_POOL_SIZE",
        value: raw.to_owned(),
        reason,
    };
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(invalid("must be at least 1".to_owned())),
        Ok(size) => Ok(size),
        Err(err) => Err(invalid(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "/tmp/readings.db"),
            ("SERVER_ADDRESS", "127.0.0.1:5000"),
            ("DATABASE_POOL_SIZE", "2"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "/tmp/readings.db");
        assert_eq!(config.server_address, "127.0.0.1:5000");
        assert_eq!(config.pool_size, 2);
    }

    #[test]
    fn rejects_bad_pool_size() {
        assert!(Config::from_lookup(lookup_from(&[("DATABASE_POOL_SIZE", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DATABASE_POOL_SIZE", "many")])).is_err());
    }
}
