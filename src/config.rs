// Console configuration
// Read from the process environment, with .env support, and converted into client settings.

use chrono::NaiveTime;
use std::env;
use std::time::Duration;

use crate::api::{ClientConfig, RetryConfig};
use crate::stay::default_checkout_time;

#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub api_timeout_ms: u64,
    pub max_retries: u32,
    pub checkout_time: NaiveTime,
    pub discount_ttl: Duration,
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            api_timeout_ms: 10_000,
            max_retries: 0,
            checkout_time: default_checkout_time(),
            discount_ttl: Duration::from_secs(300),
            log_level: "info".to_string(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Separated from from_env so tests do not have to touch the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("FRONTDESK_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("FRONTDESK_API_BASE_URL"))?;

        let api_timeout_ms = parse_or(&lookup, "FRONTDESK_API_TIMEOUT_MS", defaults.api_timeout_ms)?;

        let max_retries = parse_or(&lookup, "FRONTDESK_MAX_RETRIES", defaults.max_retries)?;

        let checkout_time = match lookup("FRONTDESK_CHECKOUT_TIME") {
            Some(value) => NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
                ConfigError::Invalid {
                    var: "FRONTDESK_CHECKOUT_TIME",
                    value,
                }
            })?,
            None => defaults.checkout_time,
        };

        let discount_ttl = Duration::from_secs(parse_or(
            &lookup,
            "FRONTDESK_DISCOUNT_TTL_SECS",
            defaults.discount_ttl.as_secs(),
        )?);

        let log_level = lookup("FRONTDESK_LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(ConsoleConfig {
            api_base_url,
            api_timeout_ms,
            max_retries,
            checkout_time,
            discount_ttl,
            log_level,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            timeout_ms: self.api_timeout_ms,
            retry_config: RetryConfig {
                max_retries: self.max_retries,
                ..RetryConfig::default()
            },
        }
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
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
    fn test_defaults_apply_when_only_base_url_is_set() {
        let config =
            ConsoleConfig::from_lookup(lookup_from(&[("FRONTDESK_API_BASE_URL", "http://api")]))
                .unwrap();
        assert_eq!(config.api_base_url, "http://api");
        assert_eq!(config.api_timeout_ms, 10_000);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.checkout_time, default_checkout_time());
        assert_eq!(config.discount_ttl, Duration::from_secs(300));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_base_url() {
        let result = ConsoleConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(
            result,
            Err(ConfigError::Missing("FRONTDESK_API_BASE_URL"))
        ));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = ConsoleConfig::from_lookup(lookup_from(&[
            ("FRONTDESK_API_BASE_URL", "http://api"),
            ("FRONTDESK_MAX_RETRIES", "3"),
            ("FRONTDESK_CHECKOUT_TIME", "11:00"),
        ]))
        .unwrap();
        assert_eq!(config.client_config().retry_config.max_retries, 3);
        assert_eq!(
            config.checkout_time,
            NaiveTime::from_hms_opt(11, 0, 0).unwrap()
        );

        let result = ConsoleConfig::from_lookup(lookup_from(&[
            ("FRONTDESK_API_BASE_URL", "http://api"),
            ("FRONTDESK_API_TIMEOUT_MS", "soon"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                var: "FRONTDESK_API_TIMEOUT_MS",
                ..
            })
        ));
    }
}
