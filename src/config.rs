use chrono::NaiveDate;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid date (expected YYYY-MM-DD): {value}")]
    InvalidDate { name: &'static str, value: String },

    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub npm_api_url: String,
    pub npms_api_url: String,
    pub site_url: String,
    /// First day requested from the downloads API.
    pub history_start: NaiveDate,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            npm_api_url: "https://api.npmjs.org".to_string(),
            npms_api_url: "https://api.npms.io".to_string(),
            site_url: "https://npminsights.com".to_string(),
            history_start: NaiveDate::from_ymd_opt(2015, 1, 10).unwrap_or_default(),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT").and_then(|value| value.parse::<u16>().ok()) {
            config.port = port;
        }
        if let Some(url) = lookup("NPM_API_URL") {
            config.npm_api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("NPMS_API_URL") {
            config.npms_api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("SITE_URL") {
            config.site_url = url.trim_end_matches('/').to_string();
        }
        if let Some(value) = lookup("NPM_HISTORY_START") {
            config.history_start = NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidDate {
                    name: "NPM_HISTORY_START",
                    value,
                }
            })?;
        }
        if let Some(value) = lookup("NPM_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = value.parse::<u64>().map_err(|_| {
                ConfigError::InvalidNumber {
                    name: "NPM_REQUEST_TIMEOUT_SECS",
                    value,
                }
            })?;
        }

        Ok(config)
    }
}
