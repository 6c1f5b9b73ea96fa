use crate::api::endpoints::{DATA_DRAGON_BASE_URL, DEFAULT_LOCALE};
use crate::cache::CachePolicy;
use crate::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUESTS_PER_SECOND: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub locale: String,
    pub fetch_timeout: Duration,
    /// Re-check the CDN for a newer patch once the roster is this old.
    pub max_age: Option<chrono::Duration>,
    pub requests_per_second: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DATA_DRAGON_BASE_URL.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_age: None,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for
    /// missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let base_url = lookup("DDRAGON_BASE_URL").unwrap_or(defaults.base_url);
        let locale = lookup("DDRAGON_LOCALE").unwrap_or(defaults.locale);

        let fetch_timeout = match lookup("ROSTER_FETCH_TIMEOUT_SECS") {
            Some(raw) => fetch_timeout_from_secs(parse_number("ROSTER_FETCH_TIMEOUT_SECS", &raw)?)?,
            None => defaults.fetch_timeout,
        };

        let max_age = match lookup("ROSTER_MAX_AGE_MINS") {
            Some(raw) => {
                let minutes: u32 = parse_number("ROSTER_MAX_AGE_MINS", &raw)?;
                Some(chrono::Duration::minutes(i64::from(minutes)))
            }
            None => None,
        };

        let requests_per_second = match lookup("DDRAGON_REQUESTS_PER_SECOND") {
            Some(raw) => parse_number("DDRAGON_REQUESTS_PER_SECOND", &raw)?,
            None => defaults.requests_per_second,
        };
        if requests_per_second == 0 {
            return Err(AppError::ConfigError(
                "DDRAGON_REQUESTS_PER_SECOND must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            base_url,
            locale,
            fetch_timeout,
            max_age,
            requests_per_second,
        })
    }

    /// Overrides the fetch timeout, rejecting zero like the env variable does.
    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Result<Self, AppError> {
        self.fetch_timeout = fetch_timeout_from_secs(secs)?;
        Ok(self)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            fetch_timeout: Some(self.fetch_timeout),
            max_age: self.max_age,
        }
    }
}

fn fetch_timeout_from_secs(secs: u64) -> Result<Duration, AppError> {
    if secs == 0 {
        return Err(AppError::ConfigError(
            "roster fetch timeout must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!("{} must be a non-negative integer, got '{}'", key, raw))
    })
}
