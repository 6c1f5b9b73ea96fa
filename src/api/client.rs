use crate::champion::RosterSnapshot;
use crate::config::Config;
use crate::error::AppError;
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;

use super::endpoints::{champion_data_url, versions_url};
use super::models::DataDragonChampions;
use super::RosterSource;

const USER_AGENT: &str = concat!("counterpick/", env!("CARGO_PKG_VERSION"));
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 2000;

/// Roster source backed by Riot's Data Dragon CDN.
pub struct DataDragonClient {
    config: Config,
    agent: ureq::Agent,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    clock: DefaultClock,
}

impl DataDragonClient {
    pub fn new(config: Config) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));
        let agent = ureq::AgentBuilder::new()
            .timeout(config.fetch_timeout)
            .user_agent(USER_AGENT)
            .build();

        DataDragonClient {
            config,
            agent,
            rate_limiter,
            clock: DefaultClock::default(),
        }
    }

    fn wait_for_quota(&self) {
        while let Err(not_until) = self.rate_limiter.check() {
            thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }

    fn execute_request(&self, url: &str) -> Result<String, AppError> {
        let mut retry_count = 0;

        loop {
            self.wait_for_quota();

            match self.agent.get(url).call() {
                Ok(resp) => {
                    return resp
                        .into_string()
                        .map_err(|e| AppError::HttpError(e.to_string()));
                }
                Err(ureq::Error::Status(429, _)) => {
                    if retry_count >= MAX_RETRIES {
                        return Err(AppError::RateLimited);
                    }
                    let wait_ms = RETRY_BASE_DELAY_MS * u64::from(retry_count + 1);
                    tracing::warn!(url = %url, wait_ms, "Rate limited by Data Dragon, retrying");
                    thread::sleep(Duration::from_millis(wait_ms));
                    retry_count += 1;
                }
                Err(ureq::Error::Status(code, _)) => {
                    return Err(AppError::HttpError(format!("{} returned status {}", url, code)));
                }
                Err(e) => {
                    return Err(AppError::HttpError(e.to_string()));
                }
            }
        }
    }

    /// All published patch versions, newest first.
    pub fn get_versions(&self) -> Result<Vec<String>, AppError> {
        let body = self.execute_request(&versions_url(&self.config.base_url))?;
        serde_json::from_str(&body).map_err(|e| AppError::JsonError(e.to_string()))
    }

    pub fn get_latest_version(&self) -> Result<String, AppError> {
        self.get_versions()?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::JsonError("Data Dragon returned no versions".to_string()))
    }

    pub fn get_champion_data(&self, version: &str) -> Result<DataDragonChampions, AppError> {
        let url = champion_data_url(&self.config.base_url, version, &self.config.locale);
        let body = self.execute_request(&url)?;
        serde_json::from_str(&body).map_err(|e| AppError::JsonError(e.to_string()))
    }

    /// Latest version plus its full roster.
    pub fn fetch_roster(&self, previous_version: Option<&str>) -> Result<RosterSnapshot, AppError> {
        let version = self.get_latest_version()?;
        if previous_version == Some(version.as_str()) {
            tracing::debug!(version = %version, "Patch unchanged since last fetch");
        }

        let payload = self.get_champion_data(&version)?;
        let fetched = payload.data.len();
        let champions: Vec<_> = payload
            .data
            .into_values()
            .filter_map(|dto| dto.into_record(&self.config.base_url, &version))
            .collect();

        tracing::debug!(
            version = %version,
            fetched,
            kept = champions.len(),
            "Decoded champion roster"
        );

        RosterSnapshot::new(version, champions)
    }
}

impl RosterSource for DataDragonClient {
    fn fetch(&self, previous_version: Option<&str>) -> Result<RosterSnapshot, AppError> {
        self.fetch_roster(previous_version)
            .map_err(AppError::into_source_unavailable)
    }
}
