use thiserror::Error;

/// Every failure the engine reports. Payloads are plain strings so a single
/// fetch outcome can be cloned out to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Champion data unavailable: {0}")]
    SourceUnavailable(String),

    #[error("No champion matches \"{0}\"")]
    NoSuchChampion(String),

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    #[error("Rate limit exceeded, please try again later")]
    RateLimited,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl AppError {
    /// Folds transport and decoding failures into `SourceUnavailable`, which is
    /// the only failure a roster source reports to the cache.
    pub fn into_source_unavailable(self) -> Self {
        match self {
            AppError::SourceUnavailable(_) => self,
            other => AppError::SourceUnavailable(other.to_string()),
        }
    }
}
