pub mod client;
pub mod endpoints;
pub mod models;

use crate::champion::RosterSnapshot;
use crate::error::AppError;

/// Anything that can produce the roster for the latest patch.
///
/// Implementations must be idempotent and free of side effects beyond the
/// fetch itself. Failures are reported as [`AppError::SourceUnavailable`].
pub trait RosterSource: Send + Sync {
    /// `previous_version` is the version currently cached, if any.
    fn fetch(&self, previous_version: Option<&str>) -> Result<RosterSnapshot, AppError>;
}
