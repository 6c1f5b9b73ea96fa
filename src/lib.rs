//! Counter-pick recommendations for League of Legends drafts.
//!
//! [`cache::RosterCache`] holds the current patch's champion roster and makes
//! sure concurrent first reads share one fetch. [`analysis::scorer`] rates a
//! candidate against an enemy for a lane, and
//! [`analysis::recommender::RecommendationService`] ties the two together.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod champion;
pub mod config;
pub mod error;

pub use analysis::recommender::{CounterPick, Recommendation, RecommendationService};
pub use analysis::scorer::CounterScorer;
pub use api::client::DataDragonClient;
pub use api::RosterSource;
pub use cache::{CachePolicy, RosterCache, RosterRead, StaleWarning};
pub use champion::{Archetype, ChampionRecord, CombatStats, Role, RosterSnapshot};
pub use config::Config;
pub use error::AppError;
