use super::scorer::{CounterScorer, ScoreBreakdown};
use crate::cache::{RosterCache, RosterRead, StaleWarning};
use crate::champion::{Archetype, ChampionRecord, Role, RosterSnapshot};
use crate::error::AppError;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct CounterPick {
    pub champion: ChampionRecord,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Ranked counter picks against one enemy. An empty `picks` list is a valid
/// answer: the enemy resolved but nothing fit the role.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub enemy: ChampionRecord,
    pub role: Role,
    pub version: String,
    pub picks: Vec<CounterPick>,
    pub stale: Option<StaleWarning>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChampionLookup {
    pub champion: ChampionRecord,
    pub version: String,
    pub stale: Option<StaleWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub tags: Vec<Archetype>,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterListing {
    pub version: String,
    pub champions: Vec<RosterEntry>,
    pub stale: Option<StaleWarning>,
}

/// Finds the champion a free-text query refers to.
///
/// Case-insensitive: an exact display name wins, then an exact id, then the
/// first champion whose display name contains the query.
pub fn resolve_champion<'a>(
    snapshot: &'a RosterSnapshot,
    query: &str,
) -> Result<&'a ChampionRecord, AppError> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Err(AppError::NoSuchChampion(query.to_string()));
    }

    let champions = snapshot.champions();
    champions
        .iter()
        .find(|c| c.display_name.to_lowercase() == needle)
        .or_else(|| champions.iter().find(|c| c.id.to_lowercase() == needle))
        .or_else(|| {
            champions
                .iter()
                .find(|c| c.display_name.to_lowercase().contains(&needle))
        })
        .ok_or_else(|| AppError::NoSuchChampion(query.trim().to_string()))
}

/// Scores every champion in the roster against `enemy` and keeps the best
/// `top_k`. Equal scores keep roster order.
pub fn rank_counters(
    snapshot: &RosterSnapshot,
    enemy: &ChampionRecord,
    role: Role,
    top_k: usize,
) -> Vec<CounterPick> {
    let mut picks: Vec<CounterPick> = snapshot
        .champions()
        .iter()
        .filter_map(|candidate| {
            CounterScorer::explain(enemy, candidate, role).map(|breakdown| CounterPick {
                champion: candidate.clone(),
                score: breakdown.total(),
                breakdown,
            })
        })
        .collect();

    // sort_by is stable
    picks.sort_by(|a, b| b.score.total_cmp(&a.score));
    picks.truncate(top_k);

    picks
}

pub struct RecommendationService {
    cache: Arc<RosterCache>,
}

impl RecommendationService {
    pub fn new(cache: Arc<RosterCache>) -> Self {
        RecommendationService { cache }
    }

    /// Best `top_k` counters to `enemy_query` in `role`.
    pub fn recommend(
        &self,
        enemy_query: &str,
        role: Role,
        top_k: usize,
    ) -> Result<Recommendation, AppError> {
        let roster = self.cache.get_roster()?;
        let enemy = resolve_champion(&roster.snapshot, enemy_query)?;
        let picks = rank_counters(&roster.snapshot, enemy, role, top_k);

        tracing::debug!(
            enemy = %enemy.id,
            role = %role,
            picks = picks.len(),
            "Ranked counter picks"
        );

        Ok(Recommendation {
            enemy: enemy.clone(),
            role,
            version: roster.snapshot.version().to_string(),
            picks,
            stale: roster.stale,
        })
    }

    pub fn find_champion(&self, query: &str) -> Result<ChampionLookup, AppError> {
        let roster = self.cache.get_roster()?;
        let champion = resolve_champion(&roster.snapshot, query)?.clone();

        Ok(ChampionLookup {
            champion,
            version: roster.snapshot.version().to_string(),
            stale: roster.stale,
        })
    }

    /// Slim roster listing, optionally limited to champions that fit `role`.
    pub fn list_champions(&self, role: Option<Role>) -> Result<RosterListing, AppError> {
        let RosterRead {
            snapshot, stale, ..
        } = self.cache.get_roster()?;

        let champions = snapshot
            .champions()
            .iter()
            .filter(|c| role.map_or(true, |r| CounterScorer::fits_role(c, r)))
            .map(|c| RosterEntry {
                id: c.id.clone(),
                name: c.display_name.clone(),
                tags: c.archetype_tags.clone(),
                icon_url: c.icon_url.clone(),
            })
            .collect();

        Ok(RosterListing {
            version: snapshot.version().to_string(),
            champions,
            stale,
        })
    }
}
