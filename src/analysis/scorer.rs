use super::tables::{countered_by, role_preferred_tags};
use crate::champion::{Archetype, ChampionRecord, Role};

/// Attack range at or below which a champion counts as melee.
pub const MELEE_MAX_RANGE: f64 = 200.0;
/// Attack range at or above which an enemy counts as ranged.
pub const RANGED_ENEMY_MIN_RANGE: f64 = 475.0;
/// Attack range at or above which a candidate counts as ranged. Lower than the
/// enemy threshold, so more picks qualify as ranged answers to melee lanes.
pub const RANGED_CANDIDATE_MIN_RANGE: f64 = 450.0;

const CLASS_MATCH_WEIGHT: f64 = 1.2;
const RANGE_BONUS: f64 = 0.8;
const DIVE_BONUS: f64 = 0.6;
const EASY_BONUS: f64 = 0.5;
const HARD_PENALTY: f64 = 0.3;
const VERSATILITY_BONUS: f64 = 0.2;

const EASY_MAX_DIFFICULTY: u8 = 4;
const HARD_MIN_DIFFICULTY: u8 = 8;

/// The parts that add up to a counter score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    /// Candidate tags found in the desired counter set.
    pub class_matches: usize,
    pub class: f64,
    pub range: f64,
    pub dive: f64,
    pub accessibility: f64,
    pub versatility: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.class + self.range + self.dive + self.accessibility + self.versatility
    }
}

pub struct CounterScorer;

impl CounterScorer {
    /// Scores `candidate` as a pick into `enemy` for `role`.
    ///
    /// `None` means the candidate must never be ranked: it is the enemy itself
    /// or it does not fit the lane. `Some` is always finite and may be negative.
    pub fn score(enemy: &ChampionRecord, candidate: &ChampionRecord, role: Role) -> Option<f64> {
        Self::explain(enemy, candidate, role).map(|breakdown| breakdown.total())
    }

    /// Same as [`CounterScorer::score`] but keeps the individual components.
    pub fn explain(
        enemy: &ChampionRecord,
        candidate: &ChampionRecord,
        role: Role,
    ) -> Option<ScoreBreakdown> {
        if candidate.id == enemy.id {
            return None;
        }
        if !Self::fits_role(candidate, role) {
            return None;
        }

        let desired = Self::desired_counter_tags(enemy, role);
        let class_matches = candidate
            .archetype_tags
            .iter()
            .filter(|tag| desired.contains(tag))
            .count();

        let mut breakdown = ScoreBreakdown {
            class_matches,
            class: class_matches as f64 * CLASS_MATCH_WEIGHT,
            ..ScoreBreakdown::default()
        };

        let enemy_range = enemy.attack_range();
        let candidate_range = candidate.attack_range();

        let enemy_is_melee = enemy_range <= MELEE_MAX_RANGE;
        let enemy_is_ranged = enemy_range >= RANGED_ENEMY_MIN_RANGE;
        let candidate_is_melee = candidate_range <= MELEE_MAX_RANGE;
        let candidate_is_ranged = candidate_range >= RANGED_CANDIDATE_MIN_RANGE;

        if enemy_is_melee && candidate_is_ranged {
            breakdown.range = RANGE_BONUS;
        }

        let candidate_dives =
            candidate.has_tag(Archetype::Assassin) || candidate.has_tag(Archetype::Fighter);
        if enemy_is_ranged && candidate_is_melee && candidate_dives {
            breakdown.dive = DIVE_BONUS;
        }

        if candidate.difficulty <= EASY_MAX_DIFFICULTY {
            breakdown.accessibility = EASY_BONUS;
        } else if candidate.difficulty >= HARD_MIN_DIFFICULTY {
            breakdown.accessibility = -HARD_PENALTY;
        }

        if candidate.archetype_tags.len() > 1 {
            breakdown.versatility = VERSATILITY_BONUS;
        }

        Some(breakdown)
    }

    /// Whether `champion` carries at least one tag viable in `role`.
    pub fn fits_role(champion: &ChampionRecord, role: Role) -> bool {
        let preferred = role_preferred_tags(role);
        champion.archetype_tags.iter().any(|tag| preferred.contains(tag))
    }

    /// Union of the counters for each enemy tag, in first-seen order. Falls back
    /// to the role's own tags when no rule matches.
    pub fn desired_counter_tags(enemy: &ChampionRecord, role: Role) -> Vec<Archetype> {
        let mut desired: Vec<Archetype> = Vec::new();
        for tag in &enemy.archetype_tags {
            for counter in countered_by(*tag) {
                if !desired.contains(counter) {
                    desired.push(*counter);
                }
            }
        }

        if desired.is_empty() {
            desired.extend_from_slice(role_preferred_tags(role));
        }

        desired
    }
}
