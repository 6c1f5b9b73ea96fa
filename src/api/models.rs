use crate::champion::{Archetype, ChampionRecord, CombatStats};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::endpoints::champion_icon_url;

// Data Dragon champion.json response. Keys are champion ids; a BTreeMap keeps
// them in the CDN's alphabetical order.
#[derive(Debug, Deserialize)]
pub struct DataDragonChampions {
    pub data: BTreeMap<String, ChampionDto>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChampionDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub info: ChampionInfoDto,
    pub stats: ChampionStatsDto,
    pub image: ImageDto,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChampionInfoDto {
    #[serde(default)]
    pub difficulty: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChampionStatsDto {
    #[serde(default)]
    pub hp: f64,
    #[serde(default)]
    pub movespeed: f64,
    #[serde(default)]
    pub attackdamage: f64,
    #[serde(default)]
    pub attackspeed: f64,
    #[serde(default)]
    pub attackrange: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageDto {
    pub full: String,
}

impl ChampionDto {
    /// Converts to the engine's record. Unknown tags are dropped; a champion
    /// left with no known tag yields `None`.
    pub fn into_record(self, base_url: &str, version: &str) -> Option<ChampionRecord> {
        let mut archetype_tags: Vec<Archetype> = Vec::with_capacity(self.tags.len());
        for raw in &self.tags {
            match raw.parse::<Archetype>() {
                // Tags form a set: a repeated tag does not count towards the
                // multi-tag versatility bonus.
                Ok(tag) if !archetype_tags.contains(&tag) => archetype_tags.push(tag),
                Ok(_) => {}
                Err(_) => {
                    tracing::warn!(champion = %self.id, tag = %raw, "Dropping unknown archetype tag");
                }
            }
        }

        if archetype_tags.is_empty() {
            tracing::warn!(champion = %self.id, "Skipping champion without a known archetype tag");
            return None;
        }

        Some(ChampionRecord {
            icon_url: champion_icon_url(base_url, version, &self.image.full),
            id: self.id,
            display_name: self.name,
            title: self.title,
            archetype_tags,
            difficulty: self.info.difficulty.clamp(1, 10),
            combat_stats: CombatStats {
                hp: self.stats.hp.max(0.0),
                move_speed: self.stats.movespeed.max(0.0),
                attack_damage: self.stats.attackdamage.max(0.0),
                attack_speed: self.stats.attackspeed.max(0.0),
                attack_range: self.stats.attackrange.max(0.0),
            },
        })
    }
}
