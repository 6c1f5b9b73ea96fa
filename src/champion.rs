use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Coarse class label Riot attaches to every champion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Fighter,
    Tank,
    Mage,
    Assassin,
    Marksman,
    Support,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::Fighter,
        Archetype::Tank,
        Archetype::Mage,
        Archetype::Assassin,
        Archetype::Marksman,
        Archetype::Support,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Fighter => "Fighter",
            Archetype::Tank => "Tank",
            Archetype::Mage => "Mage",
            Archetype::Assassin => "Assassin",
            Archetype::Marksman => "Marksman",
            Archetype::Support => "Support",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Archetype::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown archetype tag: {}", s))
    }
}

/// Lane a player is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Adc,
    Support,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Top, Role::Jungle, Role::Mid, Role::Adc, Role::Support];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Top => "Top",
            Role::Jungle => "Jungle",
            Role::Mid => "Mid",
            Role::Adc => "ADC",
            Role::Support => "Support",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Role::Top),
            "jungle" | "jg" | "jungler" => Ok(Role::Jungle),
            "mid" | "middle" => Ok(Role::Mid),
            "adc" | "bot" | "bottom" | "marksman" => Ok(Role::Adc),
            "support" | "sup" | "supp" | "utility" => Ok(Role::Support),
            other => Err(format!(
                "unknown role '{}' (expected top, jungle, mid, adc or support)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatStats {
    pub hp: f64,
    pub move_speed: f64,
    pub attack_damage: f64,
    pub attack_speed: f64,
    pub attack_range: f64,
}

/// One playable champion as of a given patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionRecord {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub title: String,
    /// Primary archetype first.
    pub archetype_tags: Vec<Archetype>,
    pub difficulty: u8,
    pub combat_stats: CombatStats,
    pub icon_url: String,
}

impl ChampionRecord {
    pub fn has_tag(&self, tag: Archetype) -> bool {
        self.archetype_tags.contains(&tag)
    }

    pub fn attack_range(&self) -> f64 {
        self.combat_stats.attack_range
    }

    pub fn tag_list(&self) -> String {
        self.archetype_tags
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The full roster for one patch. Never mutated after construction; a new
/// patch produces a new snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSnapshot {
    version: String,
    champions: Vec<ChampionRecord>,
}

impl RosterSnapshot {
    /// Builds a snapshot, rejecting duplicate ids and champions without tags.
    pub fn new(version: impl Into<String>, champions: Vec<ChampionRecord>) -> Result<Self, AppError> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(AppError::InvalidRoster("empty patch version".to_string()));
        }

        let mut seen = HashSet::with_capacity(champions.len());
        for champion in &champions {
            if champion.archetype_tags.is_empty() {
                return Err(AppError::InvalidRoster(format!(
                    "champion '{}' has no archetype tags",
                    champion.id
                )));
            }
            if !seen.insert(champion.id.as_str()) {
                return Err(AppError::InvalidRoster(format!(
                    "duplicate champion id '{}'",
                    champion.id
                )));
            }
        }

        Ok(RosterSnapshot { version, champions })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn champions(&self) -> &[ChampionRecord] {
        &self.champions
    }

    pub fn len(&self) -> usize {
        self.champions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.champions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ChampionRecord> {
        self.champions.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
pub(crate) fn test_champion(
    id: &str,
    tags: &[Archetype],
    attack_range: f64,
    difficulty: u8,
) -> ChampionRecord {
    ChampionRecord {
        id: id.to_string(),
        display_name: id.to_string(),
        title: String::new(),
        archetype_tags: tags.to_vec(),
        difficulty,
        combat_stats: CombatStats {
            attack_range,
            ..CombatStats::default()
        },
        icon_url: format!("{}.png", id),
    }
}
