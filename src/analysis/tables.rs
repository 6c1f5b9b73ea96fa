//! Static matchup knowledge. Neither table depends on the patch; changing
//! them is a code change.

use crate::champion::{Archetype, Role};

/// Archetypes that tend to beat `tag`.
pub fn countered_by(tag: Archetype) -> &'static [Archetype] {
    use Archetype::*;
    match tag {
        Assassin => &[Tank, Support],
        Fighter => &[Tank, Mage],
        Tank => &[Marksman, Fighter],
        Mage => &[Assassin, Fighter],
        Marksman => &[Tank, Assassin],
        Support => &[Mage, Tank, Support],
    }
}

/// Archetypes that are viable picks in `role`.
pub fn role_preferred_tags(role: Role) -> &'static [Archetype] {
    use Archetype::*;
    match role {
        Role::Top => &[Fighter, Tank],
        Role::Jungle => &[Fighter, Assassin, Tank],
        Role::Mid => &[Mage, Assassin],
        Role::Adc => &[Marksman],
        Role::Support => &[Support, Tank, Mage],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_archetype_has_counters() {
        for tag in Archetype::ALL {
            assert!(!countered_by(tag).is_empty(), "{} has no counters", tag);
        }
    }

    #[test]
    fn every_role_has_viable_tags() {
        for role in Role::ALL {
            assert!(!role_preferred_tags(role).is_empty(), "{} has no tags", role);
        }
    }

    #[test]
    fn support_counters_include_itself() {
        assert!(countered_by(Archetype::Support).contains(&Archetype::Support));
        assert_eq!(role_preferred_tags(Role::Adc), &[Archetype::Marksman]);
    }
}
