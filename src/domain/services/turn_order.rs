//! Turn order scheduling
//!
//! Lower initiative acts first. Equal initiatives are ordered characters,
//! then summons, then monsters, and finally by entity id so that the order is
//! total and identical across replays.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::{Character, Combatant, EntityType, Monster, Summon};
use crate::domain::value_objects::{EngineSettings, EntityId};

/// Initiative used when a monster type has no draw for the round
pub const FALLBACK_MONSTER_INITIATIVE: i32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOrderEntry {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub initiative: i32,
    pub name: String,
    pub is_dead: bool,
    pub is_exhausted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<EntityId>,
}

impl TurnOrderEntry {
    pub fn is_living(&self) -> bool {
        !self.is_dead && !self.is_exhausted
    }

    fn sort_key(&self) -> (i32, u8, EntityId) {
        (self.initiative, self.entity_type.initiative_rank(), self.entity_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextTurn {
    pub index: usize,
    pub round_complete: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnOrderError {
    #[error("Turn order has no living entities")]
    NoLivingEntities,
}

/// Initiative values that do not come from cards or monster draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiativeRules {
    pub ally_default: i32,
    pub long_rest: i32,
}

impl Default for InitiativeRules {
    fn default() -> Self {
        Self::from(&EngineSettings::default())
    }
}

impl From<&EngineSettings> for InitiativeRules {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            ally_default: settings.ally_default_initiative,
            long_rest: settings.long_rest_initiative,
        }
    }
}

/// Initiative a character acts at this round, if committed
pub fn character_initiative(character: &Character, rules: &InitiativeRules) -> Option<i32> {
    match (&character.selected_cards, &character.pending_long_rest) {
        (Some(selection), _) => Some(selection.initiative),
        (None, Some(_)) => Some(rules.long_rest),
        (None, None) => None,
    }
}

/// Build the ordered list of everyone acting this round
pub fn build_order(
    characters: &[Character],
    monsters: &[Monster],
    summons: &[Summon],
    monster_initiatives: &HashMap<String, i32>,
    rules: &InitiativeRules,
) -> Vec<TurnOrderEntry> {
    let mut order = Vec::with_capacity(characters.len() + monsters.len() + summons.len());

    for character in characters.iter().filter(|c| c.is_in_play()) {
        if let Some(initiative) = character_initiative(character, rules) {
            order.push(TurnOrderEntry {
                entity_id: character.id(),
                entity_type: EntityType::Character,
                initiative,
                name: character.core.name.clone(),
                is_dead: false,
                is_exhausted: false,
                owner_id: None,
            });
        }
    }

    for monster in monsters.iter().filter(|m| !m.core.is_dead) {
        let initiative = monster_initiatives
            .get(&monster.monster_type)
            .copied()
            .unwrap_or(FALLBACK_MONSTER_INITIATIVE);
        order.push(TurnOrderEntry {
            entity_id: monster.id(),
            entity_type: EntityType::Monster,
            initiative,
            name: monster.core.name.clone(),
            is_dead: false,
            is_exhausted: false,
            owner_id: None,
        });
    }

    for summon in summons.iter().filter(|s| !s.core.is_dead) {
        let owner_initiative = summon.owner_id.and_then(|owner| {
            characters
                .iter()
                .find(|c| c.id() == owner)
                .and_then(|c| character_initiative(c, rules))
        });
        order.push(TurnOrderEntry {
            entity_id: summon.id(),
            entity_type: EntityType::Summon,
            initiative: owner_initiative.unwrap_or(rules.ally_default),
            name: summon.core.name.clone(),
            is_dead: false,
            is_exhausted: false,
            owner_id: summon.owner_id,
        });
    }

    order.sort_by_key(|entry| entry.sort_key());
    order
}

pub fn first_living_index(order: &[TurnOrderEntry]) -> Option<usize> {
    order.iter().position(|entry| entry.is_living())
}

/// Find who acts after `current`.
///
/// Passing the end of the order completes the round; the returned index is
/// then the first living entry from the start.
pub fn next_living_index(current: usize, order: &[TurnOrderEntry]) -> Result<NextTurn, TurnOrderError> {
    let first = first_living_index(order).ok_or(TurnOrderError::NoLivingEntities)?;

    let next = order
        .iter()
        .enumerate()
        .skip(current + 1)
        .find(|(_, entry)| entry.is_living())
        .map(|(index, _)| index);

    Ok(match next {
        Some(index) => NextTurn {
            index,
            round_complete: false,
        },
        None => NextTurn {
            index: first,
            round_complete: true,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CardSelection, MonsterStats};
    use crate::domain::value_objects::AxialCoord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stats() -> MonsterStats {
        MonsterStats {
            health: 5,
            movement: 2,
            attack: 2,
            range: 1,
            shield: 0,
            retaliate: None,
            attack_modifiers: vec![],
            can_fly: false,
        }
    }

    fn committed(rng: &mut StdRng, name: &str, initiative: i32) -> Character {
        let mut c = Character::with_id(
            EntityId::from_rng(rng),
            "user",
            name,
            "brute",
            10,
            AxialCoord::new(0, 0),
        );
        c.selected_cards = Some(CardSelection {
            top_card_id: "a".into(),
            bottom_card_id: "b".into(),
            initiative,
        });
        c
    }

    fn entry(initiative: i32, living: bool) -> TurnOrderEntry {
        TurnOrderEntry {
            entity_id: EntityId::new(),
            entity_type: EntityType::Monster,
            initiative,
            name: "m".into(),
            is_dead: !living,
            is_exhausted: false,
            owner_id: None,
        }
    }

    #[test]
    fn test_order_is_ascending_by_initiative() {
        let mut rng = StdRng::seed_from_u64(9);
        let slow = committed(&mut rng, "Slow", 70);
        let quick = committed(&mut rng, "Quick", 30);
        let monster = Monster::with_id(
            EntityId::from_rng(&mut rng),
            "bandit-guard",
            false,
            AxialCoord::new(2, 0),
            stats(),
        );
        let initiatives = HashMap::from([("bandit-guard".to_string(), 10)]);

        let order = build_order(
            &[slow.clone(), quick.clone()],
            &[monster.clone()],
            &[],
            &initiatives,
            &InitiativeRules::default(),
        );

        let ids: Vec<EntityId> = order.iter().map(|e| e.entity_id).collect();
        assert_eq!(ids, vec![monster.id(), quick.id(), slow.id()]);
    }

    #[test]
    fn test_uncommitted_and_exhausted_characters_are_left_out() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut idle = committed(&mut rng, "Idle", 20);
        idle.selected_cards = None;
        let mut exhausted = committed(&mut rng, "Tired", 40);
        exhausted.is_exhausted = true;
        let mut resting = committed(&mut rng, "Resting", 40);
        resting.selected_cards = None;
        resting.pending_long_rest = Some("a".into());

        let order = build_order(
            &[idle, exhausted, resting.clone()],
            &[],
            &[],
            &HashMap::new(),
            &InitiativeRules::default(),
        );
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].entity_id, resting.id());
        assert_eq!(order[0].initiative, 99);
    }

    #[test]
    fn test_ties_break_by_type_then_id() {
        let mut rng = StdRng::seed_from_u64(4);
        let hero = committed(&mut rng, "Hero", 50);
        let ally = Summon::new(
            EntityId::from_rng(&mut rng),
            crate::domain::entities::SummonDefinition {
                name: "Wolf".into(),
                health: 4,
                movement: 3,
                attack: 2,
                range: 1,
                attack_modifiers: vec![],
                can_fly: false,
                player_controlled: false,
            },
            None,
            AxialCoord::new(1, 0),
        );
        let monster = Monster::with_id(
            EntityId::from_rng(&mut rng),
            "ooze",
            false,
            AxialCoord::new(2, 0),
            stats(),
        );
        let initiatives = HashMap::from([("ooze".to_string(), 50)]);

        let order = build_order(
            &[hero],
            &[monster],
            &[ally],
            &initiatives,
            &InitiativeRules::default(),
        );
        let types: Vec<EntityType> = order.iter().map(|e| e.entity_type).collect();
        assert_eq!(
            types,
            vec![EntityType::Character, EntityType::Summon, EntityType::Monster]
        );
    }

    #[test]
    fn test_owned_summon_uses_owner_initiative() {
        let mut rng = StdRng::seed_from_u64(8);
        let hero = committed(&mut rng, "Hero", 15);
        let summon = Summon::new(
            EntityId::from_rng(&mut rng),
            crate::domain::entities::SummonDefinition {
                name: "Bear".into(),
                health: 6,
                movement: 2,
                attack: 3,
                range: 1,
                attack_modifiers: vec![],
                can_fly: false,
                player_controlled: false,
            },
            Some(hero.id()),
            AxialCoord::new(1, 0),
        );
        let order = build_order(
            &[hero],
            &[],
            &[summon],
            &HashMap::new(),
            &InitiativeRules::default(),
        );
        assert!(order.iter().all(|e| e.initiative == 15));
    }

    #[test]
    fn test_next_living_index_visits_everyone_once() {
        for n in 1..6 {
            let order: Vec<TurnOrderEntry> = (0..n).map(|i| entry(i as i32, true)).collect();
            let mut visited = vec![0];
            let mut current = 0;
            loop {
                let next = next_living_index(current, &order).unwrap();
                if next.round_complete {
                    assert_eq!(next.index, 0);
                    break;
                }
                visited.push(next.index);
                current = next.index;
            }
            assert_eq!(visited, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_next_living_index_skips_dead_entries() {
        let order = vec![entry(1, true), entry(2, false), entry(3, true)];
        let next = next_living_index(0, &order).unwrap();
        assert_eq!(next, NextTurn { index: 2, round_complete: false });
        let next = next_living_index(2, &order).unwrap();
        assert!(next.round_complete);
    }

    #[test]
    fn test_single_survivor_completes_round() {
        let order = vec![entry(1, false), entry(2, true)];
        assert_eq!(first_living_index(&order), Some(1));
        let next = next_living_index(1, &order).unwrap();
        assert_eq!(next, NextTurn { index: 1, round_complete: true });
    }

    #[test]
    fn test_no_living_entities_is_an_error() {
        let order = vec![entry(1, false)];
        assert_eq!(
            next_living_index(0, &order),
            Err(TurnOrderError::NoLivingEntities)
        );
    }
}
