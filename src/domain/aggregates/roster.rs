//! Every figure in a room

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::entities::{Character, Combatant, CombatantCore, EntityType, Monster, Summon};
use crate::domain::value_objects::{AxialCoord, EntityId};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Roster {
    pub characters: Vec<Character>,
    pub monsters: Vec<Monster>,
    pub summons: Vec<Summon>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Finders
    // ========================================================================

    pub fn character(&self, id: EntityId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id() == id)
    }

    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id() == id)
    }

    pub fn character_for_user(&self, user_id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.user_id == user_id)
    }

    pub fn monster(&self, id: EntityId) -> Option<&Monster> {
        self.monsters.iter().find(|m| m.id() == id)
    }

    pub fn summon(&self, id: EntityId) -> Option<&Summon> {
        self.summons.iter().find(|s| s.id() == id)
    }

    pub fn summon_mut(&mut self, id: EntityId) -> Option<&mut Summon> {
        self.summons.iter_mut().find(|s| s.id() == id)
    }

    pub fn cores(&self) -> impl Iterator<Item = &CombatantCore> {
        self.characters
            .iter()
            .map(|c| &c.core)
            .chain(self.monsters.iter().map(|m| &m.core))
            .chain(self.summons.iter().map(|s| &s.core))
    }

    pub fn cores_mut(&mut self) -> impl Iterator<Item = &mut CombatantCore> {
        self.characters
            .iter_mut()
            .map(|c| &mut c.core)
            .chain(self.monsters.iter_mut().map(|m| &mut m.core))
            .chain(self.summons.iter_mut().map(|s| &mut s.core))
    }

    pub fn core(&self, id: EntityId) -> Option<&CombatantCore> {
        self.cores().find(|core| core.id == id)
    }

    pub fn core_mut(&mut self, id: EntityId) -> Option<&mut CombatantCore> {
        self.cores_mut().find(|core| core.id == id)
    }

    /// Two distinct figures borrowed mutably at once
    pub fn pair_mut(
        &mut self,
        first: EntityId,
        second: EntityId,
    ) -> Option<(&mut CombatantCore, &mut CombatantCore)> {
        if first == second {
            return None;
        }
        let mut a = None;
        let mut b = None;
        for core in self.cores_mut() {
            if core.id == first {
                a = Some(core);
            } else if core.id == second {
                b = Some(core);
            }
        }
        Some((a?, b?))
    }

    // ========================================================================
    // Board queries
    // ========================================================================

    /// Hexes held by living figures, optionally ignoring one of them
    pub fn occupied_hexes(&self, except: Option<EntityId>) -> HashSet<AxialCoord> {
        self.characters
            .iter()
            .filter(|c| c.is_in_play())
            .map(|c| &c.core)
            .chain(self.monsters.iter().map(|m| &m.core))
            .chain(self.summons.iter().map(|s| &s.core))
            .filter(|core| !core.is_dead && Some(core.id) != except)
            .map(|core| core.position)
            .collect()
    }

    pub fn is_occupied(&self, hex: &AxialCoord) -> bool {
        self.occupied_hexes(None).contains(hex)
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub fn characters_in_play(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(|c| c.is_in_play())
    }

    pub fn all_characters_out(&self) -> bool {
        !self.characters.is_empty() && self.characters_in_play().next().is_none()
    }

    /// Whether the figure is still dead-or-exhausted free
    pub fn is_living(&self, id: EntityId) -> bool {
        if let Some(character) = self.character(id) {
            return character.is_in_play();
        }
        self.core(id).map_or(false, |core| !core.is_dead)
    }

    pub fn is_exhausted(&self, id: EntityId) -> bool {
        self.character(id).map_or(false, |c| c.is_exhausted)
    }

    pub fn entity_type(&self, id: EntityId) -> Option<EntityType> {
        self.core(id).map(|core| core.entity_type)
    }

    /// Monsters oppose characters and summons
    pub fn are_enemies(&self, a: EntityId, b: EntityId) -> bool {
        match (self.entity_type(a), self.entity_type(b)) {
            (Some(EntityType::Monster), Some(EntityType::Monster)) => false,
            (Some(EntityType::Monster), Some(_)) | (Some(_), Some(EntityType::Monster)) => true,
            _ => false,
        }
    }

    /// Kill every summon owned by the character, returning their ids
    pub fn dismiss_summons_of(&mut self, owner: EntityId) -> Vec<EntityId> {
        self.summons
            .iter_mut()
            .filter(|s| s.owner_id == Some(owner) && !s.core.is_dead)
            .map(|s| {
                s.core.is_dead = true;
                s.core.current_health = 0;
                s.core.id
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MonsterStats;

    fn monster(q: i32) -> Monster {
        Monster::new(
            "ooze",
            false,
            AxialCoord::new(q, 0),
            MonsterStats {
                health: 4,
                movement: 1,
                attack: 2,
                range: 1,
                shield: 0,
                retaliate: None,
                attack_modifiers: vec![],
                can_fly: false,
            },
        )
    }

    #[test]
    fn test_pair_mut_returns_distinct_cores() {
        let mut roster = Roster::new();
        let hero = Character::new("u", "Hero", "brute", 10, AxialCoord::new(0, 0));
        let (hero_id, monster_id) = (hero.id(), {
            let m = monster(1);
            let id = m.id();
            roster.monsters.push(m);
            id
        });
        roster.characters.push(hero);

        let (a, b) = roster.pair_mut(hero_id, monster_id).unwrap();
        a.current_health -= 1;
        b.current_health -= 2;
        assert_eq!(roster.core(hero_id).unwrap().current_health, 9);
        assert_eq!(roster.core(monster_id).unwrap().current_health, 2);
        assert!(roster.pair_mut(hero_id, hero_id).is_none());
    }

    #[test]
    fn test_occupied_hexes_skip_dead_and_excluded() {
        let mut roster = Roster::new();
        let mut dead = monster(2);
        dead.core.is_dead = true;
        let alive = monster(1);
        let alive_id = alive.id();
        roster.monsters = vec![dead, alive];

        assert!(roster.is_occupied(&AxialCoord::new(1, 0)));
        assert!(!roster.is_occupied(&AxialCoord::new(2, 0)));
        assert!(roster.occupied_hexes(Some(alive_id)).is_empty());
    }
}
