//! Shared combatant state
//!
//! Characters, monsters and summons all embed a [`CombatantCore`] and expose it
//! through the [`Combatant`] trait, so combat and AI code can work over any of
//! them without knowing the concrete variant.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ActionModifier, AxialCoord, Condition, EntityId};

/// Which kind of figure an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Character,
    Monster,
    Summon,
}

impl EntityType {
    /// Tie-break rank when two entries share an initiative value
    pub fn initiative_rank(&self) -> u8 {
        match self {
            EntityType::Character => 0,
            EntityType::Summon => 1,
            EntityType::Monster => 2,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Character => write!(f, "character"),
            EntityType::Monster => write!(f, "monster"),
            EntityType::Summon => write!(f, "summon"),
        }
    }
}

/// Damage returned to adjacent (or ranged) attackers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retaliate {
    pub value: u32,
    #[serde(default = "default_retaliate_range")]
    pub range: u32,
}

fn default_retaliate_range() -> u32 {
    1
}

/// Movement and attack numbers an entity acts with this turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatProfile {
    pub movement: u32,
    pub attack: i32,
    /// Attack range; melee attacks use 1
    pub range: u32,
    #[serde(default)]
    pub attack_modifiers: Vec<ActionModifier>,
    #[serde(default)]
    pub can_fly: bool,
}

/// State every figure on the board carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantCore {
    pub id: EntityId,
    pub name: String,
    pub entity_type: EntityType,
    pub position: AxialCoord,
    pub current_health: i32,
    pub max_health: i32,
    pub conditions: BTreeSet<Condition>,
    /// Active shield value (0 = none)
    pub shield: u32,
    pub retaliate: Option<Retaliate>,
    pub is_dead: bool,
}

impl CombatantCore {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        entity_type: EntityType,
        position: AxialCoord,
        max_health: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            entity_type,
            position,
            current_health: max_health,
            max_health,
            conditions: BTreeSet::new(),
            shield: 0,
            retaliate: None,
            is_dead: false,
        }
    }

    /// Apply damage, flooring health at zero. Returns true if this killed the entity.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        if amount <= 0 || self.is_dead {
            return false;
        }
        self.current_health = (self.current_health - amount).max(0);
        if self.current_health == 0 {
            self.is_dead = true;
            return true;
        }
        false
    }

    /// Heal up to max health. Returns the amount actually healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 || self.is_dead {
            return 0;
        }
        let before = self.current_health;
        self.current_health = (self.current_health + amount).min(self.max_health);
        self.current_health - before
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    pub fn can_move(&self) -> bool {
        !self.conditions.iter().any(|c| c.prevents_movement())
    }

    pub fn can_attack(&self) -> bool {
        !self.conditions.iter().any(|c| c.prevents_attack())
    }

    /// Drop conditions that only last until the end of the bearer's turn
    pub fn expire_turn_conditions(&mut self) {
        self.conditions.retain(|c| !c.expires_at_turn_end());
    }
}

/// Capability set shared by every figure on the board
pub trait Combatant {
    fn core(&self) -> &CombatantCore;

    fn core_mut(&mut self) -> &mut CombatantCore;

    /// Numbers the entity would act with right now
    fn profile(&self) -> CombatProfile;

    fn id(&self) -> EntityId {
        self.core().id
    }

    fn position(&self) -> AxialCoord {
        self.core().position
    }

    /// Alive and still taking part in the scenario
    fn is_active(&self) -> bool {
        !self.core().is_dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core(health: i32) -> CombatantCore {
        CombatantCore::new(
            EntityId::new(),
            "Test",
            EntityType::Monster,
            AxialCoord::new(0, 0),
            health,
        )
    }

    #[test]
    fn test_apply_damage_floors_at_zero() {
        let mut c = core(3);
        assert!(c.apply_damage(10));
        assert_eq!(c.current_health, 0);
        assert!(c.is_dead);
    }

    #[test]
    fn test_negative_damage_is_ignored() {
        let mut c = core(5);
        assert!(!c.apply_damage(-3));
        assert_eq!(c.current_health, 5);
    }

    #[test]
    fn test_heal_caps_at_max_health() {
        let mut c = core(6);
        c.apply_damage(2);
        assert_eq!(c.heal(5), 2);
        assert_eq!(c.current_health, 6);
    }

    #[test]
    fn test_expiring_conditions_are_cleared() {
        let mut c = core(6);
        c.conditions.insert(Condition::Stun);
        c.conditions.insert(Condition::Poison);
        c.expire_turn_conditions();
        assert!(!c.has_condition(Condition::Stun));
        assert!(c.has_condition(Condition::Poison));
    }
}
