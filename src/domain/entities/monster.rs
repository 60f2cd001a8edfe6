//! Monster entity

use serde::{Deserialize, Serialize};

use crate::domain::entities::{CombatProfile, Combatant, CombatantCore, EntityType, Retaliate};
use crate::domain::value_objects::{ActionModifier, AxialCoord, EntityId};

/// Printed stat line for a monster type (normal or elite)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterStats {
    pub health: i32,
    pub movement: u32,
    pub attack: i32,
    #[serde(default = "default_range")]
    pub range: u32,
    #[serde(default)]
    pub shield: u32,
    #[serde(default)]
    pub retaliate: Option<Retaliate>,
    #[serde(default)]
    pub attack_modifiers: Vec<ActionModifier>,
    #[serde(default)]
    pub can_fly: bool,
}

fn default_range() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub core: CombatantCore,
    pub monster_type: String,
    pub is_elite: bool,
    #[serde(default)]
    pub is_boss: bool,
    pub stats: MonsterStats,
}

impl Monster {
    pub fn new(
        monster_type: impl Into<String>,
        is_elite: bool,
        position: AxialCoord,
        stats: MonsterStats,
    ) -> Self {
        Self::with_id(EntityId::new(), monster_type, is_elite, position, stats)
    }

    pub fn with_id(
        id: EntityId,
        monster_type: impl Into<String>,
        is_elite: bool,
        position: AxialCoord,
        stats: MonsterStats,
    ) -> Self {
        let monster_type = monster_type.into();
        let name = if is_elite {
            format!("Elite {}", monster_type)
        } else {
            monster_type.clone()
        };
        let mut core = CombatantCore::new(id, name, EntityType::Monster, position, stats.health);
        core.shield = stats.shield;
        core.retaliate = stats.retaliate;
        Self {
            core,
            monster_type,
            is_elite,
            is_boss: false,
            stats,
        }
    }

    pub fn as_boss(mut self) -> Self {
        self.is_boss = true;
        self
    }
}

impl Combatant for Monster {
    fn core(&self) -> &CombatantCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CombatantCore {
        &mut self.core
    }

    fn profile(&self) -> CombatProfile {
        CombatProfile {
            movement: self.stats.movement,
            attack: self.stats.attack,
            range: self.stats.range.max(1),
            attack_modifiers: self.stats.attack_modifiers.clone(),
            can_fly: self.stats.can_fly,
        }
    }
}
