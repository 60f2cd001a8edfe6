//! Summons and allied figures

use serde::{Deserialize, Serialize};

use crate::domain::entities::{CombatProfile, Combatant, CombatantCore, EntityType};
use crate::domain::value_objects::{ActionModifier, AxialCoord, EntityId};

/// What a summon ability creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummonDefinition {
    pub name: String,
    pub health: i32,
    pub movement: u32,
    pub attack: i32,
    #[serde(default = "default_range")]
    pub range: u32,
    #[serde(default)]
    pub attack_modifiers: Vec<ActionModifier>,
    #[serde(default)]
    pub can_fly: bool,
    /// Acts on its owner's commands instead of the summon AI
    #[serde(default)]
    pub player_controlled: bool,
}

fn default_range() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summon {
    pub core: CombatantCore,
    /// Summoning character; a back-reference, the room owns both
    pub owner_id: Option<EntityId>,
    pub player_controlled: bool,
    pub definition: SummonDefinition,
}

impl Summon {
    pub fn new(
        id: EntityId,
        definition: SummonDefinition,
        owner_id: Option<EntityId>,
        position: AxialCoord,
    ) -> Self {
        Self {
            core: CombatantCore::new(
                id,
                definition.name.clone(),
                EntityType::Summon,
                position,
                definition.health,
            ),
            owner_id,
            player_controlled: definition.player_controlled,
            definition,
        }
    }

    /// Ownerless allies draw from the shared ally deck
    pub fn is_ownerless(&self) -> bool {
        self.owner_id.is_none()
    }
}

impl Combatant for Summon {
    fn core(&self) -> &CombatantCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CombatantCore {
        &mut self.core
    }

    fn profile(&self) -> CombatProfile {
        CombatProfile {
            movement: self.definition.movement,
            attack: self.definition.attack,
            range: self.definition.range.max(1),
            attack_modifiers: self.definition.attack_modifiers.clone(),
            can_fly: self.definition.can_fly,
        }
    }
}
