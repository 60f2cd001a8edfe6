//! Status conditions that can be applied to combatants

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Poison,
    /// Deals 1 damage at the start of the bearer's turn
    Wound,
    Immobilize,
    Disarm,
    Stun,
    Muddle,
    Strengthen,
    /// Cannot be focused by enemies
    Invisible,
}

impl Condition {
    /// Conditions removed at the end of the bearer's next turn
    pub fn expires_at_turn_end(&self) -> bool {
        matches!(
            self,
            Condition::Immobilize
                | Condition::Disarm
                | Condition::Stun
                | Condition::Muddle
                | Condition::Strengthen
                | Condition::Invisible
        )
    }

    pub fn prevents_movement(&self) -> bool {
        matches!(self, Condition::Immobilize | Condition::Stun)
    }

    pub fn prevents_attack(&self) -> bool {
        matches!(self, Condition::Disarm | Condition::Stun)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Condition::Poison => "poison",
            Condition::Wound => "wound",
            Condition::Immobilize => "immobilize",
            Condition::Disarm => "disarm",
            Condition::Stun => "stun",
            Condition::Muddle => "muddle",
            Condition::Strengthen => "strengthen",
            Condition::Invisible => "invisible",
        };
        write!(f, "{}", name)
    }
}
