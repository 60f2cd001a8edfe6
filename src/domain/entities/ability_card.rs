//! Ability cards played by characters during card selection

use serde::{Deserialize, Serialize};

use crate::domain::entities::Retaliate;
use crate::domain::value_objects::ActionModifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Attack,
    Heal,
    Shield,
    Retaliate,
    Loot,
}

/// One action printed on a card half
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAction {
    pub kind: ActionKind,
    pub value: i32,
    #[serde(default)]
    pub range: Option<u32>,
    #[serde(default)]
    pub modifiers: Vec<ActionModifier>,
}

impl CardAction {
    pub fn new(kind: ActionKind, value: i32) -> Self {
        Self {
            kind,
            value,
            range: None,
            modifiers: Vec::new(),
        }
    }

    pub fn with_range(mut self, range: u32) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_modifier(mut self, modifier: ActionModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }
}

/// A class ability card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityCard {
    pub id: String,
    pub name: String,
    pub class_name: String,
    pub initiative: i32,
    #[serde(default)]
    pub top_actions: Vec<CardAction>,
    #[serde(default)]
    pub bottom_actions: Vec<CardAction>,
}

/// Cards a character committed to for the round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSelection {
    pub top_card_id: String,
    pub bottom_card_id: String,
    pub initiative: i32,
}

/// Effective numbers a character acts with for the current round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStats {
    pub movement: u32,
    pub attack: i32,
    pub range: u32,
    pub attack_modifiers: Vec<ActionModifier>,
    pub shield: u32,
    pub retaliate: Option<Retaliate>,
}

impl TurnStats {
    /// Derive stats from a card pair.
    ///
    /// Each stat comes from the first action of the matching kind, scanning the
    /// slots in priority order: top of the top card, bottom of the bottom card,
    /// bottom of the top card, top of the bottom card.
    pub fn from_cards(top: &AbilityCard, bottom: &AbilityCard) -> Self {
        let slots = [
            &top.top_actions,
            &bottom.bottom_actions,
            &top.bottom_actions,
            &bottom.top_actions,
        ];
        let find = |kind: ActionKind| -> Option<&CardAction> {
            slots
                .iter()
                .flat_map(|actions| actions.iter())
                .find(|action| action.kind == kind)
        };

        let mut stats = TurnStats::default();
        if let Some(action) = find(ActionKind::Move) {
            stats.movement = action.value.max(0) as u32;
        }
        if let Some(action) = find(ActionKind::Attack) {
            stats.attack = action.value.max(0);
            stats.range = action.range.unwrap_or(1).max(1);
            stats.attack_modifiers = action.modifiers.clone();
        }
        if let Some(action) = find(ActionKind::Shield) {
            stats.shield = action.value.max(0) as u32;
        }
        if let Some(action) = find(ActionKind::Retaliate) {
            stats.retaliate = Some(Retaliate {
                value: action.value.max(0) as u32,
                range: action.range.unwrap_or(1).max(1),
            });
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, initiative: i32, top: Vec<CardAction>, bottom: Vec<CardAction>) -> AbilityCard {
        AbilityCard {
            id: id.to_string(),
            name: id.to_string(),
            class_name: "brute".to_string(),
            initiative,
            top_actions: top,
            bottom_actions: bottom,
        }
    }

    #[test]
    fn test_stats_prefer_top_of_top_card() {
        let top = card(
            "a",
            20,
            vec![CardAction::new(ActionKind::Attack, 3)],
            vec![CardAction::new(ActionKind::Move, 4)],
        );
        let bottom = card(
            "b",
            60,
            vec![CardAction::new(ActionKind::Attack, 5)],
            vec![CardAction::new(ActionKind::Move, 2)],
        );

        let stats = TurnStats::from_cards(&top, &bottom);
        assert_eq!(stats.attack, 3);
        // Bottom of the bottom card outranks the bottom of the top card
        assert_eq!(stats.movement, 2);
        assert_eq!(stats.range, 1);
    }

    #[test]
    fn test_ranged_attack_keeps_range_and_modifiers() {
        let top = card(
            "a",
            10,
            vec![CardAction::new(ActionKind::Attack, 2)
                .with_range(3)
                .with_modifier(ActionModifier::Pierce { value: 1 })],
            vec![],
        );
        let bottom = card("b", 80, vec![], vec![CardAction::new(ActionKind::Shield, 1)]);

        let stats = TurnStats::from_cards(&top, &bottom);
        assert_eq!(stats.range, 3);
        assert_eq!(stats.attack_modifiers, vec![ActionModifier::Pierce { value: 1 }]);
        assert_eq!(stats.shield, 1);
        assert_eq!(stats.movement, 0);
    }
}
