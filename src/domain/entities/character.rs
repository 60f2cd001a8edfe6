//! Character entity - player-controlled heroes

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    CardSelection, CombatProfile, Combatant, CombatantCore, EntityType, TurnStats,
};
use crate::domain::value_objects::{AxialCoord, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestType {
    Short,
    Long,
}

/// Why a character left the scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionReason {
    /// Health reached zero
    Damage,
    /// Not enough cards to play another round
    NoCards,
}

/// A player character in a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub core: CombatantCore,
    /// Player (user) who controls this character
    pub user_id: String,
    pub class_name: String,

    // Card piles
    pub hand: Vec<String>,
    pub discard: Vec<String>,
    pub lost: Vec<String>,

    // Round state
    pub selected_cards: Option<CardSelection>,
    pub turn_stats: TurnStats,
    pub has_moved: bool,
    pub has_attacked: bool,
    /// Card chosen to lose when a declared long rest resolves
    pub pending_long_rest: Option<String>,

    pub is_exhausted: bool,

    // Per-scenario tallies
    pub experience: u32,
    pub gold: u32,
    pub loot_collected: u32,
    pub damage_dealt: u32,
    pub monsters_killed: u32,
}

impl Character {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        class_name: impl Into<String>,
        max_health: i32,
        position: AxialCoord,
    ) -> Self {
        Self::with_id(EntityId::new(), user_id, name, class_name, max_health, position)
    }

    pub fn with_id(
        id: EntityId,
        user_id: impl Into<String>,
        name: impl Into<String>,
        class_name: impl Into<String>,
        max_health: i32,
        position: AxialCoord,
    ) -> Self {
        Self {
            core: CombatantCore::new(id, name, EntityType::Character, position, max_health),
            user_id: user_id.into(),
            class_name: class_name.into(),
            hand: Vec::new(),
            discard: Vec::new(),
            lost: Vec::new(),
            selected_cards: None,
            turn_stats: TurnStats::default(),
            has_moved: false,
            has_attacked: false,
            pending_long_rest: None,
            is_exhausted: false,
            experience: 0,
            gold: 0,
            loot_collected: 0,
            damage_dealt: 0,
            monsters_killed: 0,
        }
    }

    pub fn with_hand(mut self, cards: Vec<String>) -> Self {
        self.hand = cards;
        self
    }

    /// Still on the board: alive and not exhausted
    pub fn is_in_play(&self) -> bool {
        !self.core.is_dead && !self.is_exhausted
    }

    /// Committed to this round, either with two cards or a long rest
    pub fn has_committed(&self) -> bool {
        self.selected_cards.is_some() || self.pending_long_rest.is_some()
    }

    /// Whether the character can still take part in another round
    pub fn can_play_round(&self) -> bool {
        self.hand.len() >= 2 || self.discard.len() >= 2
    }

    pub fn commit_selection(&mut self, selection: CardSelection, stats: TurnStats) {
        self.core.shield = stats.shield;
        self.core.retaliate = stats.retaliate;
        self.turn_stats = stats;
        self.selected_cards = Some(selection);
    }

    pub fn reset_turn_flags(&mut self) {
        self.has_moved = false;
        self.has_attacked = false;
    }

    /// Move the played pair from hand to discard
    pub fn discard_played_cards(&mut self) {
        if let Some(selection) = &self.selected_cards {
            for card_id in [&selection.top_card_id, &selection.bottom_card_id] {
                if let Some(pos) = self.hand.iter().position(|id| id == card_id) {
                    let card = self.hand.remove(pos);
                    self.discard.push(card);
                }
            }
        }
    }

    /// Forget everything tied to the round that just ended
    pub fn clear_round_state(&mut self) {
        self.selected_cards = None;
        self.turn_stats = TurnStats::default();
        self.core.shield = 0;
        self.core.retaliate = None;
        self.pending_long_rest = None;
        self.reset_turn_flags();
    }

    /// Lose a random discarded card and return the rest to hand
    pub fn short_rest<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        let lost = self.discard.choose(rng).cloned()?;
        self.discard.retain(|id| id != &lost);
        self.lost.push(lost.clone());
        self.hand.append(&mut self.discard);
        Some(lost)
    }

    /// Resolve a declared long rest: lose the chosen card, heal, recover discard
    pub fn resolve_long_rest(&mut self, heal: i32) -> Option<(String, i32)> {
        let card = self.pending_long_rest.take()?;
        if let Some(pos) = self.discard.iter().position(|id| id == &card) {
            self.discard.remove(pos);
        }
        self.lost.push(card.clone());
        self.hand.append(&mut self.discard);
        let healed = self.core.heal(heal);
        Some((card, healed))
    }
}

impl Combatant for Character {
    fn core(&self) -> &CombatantCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CombatantCore {
        &mut self.core
    }

    fn profile(&self) -> CombatProfile {
        CombatProfile {
            movement: self.turn_stats.movement,
            attack: self.turn_stats.attack,
            range: self.turn_stats.range.max(1),
            attack_modifiers: self.turn_stats.attack_modifiers.clone(),
            can_fly: false,
        }
    }

    fn is_active(&self) -> bool {
        self.is_in_play()
    }
}
