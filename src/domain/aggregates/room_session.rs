//! RoomSession - the root aggregate for one game room
//!
//! A RoomSession owns everything that belongs to a running scenario: the
//! roster, loot, modifier decks, elements, objective progress, turn state and
//! the room's seeded RNG. All mutation during play goes through the session
//! orchestrator holding the aggregate.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    BoardMap, Difficulty, LootToken, Monster, ObjectiveProgressEntry, ScenarioDefinition, Summon,
    Treasure,
};
use crate::domain::services::modifier_deck::DeckSet;
use crate::domain::services::objective_context::{ContextInput, EntityRecord};
use crate::domain::services::turn_order::TurnOrderEntry;
use crate::domain::value_objects::{AxialCoord, ElementalState, EntityId, RoomId};

use super::{AccumulatedStats, Roster};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Players are joining; the game has not started
    Lobby,
    CardSelection,
    ActiveTurn,
    Completed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Lobby => write!(f, "lobby"),
            SessionPhase::CardSelection => write!(f, "card_selection"),
            SessionPhase::ActiveTurn => write!(f, "active_turn"),
            SessionPhase::Completed => write!(f, "completed"),
        }
    }
}

/// Who is acting this round and who already did
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnState {
    pub order: Vec<TurnOrderEntry>,
    pub active_index: Option<usize>,
    /// The active entity is AI-controlled and waits for its activation
    pub ai_scheduled: bool,
    pub moved: HashSet<EntityId>,
    pub attacked: HashSet<EntityId>,
    pub activated: HashSet<EntityId>,
}

impl TurnState {
    pub fn clear_acted(&mut self) {
        self.moved.clear();
        self.attacked.clear();
        self.activated.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub victory: bool,
    pub reason: String,
    pub round: u32,
}

#[derive(Debug, Clone)]
pub struct RoomSession {
    pub id: RoomId,
    pub scenario: ScenarioDefinition,
    pub difficulty: Difficulty,
    pub phase: SessionPhase,
    pub round: u32,
    pub roster: Roster,
    pub loot: Vec<LootToken>,
    pub treasures: Vec<Treasure>,
    pub decks: DeckSet,
    pub elements: ElementalState,
    pub stats: AccumulatedStats,
    pub objective_progress: BTreeMap<String, ObjectiveProgressEntry>,
    pub turn: TurnState,
    /// Initiative drawn per monster type for the current round
    pub monster_initiatives: HashMap<String, i32>,
    pub outcome: Option<ScenarioOutcome>,
    pub rng: StdRng,
    pub created_at: DateTime<Utc>,
}

impl RoomSession {
    pub fn new(
        id: RoomId,
        scenario: ScenarioDefinition,
        difficulty: Difficulty,
        monsters: Vec<Monster>,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let decks = DeckSet::new(&mut rng);
        let summons = scenario
            .allies
            .iter()
            .map(|ally| Summon::new(ally.id, ally.definition.clone(), None, ally.position))
            .collect();
        let treasures = scenario.treasures.clone();

        Self {
            id,
            difficulty,
            phase: SessionPhase::Lobby,
            round: 0,
            roster: Roster {
                characters: Vec::new(),
                monsters,
                summons,
            },
            loot: Vec::new(),
            treasures,
            decks,
            elements: ElementalState::default(),
            stats: AccumulatedStats::default(),
            objective_progress: BTreeMap::new(),
            turn: TurnState::default(),
            monster_initiatives: HashMap::new(),
            outcome: None,
            rng,
            created_at: Utc::now(),
            scenario,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn board(&self) -> &BoardMap {
        &self.scenario.board
    }

    /// Scenario level after difficulty
    pub fn level(&self) -> u32 {
        self.scenario.effective_level(self.difficulty)
    }

    pub fn is_completed(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    pub fn active_entry(&self) -> Option<&TurnOrderEntry> {
        self.turn
            .active_index
            .and_then(|index| self.turn.order.get(index))
    }

    pub fn is_active_entity(&self, id: EntityId) -> bool {
        self.phase == SessionPhase::ActiveTurn
            && self.active_entry().map_or(false, |entry| entry.entity_id == id)
    }

    pub fn loot_index_at(&self, hex: &AxialCoord) -> Option<usize> {
        self.loot.iter().position(|token| token.position == *hex)
    }

    pub fn treasure_index_at(&self, hex: &AxialCoord) -> Option<usize> {
        self.treasures
            .iter()
            .position(|t| t.position == *hex && !t.is_collected())
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Id drawn from the room RNG so replays reproduce it
    pub fn next_entity_id(&mut self) -> EntityId {
        EntityId::from_rng(&mut self.rng)
    }

    /// Refresh dead and exhausted flags in the turn order from the roster
    pub fn sync_turn_order(&mut self) {
        for entry in self.turn.order.iter_mut() {
            let alive = self
                .roster
                .core(entry.entity_id)
                .map_or(false, |core| !core.is_dead);
            entry.is_dead = !alive;
            entry.is_exhausted = self.roster.is_exhausted(entry.entity_id);
        }
    }

    /// Draw one initiative per living monster type
    pub fn draw_monster_initiatives(&mut self, min: i32, max: i32) {
        let (low, high) = (min.min(max), min.max(max));
        let types: BTreeSet<String> = self
            .roster
            .monsters
            .iter()
            .filter(|m| !m.core.is_dead)
            .map(|m| m.monster_type.clone())
            .collect();
        self.monster_initiatives = types
            .into_iter()
            .map(|monster_type| (monster_type, self.rng.gen_range(low..=high)))
            .collect();
    }

    /// Hydrated view of the room for objective evaluation
    pub fn context_input(&self) -> ContextInput {
        ContextInput {
            room_id: Some(self.id),
            round: self.round,
            turn_index: self.turn.active_index,
            difficulty: self.difficulty,
            characters: self
                .roster
                .characters
                .iter()
                .cloned()
                .map(EntityRecord::Hydrated)
                .collect(),
            monsters: self
                .roster
                .monsters
                .iter()
                .cloned()
                .map(EntityRecord::Hydrated)
                .collect(),
            summons: self
                .roster
                .summons
                .iter()
                .cloned()
                .map(EntityRecord::Hydrated)
                .collect(),
            treasures: self.treasures.clone(),
            loot_on_board: self.loot.len(),
            elements: self.elements,
            stats: self.stats.clone(),
            progress: self.objective_progress.clone(),
        }
    }
}
