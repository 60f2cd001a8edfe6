//! Evaluation snapshots for objective checks
//!
//! Room state reaches the builder either as hydrated entities or as raw JSON
//! records (restored sessions, externally supplied state). Both are normalized
//! once into the same snapshot shape; objective evaluation only ever sees the
//! snapshot.

use std::collections::{BTreeMap, HashSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::aggregates::AccumulatedStats;
use crate::domain::entities::{
    Character, Difficulty, Monster, ObjectiveProgressEntry, Summon, Treasure,
};
use crate::domain::value_objects::{AxialCoord, Condition, ElementalState, EntityId, RoomId};

/// An entity as handed to the builder
#[derive(Debug, Clone)]
pub enum EntityRecord<T> {
    Hydrated(T),
    Raw(serde_json::Value),
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Malformed entity record: {0}")]
    MalformedRecord(#[from] serde_json::Error),
    #[error("Entity {0} appears more than once")]
    DuplicateEntity(EntityId),
}

/// Entities that can be reduced to an evaluation snapshot
pub trait IntoSnapshot {
    type Snapshot: DeserializeOwned;

    fn snapshot(&self) -> Self::Snapshot;
}

impl<T: IntoSnapshot> EntityRecord<T> {
    pub fn normalize(&self) -> Result<T::Snapshot, ContextError> {
        match self {
            EntityRecord::Hydrated(entity) => Ok(entity.snapshot()),
            EntityRecord::Raw(value) => Ok(serde_json::from_value(value.clone())?),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    pub position: AxialCoord,
    #[serde(alias = "currentHealth")]
    pub current_health: i32,
    #[serde(alias = "maxHealth")]
    pub max_health: i32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, alias = "isDead")]
    pub is_dead: bool,
    #[serde(default, alias = "isExhausted")]
    pub is_exhausted: bool,
}

impl CharacterSnapshot {
    pub fn is_active(&self) -> bool {
        !self.is_dead && !self.is_exhausted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSnapshot {
    pub id: EntityId,
    #[serde(alias = "monsterType")]
    pub monster_type: String,
    pub position: AxialCoord,
    #[serde(alias = "currentHealth")]
    pub current_health: i32,
    #[serde(alias = "maxHealth")]
    pub max_health: i32,
    #[serde(default, alias = "isDead")]
    pub is_dead: bool,
    #[serde(default, alias = "isElite")]
    pub is_elite: bool,
    #[serde(default, alias = "isBoss")]
    pub is_boss: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllySnapshot {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    pub position: AxialCoord,
    #[serde(alias = "currentHealth")]
    pub current_health: i32,
    #[serde(alias = "maxHealth")]
    pub max_health: i32,
    #[serde(default, alias = "isDead")]
    pub is_dead: bool,
    #[serde(default, alias = "ownerId")]
    pub owner_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasureSnapshot {
    pub id: String,
    pub position: AxialCoord,
    pub collected: bool,
}

impl IntoSnapshot for Character {
    type Snapshot = CharacterSnapshot;

    fn snapshot(&self) -> CharacterSnapshot {
        CharacterSnapshot {
            id: self.core.id,
            name: self.core.name.clone(),
            position: self.core.position,
            current_health: self.core.current_health,
            max_health: self.core.max_health,
            conditions: self.core.conditions.iter().copied().collect(),
            is_dead: self.core.is_dead,
            is_exhausted: self.is_exhausted,
        }
    }
}

impl IntoSnapshot for Monster {
    type Snapshot = MonsterSnapshot;

    fn snapshot(&self) -> MonsterSnapshot {
        MonsterSnapshot {
            id: self.core.id,
            monster_type: self.monster_type.clone(),
            position: self.core.position,
            current_health: self.core.current_health,
            max_health: self.core.max_health,
            is_dead: self.core.is_dead,
            is_elite: self.is_elite,
            is_boss: self.is_boss,
        }
    }
}

impl IntoSnapshot for Summon {
    type Snapshot = AllySnapshot;

    fn snapshot(&self) -> AllySnapshot {
        AllySnapshot {
            id: self.core.id,
            name: self.core.name.clone(),
            position: self.core.position,
            current_health: self.core.current_health,
            max_health: self.core.max_health,
            is_dead: self.core.is_dead,
            owner_id: self.owner_id,
        }
    }
}

/// Raw room state handed to [`build_context`]
#[derive(Debug, Clone, Default)]
pub struct ContextInput {
    pub room_id: Option<RoomId>,
    pub round: u32,
    pub turn_index: Option<usize>,
    pub difficulty: Difficulty,
    pub characters: Vec<EntityRecord<Character>>,
    pub monsters: Vec<EntityRecord<Monster>>,
    pub summons: Vec<EntityRecord<Summon>>,
    pub treasures: Vec<Treasure>,
    pub loot_on_board: usize,
    pub elements: ElementalState,
    pub stats: AccumulatedStats,
    pub progress: BTreeMap<String, ObjectiveProgressEntry>,
}

/// Read-only snapshot objective evaluation runs against
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationContext {
    pub room_id: Option<RoomId>,
    pub round: u32,
    pub turn_index: Option<usize>,
    pub difficulty: Difficulty,
    pub characters: Vec<CharacterSnapshot>,
    pub monsters: Vec<MonsterSnapshot>,
    pub allies: Vec<AllySnapshot>,
    pub treasures: Vec<TreasureSnapshot>,
    pub loot_on_board: usize,
    pub elements: ElementalState,
    pub stats: AccumulatedStats,
    pub progress: BTreeMap<String, ObjectiveProgressEntry>,
}

impl EvaluationContext {
    /// Minimal valid context
    pub fn empty(round: u32) -> Self {
        Self {
            room_id: None,
            round,
            turn_index: None,
            difficulty: Difficulty::default(),
            characters: Vec::new(),
            monsters: Vec::new(),
            allies: Vec::new(),
            treasures: Vec::new(),
            loot_on_board: 0,
            elements: ElementalState::default(),
            stats: AccumulatedStats::default(),
            progress: BTreeMap::new(),
        }
    }

    pub fn active_characters(&self) -> impl Iterator<Item = &CharacterSnapshot> {
        self.characters.iter().filter(|c| c.is_active())
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::empty(0)
    }
}

fn normalize_all<T: IntoSnapshot>(
    records: &[EntityRecord<T>],
    id_of: impl Fn(&T::Snapshot) -> EntityId,
    seen: &mut HashSet<EntityId>,
) -> Result<Vec<T::Snapshot>, ContextError> {
    records
        .iter()
        .map(|record| {
            let snapshot = record.normalize()?;
            let id = id_of(&snapshot);
            if !seen.insert(id) {
                return Err(ContextError::DuplicateEntity(id));
            }
            Ok(snapshot)
        })
        .collect()
}

fn try_build(input: ContextInput) -> Result<EvaluationContext, ContextError> {
    let mut seen = HashSet::new();
    let characters = normalize_all(&input.characters, |c: &CharacterSnapshot| c.id, &mut seen)?;
    let monsters = normalize_all(&input.monsters, |m: &MonsterSnapshot| m.id, &mut seen)?;
    let allies = normalize_all(&input.summons, |a: &AllySnapshot| a.id, &mut seen)?;
    let treasures = input
        .treasures
        .iter()
        .map(|t| TreasureSnapshot {
            id: t.id.clone(),
            position: t.position,
            collected: t.is_collected(),
        })
        .collect();

    Ok(EvaluationContext {
        room_id: input.room_id,
        round: input.round,
        turn_index: input.turn_index,
        difficulty: input.difficulty,
        characters,
        monsters,
        allies,
        treasures,
        loot_on_board: input.loot_on_board,
        elements: input.elements,
        stats: input.stats,
        progress: input.progress,
    })
}

/// Build the evaluation snapshot, falling back to an empty context on error
pub fn build_context(input: ContextInput) -> EvaluationContext {
    let round = input.round;
    let room_id = input.room_id;
    match try_build(input) {
        Ok(context) => context,
        Err(e) => {
            tracing::warn!(room_id = ?room_id, error = %e, "Objective context build failed, using empty context");
            EvaluationContext::empty(round)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MonsterStats;
    use serde_json::json;

    fn monster(health: i32) -> Monster {
        Monster::new(
            "bandit-archer",
            false,
            AxialCoord::new(1, 1),
            MonsterStats {
                health,
                movement: 1,
                attack: 2,
                range: 3,
                shield: 0,
                retaliate: None,
                attack_modifiers: vec![],
                can_fly: false,
            },
        )
    }

    #[test]
    fn test_hydrated_and_raw_records_normalize_alike() {
        let hero = Character::new("u1", "Aria", "spellweaver", 8, AxialCoord::new(0, 1));
        let raw = json!({
            "id": hero.core.id,
            "name": "Aria",
            "position": {"q": 0, "r": 1},
            "currentHealth": 8,
            "maxHealth": 8,
        });

        let hydrated = EntityRecord::Hydrated(hero.clone()).normalize().unwrap();
        let from_raw = EntityRecord::<Character>::Raw(raw).normalize().unwrap();
        assert_eq!(hydrated, from_raw);
    }

    #[test]
    fn test_build_context_snapshots_roster() {
        let mut dead = monster(4);
        dead.core.apply_damage(4);
        let input = ContextInput {
            round: 3,
            monsters: vec![EntityRecord::Hydrated(dead), EntityRecord::Hydrated(monster(4))],
            ..ContextInput::default()
        };
        let context = build_context(input);
        assert_eq!(context.round, 3);
        assert_eq!(context.monsters.iter().filter(|m| m.is_dead).count(), 1);
    }

    #[test]
    fn test_malformed_record_yields_empty_context() {
        let input = ContextInput {
            round: 2,
            monsters: vec![
                EntityRecord::Hydrated(monster(3)),
                EntityRecord::Raw(json!({"id": "not-a-uuid"})),
            ],
            ..ContextInput::default()
        };
        let context = build_context(input);
        assert_eq!(context, EvaluationContext::empty(2));
    }

    #[test]
    fn test_duplicate_entities_yield_empty_context() {
        let m = monster(3);
        let input = ContextInput {
            round: 1,
            monsters: vec![EntityRecord::Hydrated(m.clone()), EntityRecord::Hydrated(m)],
            ..ContextInput::default()
        };
        assert!(build_context(input).monsters.is_empty());
    }
}
