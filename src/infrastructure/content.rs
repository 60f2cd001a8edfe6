//! In-memory content store
//!
//! Serves ability cards and scenarios from a JSON bundle, or from the small
//! built-in set used when no content file is configured.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::outbound::{
    CardValidation, ContentError, ContentPort, ScenarioPort, ScenarioSummary,
};
use crate::domain::entities::{
    AbilityCard, ActionKind, BoardMap, CardAction, Difficulty, Monster, MonsterGroup,
    MonsterSpawn, MonsterStats, ObjectiveDefinition, ObjectiveKind, ObjectiveRewards,
    ScenarioDefinition, ScenarioObjectives, Terrain, Treasure,
};
use crate::domain::value_objects::{ActionModifier, AxialCoord, Condition, Element, EntityId, RoomId};

/// Shape of a content file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBundle {
    #[serde(default)]
    pub cards: Vec<AbilityCard>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDefinition>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    cards: BTreeMap<String, AbilityCard>,
    scenarios: BTreeMap<String, ScenarioDefinition>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(mut self, cards: impl IntoIterator<Item = AbilityCard>) -> Self {
        for card in cards {
            self.cards.insert(card.id.clone(), card);
        }
        self
    }

    pub fn with_scenario(mut self, scenario: ScenarioDefinition) -> Self {
        self.scenarios.insert(scenario.id.clone(), scenario);
        self
    }

    pub fn from_bundle(bundle: ContentBundle) -> Self {
        bundle
            .scenarios
            .into_iter()
            .fold(Self::new().with_cards(bundle.cards), Self::with_scenario)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ContentError> {
        let bundle: ContentBundle =
            serde_json::from_str(json).map_err(|e| ContentError::Invalid(e.to_string()))?;
        Ok(Self::from_bundle(bundle))
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content file {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse content file {}", path.display()))
    }

    /// Two starter classes and one scenario
    pub fn demo() -> Self {
        Self::new()
            .with_cards(demo_cards())
            .with_scenario(demo_scenario())
    }
}

#[async_trait]
impl ContentPort for InMemoryContentStore {
    async fn get_card_by_id(&self, card_id: &str) -> Result<Option<AbilityCard>, ContentError> {
        Ok(self.cards.get(card_id).cloned())
    }

    async fn get_cards_by_class(&self, class_name: &str) -> Result<Vec<AbilityCard>, ContentError> {
        Ok(self
            .cards
            .values()
            .filter(|card| card.class_name == class_name)
            .cloned()
            .collect())
    }

    async fn validate_card_selection(
        &self,
        top_card_id: &str,
        bottom_card_id: &str,
        class_name: &str,
    ) -> Result<CardValidation, ContentError> {
        let top_card = self.cards.get(top_card_id).cloned();
        let bottom_card = self.cards.get(bottom_card_id).cloned();

        let mut errors = Vec::new();
        if top_card_id == bottom_card_id {
            errors.push("Top and bottom cards must differ".to_string());
        }
        for (id, card) in [(top_card_id, &top_card), (bottom_card_id, &bottom_card)] {
            match card {
                None => errors.push(format!("Card {} not found", id)),
                Some(card) if card.class_name != class_name => {
                    errors.push(format!("Card {} does not belong to class {}", id, class_name))
                }
                Some(_) => {}
            }
        }

        Ok(CardValidation {
            valid: errors.is_empty(),
            top_card,
            bottom_card,
            errors,
        })
    }
}

#[async_trait]
impl ScenarioPort for InMemoryContentStore {
    async fn load_scenario(&self, scenario_id: &str) -> Result<Option<ScenarioDefinition>, ContentError> {
        Ok(self.scenarios.get(scenario_id).cloned())
    }

    async fn spawn_monsters(
        &self,
        scenario: &ScenarioDefinition,
        room_id: RoomId,
        difficulty: Difficulty,
    ) -> Result<Vec<Monster>, ContentError> {
        let (seed, _) = room_id.as_uuid().as_u64_pair();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut monsters = Vec::new();
        for group in &scenario.monster_groups {
            for spawn in &group.spawns {
                if !scenario.board.can_stand_on(&spawn.position) {
                    return Err(ContentError::Invalid(format!(
                        "{} spawns off the board at {}",
                        group.monster_type, spawn.position
                    )));
                }
                let monster = Monster::with_id(
                    EntityId::from_rng(&mut rng),
                    group.monster_type.clone(),
                    spawn.elite,
                    spawn.position,
                    group.stats_for(spawn.elite).clone(),
                );
                monsters.push(if group.is_boss { monster.as_boss() } else { monster });
            }
        }
        debug!(
            scenario = %scenario.id,
            level = scenario.effective_level(difficulty),
            count = monsters.len(),
            "Monsters spawned"
        );
        Ok(monsters)
    }

    async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>, ContentError> {
        Ok(self
            .scenarios
            .values()
            .map(|s| ScenarioSummary {
                id: s.id.clone(),
                name: s.name.clone(),
                level: s.level,
            })
            .collect())
    }
}

// ============================================================================
// Built-in content
// ============================================================================

fn card(
    id: &str,
    class_name: &str,
    initiative: i32,
    top_actions: Vec<CardAction>,
    bottom_actions: Vec<CardAction>,
) -> AbilityCard {
    AbilityCard {
        id: id.to_string(),
        name: id.replace('-', " "),
        class_name: class_name.to_string(),
        initiative,
        top_actions,
        bottom_actions,
    }
}

fn demo_cards() -> Vec<AbilityCard> {
    use ActionKind::*;
    vec![
        card("trample", "brute", 72, vec![CardAction::new(Attack, 3).with_modifier(ActionModifier::Pierce { value: 2 })], vec![CardAction::new(Move, 4)]),
        card("eye-for-an-eye", "brute", 18, vec![CardAction::new(Retaliate, 2)], vec![CardAction::new(Heal, 2)]),
        card("shield-bash", "brute", 15, vec![CardAction::new(Attack, 4).with_modifier(ActionModifier::Condition { condition: Condition::Stun })], vec![CardAction::new(Shield, 1)]),
        card("leaping-cleave", "brute", 54, vec![CardAction::new(Attack, 3)], vec![CardAction::new(Move, 3)]),
        card("spare-dagger", "brute", 27, vec![CardAction::new(Attack, 3).with_range(3)], vec![CardAction::new(Attack, 2)]),
        card("warding-strength", "brute", 32, vec![CardAction::new(Attack, 3).with_modifier(ActionModifier::Push { value: 2 })], vec![CardAction::new(Move, 3)]),
        card("fire-orbs", "spellweaver", 69, vec![CardAction::new(Attack, 3).with_range(3).with_modifier(ActionModifier::Infuse { element: Element::Fire })], vec![CardAction::new(Move, 2)]),
        card("impaling-eruption", "spellweaver", 70, vec![CardAction::new(Attack, 3).with_range(3).with_modifier(ActionModifier::ConsumeElement { element: Element::Fire, bonus: 2 })], vec![CardAction::new(Move, 2)]),
        card("frost-armor", "spellweaver", 20, vec![CardAction::new(Shield, 2)], vec![CardAction::new(Move, 2)]),
        card("flame-strike", "spellweaver", 36, vec![CardAction::new(Attack, 3).with_range(2).with_modifier(ActionModifier::Condition { condition: Condition::Wound })], vec![CardAction::new(Move, 3)]),
    ]
}

fn demo_scenario() -> ScenarioDefinition {
    let guard = MonsterStats {
        health: 5,
        movement: 2,
        attack: 2,
        range: 1,
        shield: 0,
        retaliate: None,
        attack_modifiers: vec![],
        can_fly: false,
    };
    let archer = MonsterStats {
        health: 4,
        movement: 2,
        attack: 2,
        range: 3,
        shield: 0,
        retaliate: None,
        attack_modifiers: vec![],
        can_fly: false,
    };

    ScenarioDefinition {
        id: "black-barrow".into(),
        name: "Black Barrow".into(),
        level: 1,
        board: BoardMap::hexagon(4)
            .with_terrain(AxialCoord::new(0, -1), Terrain::Obstacle)
            .with_terrain(AxialCoord::new(1, 1), Terrain::Difficult),
        starting_positions: vec![
            AxialCoord::new(-3, 0),
            AxialCoord::new(-3, 1),
            AxialCoord::new(-4, 1),
            AxialCoord::new(-4, 2),
        ],
        monster_groups: vec![
            MonsterGroup {
                monster_type: "bandit-guard".into(),
                elite: Some(MonsterStats {
                    health: 9,
                    attack: 3,
                    shield: 1,
                    ..guard.clone()
                }),
                normal: guard,
                spawns: vec![
                    MonsterSpawn { position: AxialCoord::new(2, 0), elite: false },
                    MonsterSpawn { position: AxialCoord::new(2, -1), elite: true },
                ],
                is_boss: false,
            },
            MonsterGroup {
                monster_type: "bandit-archer".into(),
                normal: archer,
                elite: None,
                spawns: vec![MonsterSpawn { position: AxialCoord::new(3, 0), elite: false }],
                is_boss: false,
            },
        ],
        allies: vec![],
        treasures: vec![Treasure {
            id: "barrow-chest".into(),
            position: AxialCoord::new(4, -2),
            gold: 10,
            collected_by: None,
        }],
        objectives: ScenarioObjectives {
            primary: ObjectiveDefinition::new("clear-barrow", ObjectiveKind::KillAllMonsters)
                .with_description("Kill all enemies")
                .with_rewards(ObjectiveRewards { experience: 4, gold: 0 }),
            secondary: vec![ObjectiveDefinition::new(
                "open-chest",
                ObjectiveKind::CollectTreasure { treasure_ids: vec!["barrow-chest".into()] },
            )
            .with_description("Loot the barrow chest")],
            failure_conditions: vec![],
        },
        round_limit: Some(12),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_card_selection() {
        let store = InMemoryContentStore::demo();
        let ok = store
            .validate_card_selection("trample", "shield-bash", "brute")
            .await
            .unwrap();
        assert!(ok.valid);
        assert_eq!(ok.top_card.unwrap().initiative, 72);

        let wrong_class = store
            .validate_card_selection("trample", "fire-orbs", "brute")
            .await
            .unwrap();
        assert!(!wrong_class.valid);
        assert_eq!(wrong_class.errors.len(), 1);

        let missing = store
            .validate_card_selection("trample", "nope", "brute")
            .await
            .unwrap();
        assert!(!missing.valid);
    }

    #[tokio::test]
    async fn test_spawn_ids_follow_room_id() {
        let store = InMemoryContentStore::demo();
        let scenario = store.load_scenario("black-barrow").await.unwrap().unwrap();
        let room_id = RoomId::new();

        let first = store
            .spawn_monsters(&scenario, room_id, Difficulty::Normal)
            .await
            .unwrap();
        let second = store
            .spawn_monsters(&scenario, room_id, Difficulty::Normal)
            .await
            .unwrap();
        assert_eq!(first.len(), 3);
        let ids: Vec<_> = first.iter().map(|m| m.core.id).collect();
        assert_eq!(ids, second.iter().map(|m| m.core.id).collect::<Vec<_>>());
        assert!(first.iter().any(|m| m.is_elite && m.core.max_health == 9));
    }

    #[tokio::test]
    async fn test_bundle_from_json() {
        let json = r#"{
            "cards": [
                {"id": "a", "name": "A", "class_name": "tinkerer", "initiative": 10,
                 "top_actions": [{"kind": "attack", "value": 2}]}
            ]
        }"#;
        let store = InMemoryContentStore::from_json_str(json).unwrap();
        assert_eq!(store.get_cards_by_class("tinkerer").await.unwrap().len(), 1);
        assert!(store.list_scenarios().await.unwrap().is_empty());
        assert!(InMemoryContentStore::from_json_str("{").is_err());
    }
}
