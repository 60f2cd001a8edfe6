//! Objective evaluation against an [`EvaluationContext`]
//!
//! Evaluation is a pure function of the definition and the snapshot: the same
//! pair always yields the same [`ObjectiveResult`]. Custom predicates are
//! looked up by name in a [`CustomPredicateRegistry`] supplied at construction.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{ObjectiveDefinition, ObjectiveKind, ObjectiveProgressEntry};
use crate::domain::services::objective_context::EvaluationContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveProgress {
    pub current: u32,
    pub target: u32,
    pub percent: u8,
}

impl ObjectiveProgress {
    pub fn new(current: u32, target: u32, complete: bool) -> Self {
        let current = current.min(target);
        let percent = if target == 0 {
            if complete {
                100
            } else {
                0
            }
        } else {
            ((current as u64 * 100) / target as u64).min(100) as u8
        };
        Self {
            current,
            target,
            percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectiveResult {
    pub complete: bool,
    pub progress: ObjectiveProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The objective can no longer be achieved
    pub failed: bool,
}

impl ObjectiveResult {
    fn tally(current: u32, target: u32, complete: bool) -> Self {
        Self {
            complete,
            progress: ObjectiveProgress::new(current, target, complete),
            error: None,
            failed: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            complete: false,
            progress: ObjectiveProgress::default(),
            error: Some(message.into()),
            failed: false,
        }
    }

    fn failed(mut self, failed: bool) -> Self {
        self.failed = failed;
        self
    }
}

/// What a custom predicate reports back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredicateOutcome {
    pub complete: bool,
    pub current: u32,
    pub target: u32,
    pub failed: bool,
}

/// Externally supplied objective logic
pub trait CustomPredicate: Send + Sync {
    fn evaluate(&self, context: &EvaluationContext, params: &serde_json::Value) -> PredicateOutcome;
}

impl<F> CustomPredicate for F
where
    F: Fn(&EvaluationContext, &serde_json::Value) -> PredicateOutcome + Send + Sync,
{
    fn evaluate(&self, context: &EvaluationContext, params: &serde_json::Value) -> PredicateOutcome {
        self(context, params)
    }
}

#[derive(Clone, Default)]
pub struct CustomPredicateRegistry {
    predicates: HashMap<String, Arc<dyn CustomPredicate>>,
}

impl CustomPredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, predicate: impl CustomPredicate + 'static) {
        self.predicates.insert(name.into(), Arc::new(predicate));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomPredicate>> {
        self.predicates.get(name)
    }
}

impl std::fmt::Debug for CustomPredicateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("CustomPredicateRegistry")
            .field("predicates", &names)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectiveEvaluator {
    registry: CustomPredicateRegistry,
}

impl ObjectiveEvaluator {
    pub fn new(registry: CustomPredicateRegistry) -> Self {
        Self { registry }
    }

    pub fn evaluate(&self, definition: &ObjectiveDefinition, context: &EvaluationContext) -> ObjectiveResult {
        match &definition.kind {
            ObjectiveKind::KillAllMonsters => {
                let target = context.monsters.len() as u32;
                if target == 0 {
                    return ObjectiveResult::error("No monsters in context");
                }
                let killed = context.monsters.iter().filter(|m| m.is_dead).count() as u32;
                ObjectiveResult::tally(killed, target, killed == target)
            }
            ObjectiveKind::KillMonsterType { monster_type, count } => {
                let of_type: Vec<_> = context
                    .monsters
                    .iter()
                    .filter(|m| &m.monster_type == monster_type)
                    .collect();
                let killed = of_type.iter().filter(|m| m.is_dead).count() as u32;
                let target = count.unwrap_or(of_type.len() as u32);
                if target == 0 {
                    return ObjectiveResult::error(format!("No monsters of type {}", monster_type));
                }
                ObjectiveResult::tally(killed, target, killed >= target)
            }
            ObjectiveKind::KillBoss { boss_type } => {
                let bosses: Vec<_> = context
                    .monsters
                    .iter()
                    .filter(|m| m.is_boss)
                    .filter(|m| boss_type.as_ref().map_or(true, |t| &m.monster_type == t))
                    .collect();
                if bosses.is_empty() {
                    return ObjectiveResult::error("No boss in scenario");
                }
                let killed = bosses.iter().filter(|m| m.is_dead).count() as u32;
                let target = bosses.len() as u32;
                ObjectiveResult::tally(killed, target, killed == target)
            }
            ObjectiveKind::SurviveRounds { rounds } => {
                let survived = context.stats.rounds_completed;
                let anyone_left = context.active_characters().next().is_some();
                ObjectiveResult::tally(survived, *rounds, survived >= *rounds && anyone_left)
                    .failed(!anyone_left)
            }
            ObjectiveKind::CollectLoot { amount } => {
                let collected = context.stats.total_loot_collected;
                ObjectiveResult::tally(collected, *amount, collected >= *amount)
            }
            ObjectiveKind::ReachLocation {
                hexes,
                all_characters,
            } => {
                let active: Vec<_> = context.active_characters().collect();
                let arrived = active.iter().filter(|c| hexes.contains(&c.position)).count() as u32;
                let target = if *all_characters { active.len() as u32 } else { 1 };
                ObjectiveResult::tally(arrived, target, !active.is_empty() && arrived >= target)
            }
            ObjectiveKind::ProtectNpc { npc_id } => match context.allies.iter().find(|a| a.id == *npc_id) {
                Some(npc) => {
                    let alive = !npc.is_dead;
                    ObjectiveResult::tally(
                        npc.current_health.max(0) as u32,
                        npc.max_health.max(0) as u32,
                        alive,
                    )
                    .failed(!alive)
                }
                None => ObjectiveResult::error(format!("NPC {} not found", npc_id)),
            },
            ObjectiveKind::TimeLimit { rounds } => {
                ObjectiveResult::tally(context.round, *rounds, context.round > *rounds)
            }
            ObjectiveKind::NoDamage => {
                let untouched = context.stats.total_damage_taken == 0;
                ObjectiveResult::tally(u32::from(untouched), 1, untouched).failed(!untouched)
            }
            ObjectiveKind::MinimumHealth { percent } => {
                let active: Vec<_> = context.active_characters().collect();
                let healthy = active
                    .iter()
                    .filter(|c| c.current_health as i64 * 100 >= *percent as i64 * c.max_health as i64)
                    .count() as u32;
                let target = active.len() as u32;
                ObjectiveResult::tally(healthy, target, target > 0 && healthy == target)
            }
            ObjectiveKind::CollectTreasure { treasure_ids } => {
                let relevant: Vec<_> = if treasure_ids.is_empty() {
                    context.treasures.iter().collect()
                } else {
                    if let Some(missing) = treasure_ids
                        .iter()
                        .find(|id| !context.treasures.iter().any(|t| &t.id == *id))
                    {
                        return ObjectiveResult::error(format!("Treasure {} not on board", missing));
                    }
                    context
                        .treasures
                        .iter()
                        .filter(|t| treasure_ids.contains(&t.id))
                        .collect()
                };
                if relevant.is_empty() {
                    return ObjectiveResult::error("No treasures to collect");
                }
                let collected = relevant.iter().filter(|t| t.collected).count() as u32;
                let target = relevant.len() as u32;
                ObjectiveResult::tally(collected, target, collected == target)
            }
            ObjectiveKind::Escape { exits } => {
                let active: Vec<_> = context.active_characters().collect();
                let escaped = active.iter().filter(|c| exits.contains(&c.position)).count() as u32;
                let target = active.len() as u32;
                ObjectiveResult::tally(escaped, target, target > 0 && escaped == target)
            }
            ObjectiveKind::Custom { predicate, params } => match self.registry.get(predicate) {
                Some(custom) => {
                    let outcome = custom.evaluate(context, params);
                    ObjectiveResult::tally(outcome.current, outcome.target, outcome.complete)
                        .failed(outcome.failed)
                }
                None => ObjectiveResult::error(format!("Unknown custom predicate: {}", predicate)),
            },
        }
    }
}

/// Fold a result into a progress entry and return the milestones crossed for
/// the first time. Each milestone is reported at most once.
pub fn record_progress(
    entry: &mut ObjectiveProgressEntry,
    result: &ObjectiveResult,
    milestones: &[u8],
) -> Vec<u8> {
    entry.current = result.progress.current;
    entry.target = result.progress.target;
    entry.percent = result.progress.percent;

    let mut thresholds = milestones.to_vec();
    thresholds.sort_unstable();
    thresholds.dedup();

    let mut crossed = Vec::new();
    for threshold in thresholds {
        if entry.percent < threshold {
            continue;
        }
        if !entry.milestones_reached.contains(&threshold) {
            entry.milestones_reached.push(threshold);
        }
        if !entry.notified_milestones.contains(&threshold) {
            entry.notified_milestones.push(threshold);
            crossed.push(threshold);
        }
    }
    crossed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::AccumulatedStats;
    use crate::domain::services::objective_context::{
        AllySnapshot, CharacterSnapshot, MonsterSnapshot, TreasureSnapshot,
    };
    use crate::domain::value_objects::{AxialCoord, EntityId};

    fn monster(monster_type: &str, dead: bool, boss: bool) -> MonsterSnapshot {
        MonsterSnapshot {
            id: EntityId::new(),
            monster_type: monster_type.into(),
            position: AxialCoord::new(2, 0),
            current_health: if dead { 0 } else { 5 },
            max_health: 5,
            is_dead: dead,
            is_elite: false,
            is_boss: boss,
        }
    }

    fn hero(q: i32, health: i32) -> CharacterSnapshot {
        CharacterSnapshot {
            id: EntityId::new(),
            name: "hero".into(),
            position: AxialCoord::new(q, 0),
            current_health: health,
            max_health: 10,
            conditions: vec![],
            is_dead: false,
            is_exhausted: false,
        }
    }

    fn evaluate(kind: ObjectiveKind, context: &EvaluationContext) -> ObjectiveResult {
        ObjectiveEvaluator::default().evaluate(&ObjectiveDefinition::new("o", kind), context)
    }

    #[test]
    fn test_kill_all_monsters_progress() {
        let mut context = EvaluationContext::empty(1);
        context.monsters = vec![
            monster("a", true, false),
            monster("a", false, false),
            monster("b", true, false),
            monster("b", true, false),
        ];
        let result = evaluate(ObjectiveKind::KillAllMonsters, &context);
        assert!(!result.complete);
        assert_eq!(result.progress, ObjectiveProgress { current: 3, target: 4, percent: 75 });

        context.monsters[1].is_dead = true;
        assert!(evaluate(ObjectiveKind::KillAllMonsters, &context).complete);
    }

    #[test]
    fn test_kill_all_monsters_without_monsters_is_an_error() {
        let result = evaluate(ObjectiveKind::KillAllMonsters, &EvaluationContext::empty(3));
        assert!(!result.complete);
        assert!(!result.failed);
        assert_eq!(result.error.as_deref(), Some("No monsters in context"));
    }

    #[test]
    fn test_evaluation_is_pure() {
        let mut context = EvaluationContext::empty(4);
        context.monsters = vec![monster("a", true, false), monster("a", false, false)];
        context.characters = vec![hero(0, 6)];
        let evaluator = ObjectiveEvaluator::default();
        for kind in [
            ObjectiveKind::KillAllMonsters,
            ObjectiveKind::SurviveRounds { rounds: 3 },
            ObjectiveKind::MinimumHealth { percent: 50 },
            ObjectiveKind::KillBoss { boss_type: None },
        ] {
            let def = ObjectiveDefinition::new("o", kind);
            assert_eq!(evaluator.evaluate(&def, &context), evaluator.evaluate(&def, &context));
        }
    }

    #[test]
    fn test_kill_monster_type_with_count() {
        let mut context = EvaluationContext::empty(1);
        context.monsters = vec![monster("guard", true, false), monster("guard", false, false)];
        let result = evaluate(
            ObjectiveKind::KillMonsterType {
                monster_type: "guard".into(),
                count: Some(1),
            },
            &context,
        );
        assert!(result.complete);

        let missing = evaluate(
            ObjectiveKind::KillMonsterType {
                monster_type: "ooze".into(),
                count: None,
            },
            &context,
        );
        assert!(!missing.complete);
        assert!(missing.error.is_some());
    }

    #[test]
    fn test_kill_boss() {
        let mut context = EvaluationContext::empty(1);
        context.monsters = vec![monster("captain", false, true), monster("guard", true, false)];
        let kind = ObjectiveKind::KillBoss { boss_type: None };
        assert!(!evaluate(kind.clone(), &context).complete);
        context.monsters[0].is_dead = true;
        assert!(evaluate(kind, &context).complete);
    }

    #[test]
    fn test_time_limit_completes_after_limit_passes() {
        let kind = ObjectiveKind::TimeLimit { rounds: 5 };
        assert!(!evaluate(kind.clone(), &EvaluationContext::empty(5)).complete);
        assert!(evaluate(kind, &EvaluationContext::empty(6)).complete);
    }

    #[test]
    fn test_no_damage_fails_once_hit() {
        let mut context = EvaluationContext::empty(1);
        assert!(evaluate(ObjectiveKind::NoDamage, &context).complete);
        context.stats = AccumulatedStats {
            total_damage_taken: 2,
            ..AccumulatedStats::default()
        };
        let result = evaluate(ObjectiveKind::NoDamage, &context);
        assert!(!result.complete);
        assert!(result.failed);
    }

    #[test]
    fn test_reach_location_and_escape() {
        let mut context = EvaluationContext::empty(1);
        context.characters = vec![hero(3, 10), hero(0, 10)];
        let exit = vec![AxialCoord::new(3, 0)];

        let any = evaluate(
            ObjectiveKind::ReachLocation {
                hexes: exit.clone(),
                all_characters: false,
            },
            &context,
        );
        assert!(any.complete);

        let escape = evaluate(ObjectiveKind::Escape { exits: exit }, &context);
        assert!(!escape.complete);
        assert_eq!(escape.progress.percent, 50);
    }

    #[test]
    fn test_minimum_health() {
        let mut context = EvaluationContext::empty(1);
        context.characters = vec![hero(0, 5), hero(1, 4)];
        let kind = ObjectiveKind::MinimumHealth { percent: 50 };
        let result = evaluate(kind, &context);
        assert!(!result.complete);
        assert_eq!(result.progress.current, 1);
    }

    #[test]
    fn test_protect_npc_fails_when_npc_dies() {
        let npc = AllySnapshot {
            id: EntityId::new(),
            name: "Merchant".into(),
            position: AxialCoord::new(0, 0),
            current_health: 0,
            max_health: 6,
            is_dead: true,
            owner_id: None,
        };
        let mut context = EvaluationContext::empty(2);
        context.allies = vec![npc.clone()];
        let result = evaluate(ObjectiveKind::ProtectNpc { npc_id: npc.id }, &context);
        assert!(result.failed);
        assert!(!result.complete);
    }

    #[test]
    fn test_collect_treasure_by_id() {
        let mut context = EvaluationContext::empty(1);
        context.treasures = vec![
            TreasureSnapshot {
                id: "t1".into(),
                position: AxialCoord::new(1, 0),
                collected: true,
            },
            TreasureSnapshot {
                id: "t2".into(),
                position: AxialCoord::new(2, 0),
                collected: false,
            },
        ];
        let one = evaluate(
            ObjectiveKind::CollectTreasure {
                treasure_ids: vec!["t1".into()],
            },
            &context,
        );
        assert!(one.complete);
        let all = evaluate(ObjectiveKind::CollectTreasure { treasure_ids: vec![] }, &context);
        assert_eq!(all.progress.percent, 50);
        let unknown = evaluate(
            ObjectiveKind::CollectTreasure {
                treasure_ids: vec!["t9".into()],
            },
            &context,
        );
        assert!(unknown.error.is_some());
    }

    #[test]
    fn test_custom_predicate_lookup() {
        let mut registry = CustomPredicateRegistry::new();
        registry.register("loot_on_board", |ctx: &EvaluationContext, _: &serde_json::Value| {
            PredicateOutcome {
                complete: ctx.loot_on_board == 0,
                current: 0,
                target: 1,
                failed: false,
            }
        });
        let evaluator = ObjectiveEvaluator::new(registry);
        let def = ObjectiveDefinition::new(
            "c",
            ObjectiveKind::Custom {
                predicate: "loot_on_board".into(),
                params: serde_json::Value::Null,
            },
        );
        assert!(evaluator.evaluate(&def, &EvaluationContext::empty(1)).complete);

        let unknown = ObjectiveDefinition::new(
            "u",
            ObjectiveKind::Custom {
                predicate: "nope".into(),
                params: serde_json::Value::Null,
            },
        );
        assert!(evaluator
            .evaluate(&unknown, &EvaluationContext::empty(1))
            .error
            .is_some());
    }

    #[test]
    fn test_milestones_reported_once() {
        let mut entry = ObjectiveProgressEntry::default();
        let milestones = [25, 50, 75, 100];

        let half = ObjectiveResult::tally(2, 4, false);
        assert_eq!(record_progress(&mut entry, &half, &milestones), vec![25, 50]);
        assert_eq!(record_progress(&mut entry, &half, &milestones), Vec::<u8>::new());

        let done = ObjectiveResult::tally(4, 4, true);
        assert_eq!(record_progress(&mut entry, &done, &milestones), vec![75, 100]);
        assert_eq!(entry.milestones_reached, vec![25, 50, 75, 100]);
    }
}
