//! AI-controlled summon and ally activations

use crate::application::ports::outbound::PathfindingPort;
use crate::domain::aggregates::Roster;
use crate::domain::entities::{BoardMap, Summon};
use crate::domain::value_objects::Condition;

use super::targeting::{plan_activation, ActorView, AiPlan, TargetCandidate};

/// Living, visible monsters
pub fn summon_targets(roster: &Roster) -> Vec<TargetCandidate> {
    roster
        .monsters
        .iter()
        .map(|m| &m.core)
        .filter(|core| !core.is_dead && !core.has_condition(Condition::Invisible))
        .map(|core| TargetCandidate {
            id: core.id,
            position: core.position,
            current_health: core.current_health,
        })
        .collect()
}

pub fn plan_summon_turn(
    summon: &Summon,
    roster: &Roster,
    board: &BoardMap,
    pathfinder: &dyn PathfindingPort,
) -> Option<AiPlan> {
    let actor = ActorView::of(summon);
    let occupied = roster.occupied_hexes(Some(actor.id));
    plan_activation(&actor, &summon_targets(roster), board, &occupied, pathfinder)
}
