//! Monster activations

use crate::application::ports::outbound::PathfindingPort;
use crate::domain::aggregates::Roster;
use crate::domain::entities::{BoardMap, Monster};
use crate::domain::value_objects::Condition;

use super::targeting::{plan_activation, ActorView, AiPlan, TargetCandidate};

/// Characters in play and living summons, minus anyone invisible
pub fn monster_targets(roster: &Roster) -> Vec<TargetCandidate> {
    let characters = roster.characters_in_play().map(|c| &c.core);
    let summons = roster.summons.iter().filter(|s| !s.core.is_dead).map(|s| &s.core);
    characters
        .chain(summons)
        .filter(|core| !core.has_condition(Condition::Invisible))
        .map(|core| TargetCandidate {
            id: core.id,
            position: core.position,
            current_health: core.current_health,
        })
        .collect()
}

pub fn plan_monster_turn(
    monster: &Monster,
    roster: &Roster,
    board: &BoardMap,
    pathfinder: &dyn PathfindingPort,
) -> Option<AiPlan> {
    let actor = ActorView::of(monster);
    let occupied = roster.occupied_hexes(Some(actor.id));
    plan_activation(&actor, &monster_targets(roster), board, &occupied, pathfinder)
}
