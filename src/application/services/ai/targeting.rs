//! Focus selection and movement planning shared by monsters and summons
//!
//! All choices are deterministic for a given board: ties fall back to lowest
//! health, then lowest entity id, then hex coordinate order.

use std::collections::HashSet;

use crate::application::ports::outbound::PathfindingPort;
use crate::domain::entities::{BoardMap, Combatant};
use crate::domain::value_objects::{AxialCoord, EntityId};

/// The acting figure as the AI sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorView {
    pub id: EntityId,
    pub position: AxialCoord,
    pub movement: u32,
    pub range: u32,
    pub can_fly: bool,
    pub can_move: bool,
    pub can_attack: bool,
}

impl ActorView {
    pub fn of<C: Combatant>(combatant: &C) -> Self {
        let profile = combatant.profile();
        let core = combatant.core();
        Self {
            id: core.id,
            position: core.position,
            movement: profile.movement,
            range: profile.range.max(1),
            can_fly: profile.can_fly,
            can_move: core.can_move(),
            can_attack: core.can_attack(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCandidate {
    pub id: EntityId,
    pub position: AxialCoord,
    pub current_health: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementPlan {
    pub destination: AxialCoord,
    pub path: Vec<AxialCoord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiPlan {
    pub target_id: EntityId,
    pub movement: Option<MovementPlan>,
    pub attack: bool,
}

/// Closest candidate by path length, falling back to hex distance when no
/// path exists
pub fn select_focus_target(
    actor_position: AxialCoord,
    can_fly: bool,
    candidates: &[TargetCandidate],
    board: &BoardMap,
    occupied: &HashSet<AxialCoord>,
    pathfinder: &dyn PathfindingPort,
) -> Option<EntityId> {
    candidates
        .iter()
        .map(|candidate| {
            let distance = pathfinder
                .find_path(actor_position, candidate.position, board, can_fly, occupied)
                .map(|path| path.len() as u32)
                .unwrap_or_else(|| actor_position.distance(&candidate.position));
            (distance, candidate.current_health, candidate.id)
        })
        .min()
        .map(|(_, _, id)| id)
}

/// Where to move to get at the target, if moving helps at all
pub fn determine_movement(
    actor: &ActorView,
    target: AxialCoord,
    board: &BoardMap,
    occupied: &HashSet<AxialCoord>,
    pathfinder: &dyn PathfindingPort,
) -> Option<MovementPlan> {
    if !actor.can_move || actor.movement == 0 {
        return None;
    }
    let current = actor.position.distance(&target);
    if current <= actor.range {
        return None;
    }

    let options: Vec<(AxialCoord, Vec<AxialCoord>, u32)> = pathfinder
        .reachable_hexes(actor.position, actor.movement, board, actor.can_fly, occupied)
        .into_iter()
        .filter_map(|hex| {
            let path = pathfinder.find_path(actor.position, hex, board, actor.can_fly, occupied)?;
            let cost = board.path_cost(&path, actor.can_fly);
            (cost <= actor.movement).then_some((hex, path, cost))
        })
        .collect();

    let in_range = options
        .iter()
        .filter(|(hex, _, _)| hex.distance(&target) <= actor.range)
        .min_by_key(|(hex, _, cost)| (*cost, *hex));
    let best = match in_range {
        Some(option) => option,
        None => options
            .iter()
            .min_by_key(|(hex, _, cost)| (hex.distance(&target), *cost, *hex))?,
    };

    if best.0.distance(&target) >= current {
        return None;
    }
    Some(MovementPlan {
        destination: best.0,
        path: best.1.clone(),
    })
}

pub fn should_attack(position: AxialCoord, target: AxialCoord, range: u32) -> bool {
    position.distance(&target) <= range
}

/// Full decision for one activation; `None` when nobody can be targeted
pub fn plan_activation(
    actor: &ActorView,
    candidates: &[TargetCandidate],
    board: &BoardMap,
    occupied: &HashSet<AxialCoord>,
    pathfinder: &dyn PathfindingPort,
) -> Option<AiPlan> {
    let target_id = select_focus_target(
        actor.position,
        actor.can_fly,
        candidates,
        board,
        occupied,
        pathfinder,
    )?;
    let target = candidates.iter().find(|c| c.id == target_id)?;

    let movement = determine_movement(actor, target.position, board, occupied, pathfinder);
    let final_position = movement
        .as_ref()
        .map_or(actor.position, |plan| plan.destination);
    let attack = actor.can_attack && should_attack(final_position, target.position, actor.range);

    Some(AiPlan {
        target_id,
        movement,
        attack,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Terrain;
    use crate::infrastructure::pathfinding::HexPathfinder;

    fn actor(position: AxialCoord, movement: u32, range: u32) -> ActorView {
        ActorView {
            id: EntityId::new(),
            position,
            movement,
            range,
            can_fly: false,
            can_move: true,
            can_attack: true,
        }
    }

    fn candidate(q: i32, r: i32, health: i32) -> TargetCandidate {
        TargetCandidate {
            id: EntityId::new(),
            position: AxialCoord::new(q, r),
            current_health: health,
        }
    }

    #[test]
    fn test_focus_prefers_closest_target() {
        let board = BoardMap::hexagon(4);
        let near = candidate(2, 0, 9);
        let far = candidate(-3, 0, 1);
        let occupied = HashSet::from([near.position, far.position]);
        let chosen = select_focus_target(
            AxialCoord::new(0, 0),
            false,
            &[far, near],
            &board,
            &occupied,
            &HexPathfinder,
        );
        assert_eq!(chosen, Some(near.id));
    }

    #[test]
    fn test_focus_tie_breaks_on_health_then_id() {
        let board = BoardMap::hexagon(4);
        let hurt = candidate(2, 0, 3);
        let healthy = candidate(-2, 0, 8);
        let chosen = select_focus_target(
            AxialCoord::new(0, 0),
            false,
            &[healthy, hurt],
            &board,
            &HashSet::new(),
            &HexPathfinder,
        );
        assert_eq!(chosen, Some(hurt.id));

        let a = candidate(2, 0, 5);
        let b = candidate(-2, 0, 5);
        let lowest = a.id.min(b.id);
        let chosen = select_focus_target(
            AxialCoord::new(0, 0),
            false,
            &[a, b],
            &board,
            &HashSet::new(),
            &HexPathfinder,
        );
        assert_eq!(chosen, Some(lowest));
    }

    #[test]
    fn test_no_candidates_means_no_plan() {
        let board = BoardMap::hexagon(2);
        let plan = plan_activation(
            &actor(AxialCoord::new(0, 0), 2, 1),
            &[],
            &board,
            &HashSet::new(),
            &HexPathfinder,
        );
        assert!(plan.is_none());
    }

    #[test]
    fn test_melee_actor_moves_adjacent_and_attacks() {
        let board = BoardMap::hexagon(4);
        let target = candidate(3, 0, 5);
        let occupied = HashSet::from([target.position]);
        let plan = plan_activation(
            &actor(AxialCoord::new(0, 0), 3, 1),
            &[target],
            &board,
            &occupied,
            &HexPathfinder,
        )
        .unwrap();

        let movement = plan.movement.unwrap();
        assert_eq!(movement.destination, AxialCoord::new(2, 0));
        assert_eq!(movement.path.len(), 2);
        assert!(plan.attack);
    }

    #[test]
    fn test_actor_in_range_stays_put() {
        let board = BoardMap::hexagon(4);
        let target = candidate(2, 0, 5);
        let plan = plan_activation(
            &actor(AxialCoord::new(0, 0), 3, 3),
            &[target],
            &board,
            &HashSet::from([target.position]),
            &HexPathfinder,
        )
        .unwrap();
        assert!(plan.movement.is_none());
        assert!(plan.attack);
    }

    #[test]
    fn test_short_move_closes_distance_without_attacking() {
        let board = BoardMap::hexagon(5);
        let target = candidate(5, 0, 5);
        let plan = plan_activation(
            &actor(AxialCoord::new(0, 0), 2, 1),
            &[target],
            &board,
            &HashSet::from([target.position]),
            &HexPathfinder,
        )
        .unwrap();
        assert_eq!(plan.movement.unwrap().destination.distance(&target.position), 3);
        assert!(!plan.attack);
    }

    #[test]
    fn test_boxed_in_actor_passes() {
        let origin = AxialCoord::new(0, 0);
        let mut board = BoardMap::hexagon(3);
        for hex in origin.neighbors() {
            board.set(hex, Terrain::Obstacle);
        }
        let target = candidate(3, 0, 5);
        let plan = plan_activation(
            &actor(origin, 3, 1),
            &[target],
            &board,
            &HashSet::from([target.position]),
            &HexPathfinder,
        )
        .unwrap();
        assert!(plan.movement.is_none());
        assert!(!plan.attack);
    }

    #[test]
    fn test_immobilized_actor_attacks_in_place_only() {
        let board = BoardMap::hexagon(3);
        let target = candidate(1, 0, 5);
        let mut view = actor(AxialCoord::new(0, 0), 3, 1);
        view.can_move = false;
        let plan = plan_activation(&view, &[target], &board, &HashSet::new(), &HexPathfinder).unwrap();
        assert!(plan.movement.is_none());
        assert!(plan.attack);
    }
}
