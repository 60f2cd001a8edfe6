//! Hex pathfinder - Dijkstra over the scenario board
//!
//! Costs come from the board: difficult terrain costs two for walkers, one
//! for flyers. Ties resolve in neighbor direction order, so the same board
//! always yields the same path.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::application::ports::outbound::PathfindingPort;
use crate::domain::entities::BoardMap;
use crate::domain::value_objects::AxialCoord;

#[derive(Debug, Clone, Copy, Default)]
pub struct HexPathfinder;

impl HexPathfinder {
    /// Cheapest cost to every hex reachable from `from`, with predecessors.
    ///
    /// `goal` may be entered even when occupied. The search stops expanding
    /// past `budget` when one is given.
    fn search(
        from: AxialCoord,
        goal: Option<AxialCoord>,
        budget: Option<u32>,
        board: &BoardMap,
        can_fly: bool,
        occupied: &HashSet<AxialCoord>,
    ) -> (HashMap<AxialCoord, u32>, HashMap<AxialCoord, AxialCoord>) {
        let mut costs = HashMap::from([(from, 0)]);
        let mut previous = HashMap::new();
        let mut frontier = BinaryHeap::from([Reverse((0u32, from))]);

        while let Some(Reverse((cost, hex))) = frontier.pop() {
            if costs.get(&hex).map_or(false, |&best| cost > best) {
                continue;
            }
            if Some(hex) == goal {
                break;
            }
            for next in hex.neighbors() {
                if !board.is_passable(&next, can_fly) {
                    continue;
                }
                if occupied.contains(&next) && Some(next) != goal {
                    continue;
                }
                let next_cost = cost + board.move_cost(&next, can_fly);
                if budget.map_or(false, |limit| next_cost > limit) {
                    continue;
                }
                if costs.get(&next).map_or(true, |&best| next_cost < best) {
                    costs.insert(next, next_cost);
                    previous.insert(next, hex);
                    frontier.push(Reverse((next_cost, next)));
                }
            }
        }
        (costs, previous)
    }
}

impl PathfindingPort for HexPathfinder {
    fn find_path(
        &self,
        from: AxialCoord,
        to: AxialCoord,
        board: &BoardMap,
        can_fly: bool,
        occupied: &HashSet<AxialCoord>,
    ) -> Option<Vec<AxialCoord>> {
        if from == to {
            return Some(Vec::new());
        }
        if !board.is_passable(&to, can_fly) {
            return None;
        }

        let (_, previous) = Self::search(from, Some(to), None, board, can_fly, occupied);
        let mut path = vec![to];
        let mut current = to;
        while let Some(&step) = previous.get(&current) {
            if step == from {
                path.reverse();
                return Some(path);
            }
            path.push(step);
            current = step;
        }
        None
    }

    fn reachable_hexes(
        &self,
        from: AxialCoord,
        budget: u32,
        board: &BoardMap,
        can_fly: bool,
        occupied: &HashSet<AxialCoord>,
    ) -> Vec<AxialCoord> {
        let (costs, _) = Self::search(from, None, Some(budget), board, can_fly, occupied);
        let mut hexes: Vec<AxialCoord> = costs
            .into_keys()
            .filter(|hex| *hex != from && board.can_stand_on(hex))
            .collect();
        hexes.sort();
        hexes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Terrain;

    fn hex(q: i32, r: i32) -> AxialCoord {
        AxialCoord::new(q, r)
    }

    #[test]
    fn test_straight_path_excludes_start() {
        let board = BoardMap::hexagon(3);
        let path = HexPathfinder
            .find_path(hex(0, 0), hex(3, 0), &board, false, &HashSet::new())
            .unwrap();
        assert_eq!(path, vec![hex(1, 0), hex(2, 0), hex(3, 0)]);
    }

    #[test]
    fn test_path_detours_around_obstacle() {
        let board = BoardMap::hexagon(3).with_terrain(hex(1, 0), Terrain::Obstacle);
        let path = HexPathfinder
            .find_path(hex(0, 0), hex(2, 0), &board, false, &HashSet::new())
            .unwrap();
        assert_eq!(path.len(), 3);
        assert!(!path.contains(&hex(1, 0)));
    }

    #[test]
    fn test_flyer_crosses_obstacle() {
        let board = BoardMap::hexagon(3).with_terrain(hex(1, 0), Terrain::Obstacle);
        let path = HexPathfinder
            .find_path(hex(0, 0), hex(2, 0), &board, true, &HashSet::new())
            .unwrap();
        assert_eq!(path, vec![hex(1, 0), hex(2, 0)]);
    }

    #[test]
    fn test_difficult_terrain_costs_double() {
        let board = BoardMap::hexagon(3).with_terrain(hex(1, 0), Terrain::Difficult);
        let reachable = HexPathfinder.reachable_hexes(hex(0, 0), 1, &board, false, &HashSet::new());
        assert!(!reachable.contains(&hex(1, 0)));
        assert_eq!(reachable.len(), 5);
    }

    #[test]
    fn test_occupied_goal_is_reachable_but_not_passable() {
        let board = BoardMap::hexagon(3);
        let occupied = HashSet::from([hex(1, 0)]);
        let path = HexPathfinder
            .find_path(hex(0, 0), hex(1, 0), &board, false, &occupied)
            .unwrap();
        assert_eq!(path, vec![hex(1, 0)]);

        let around = HexPathfinder
            .find_path(hex(0, 0), hex(2, 0), &board, false, &occupied)
            .unwrap();
        assert!(!around.contains(&hex(1, 0)));

        let reachable = HexPathfinder.reachable_hexes(hex(0, 0), 2, &board, false, &occupied);
        assert!(!reachable.contains(&hex(1, 0)));
    }

    #[test]
    fn test_walled_in_has_no_path() {
        let origin = hex(0, 0);
        let mut board = BoardMap::hexagon(3);
        for neighbor in origin.neighbors() {
            board.set(neighbor, Terrain::Obstacle);
        }
        assert!(HexPathfinder
            .find_path(origin, hex(3, 0), &board, false, &HashSet::new())
            .is_none());
        assert!(HexPathfinder
            .reachable_hexes(origin, 4, &board, false, &HashSet::new())
            .is_empty());
    }
}
