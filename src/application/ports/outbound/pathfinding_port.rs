//! Pathfinding port - Hex path search over a scenario board

use std::collections::HashSet;

use crate::domain::entities::BoardMap;
use crate::domain::value_objects::AxialCoord;

/// Path queries used by movement validation and the AI
///
/// Paths exclude the start hex and include the destination. Occupied hexes
/// block movement, except that `find_path` may end on an occupied goal so
/// distances to other figures can be measured.
pub trait PathfindingPort: Send + Sync {
    fn find_path(
        &self,
        from: AxialCoord,
        to: AxialCoord,
        board: &BoardMap,
        can_fly: bool,
        occupied: &HashSet<AxialCoord>,
    ) -> Option<Vec<AxialCoord>>;

    /// Hexes a figure can end its move on within the movement budget
    fn reachable_hexes(
        &self,
        from: AxialCoord,
        budget: u32,
        board: &BoardMap,
        can_fly: bool,
        occupied: &HashSet<AxialCoord>,
    ) -> Vec<AxialCoord>;
}
