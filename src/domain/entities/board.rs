//! Scenario board: hex terrain, loot tokens and treasures

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{AxialCoord, EntityId, LootId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    #[default]
    Normal,
    /// Costs two movement unless flying
    Difficult,
    Obstacle,
}

/// Serialized form of a single board hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardHex {
    pub q: i32,
    pub r: i32,
    #[serde(default)]
    pub terrain: Terrain,
}

/// The playable hexes of a scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<BoardHex>", into = "Vec<BoardHex>")]
pub struct BoardMap {
    hexes: HashMap<AxialCoord, Terrain>,
}

impl BoardMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A filled hexagon of the given radius around the origin
    pub fn hexagon(radius: i32) -> Self {
        let mut board = Self::new();
        for q in -radius..=radius {
            let r_min = (-radius).max(-q - radius);
            let r_max = radius.min(-q + radius);
            for r in r_min..=r_max {
                board.set(AxialCoord::new(q, r), Terrain::Normal);
            }
        }
        board
    }

    pub fn with_terrain(mut self, hex: AxialCoord, terrain: Terrain) -> Self {
        self.set(hex, terrain);
        self
    }

    pub fn set(&mut self, hex: AxialCoord, terrain: Terrain) {
        self.hexes.insert(hex, terrain);
    }

    pub fn contains(&self, hex: &AxialCoord) -> bool {
        self.hexes.contains_key(hex)
    }

    pub fn terrain(&self, hex: &AxialCoord) -> Option<Terrain> {
        self.hexes.get(hex).copied()
    }

    /// On the map and not blocked for a walker (or any hex for a flyer)
    pub fn is_passable(&self, hex: &AxialCoord, can_fly: bool) -> bool {
        match self.terrain(hex) {
            Some(Terrain::Obstacle) => can_fly,
            Some(_) => true,
            None => false,
        }
    }

    /// Whether a figure can end its movement on the hex
    pub fn can_stand_on(&self, hex: &AxialCoord) -> bool {
        matches!(self.terrain(hex), Some(Terrain::Normal | Terrain::Difficult))
    }

    pub fn move_cost(&self, hex: &AxialCoord, can_fly: bool) -> u32 {
        match self.terrain(hex) {
            Some(Terrain::Difficult) if !can_fly => 2,
            _ => 1,
        }
    }

    /// Movement spent walking a path (start hex excluded)
    pub fn path_cost(&self, path: &[AxialCoord], can_fly: bool) -> u32 {
        path.iter().map(|hex| self.move_cost(hex, can_fly)).sum()
    }

    pub fn hex_count(&self) -> usize {
        self.hexes.len()
    }
}

impl From<Vec<BoardHex>> for BoardMap {
    fn from(hexes: Vec<BoardHex>) -> Self {
        Self {
            hexes: hexes
                .into_iter()
                .map(|h| (AxialCoord::new(h.q, h.r), h.terrain))
                .collect(),
        }
    }
}

impl From<BoardMap> for Vec<BoardHex> {
    fn from(board: BoardMap) -> Self {
        let mut hexes: Vec<BoardHex> = board
            .hexes
            .into_iter()
            .map(|(coord, terrain)| BoardHex {
                q: coord.q,
                r: coord.r,
                terrain,
            })
            .collect();
        hexes.sort_by_key(|h| (h.q, h.r));
        hexes
    }
}

/// Loot dropped by a defeated monster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootToken {
    pub id: LootId,
    pub position: AxialCoord,
    pub gold: u32,
}

/// Scenario treasure placed on the board at setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasure {
    pub id: String,
    pub position: AxialCoord,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub collected_by: Option<EntityId>,
}

impl Treasure {
    pub fn is_collected(&self) -> bool {
        self.collected_by.is_some()
    }
}
