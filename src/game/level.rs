//! Levels and Terrain
//!
//! Row-major tile maps, the read-only `TileQuery` contract the resolver
//! validates against, and serde-loadable level-pair definitions. Cell
//! values follow the source tilemap convention: `-1` is an open floor
//! tile, any value >= 0 is a solid tile index.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::element::DecorationKind;
use crate::game::grid::{Position, Side};

// =============================================================================
// TILE QUERY
// =============================================================================

/// Outcome of probing a tile.
///
/// Out-of-bounds and empty are deliberately distinct outcomes; nothing in
/// the core treats a tile beyond the grid as passable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileProbe {
    /// Outside the grid
    OutOfBounds = 0,
    /// Passable floor
    Open = 1,
    /// Impassable terrain
    Solid = 2,
}

/// Read-only tile-occupancy contract consumed by the movement resolver.
///
/// Backed by level/tilemap data; the core never mutates terrain.
pub trait TileQuery {
    /// Probe the tile at `(x, y)`.
    fn probe(&self, x: i32, y: i32) -> TileProbe;

    /// Number of tile columns. Crossings trigger at this boundary.
    fn grid_width(&self) -> i32;

    /// Number of tile rows.
    fn grid_height(&self) -> i32;
}

// =============================================================================
// SIDE MAP
// =============================================================================

/// One side's terrain grid, row-major.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SideMap {
    width: i32,
    height: i32,
    cells: Vec<i16>,
}

impl SideMap {
    /// An all-open map of the given dimensions.
    pub fn open(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![-1; (width.max(0) * height.max(0)) as usize],
        }
    }

    /// Build from row-major nested rows, validating the shape.
    pub fn from_rows(rows: &[Vec<i16>]) -> Result<Self, LevelError> {
        let height = rows.len() as i32;
        if height == 0 {
            return Err(LevelError::EmptyMap);
        }
        let width = rows[0].len() as i32;
        if width == 0 || rows.iter().any(|row| row.len() as i32 != width) {
            return Err(LevelError::RaggedRows);
        }
        let mut cells = Vec::with_capacity((width * height) as usize);
        for row in rows {
            cells.extend_from_slice(row);
        }
        Ok(Self { width, height, cells })
    }

    /// Overwrite a single cell (test and builder helper).
    pub fn set(&mut self, x: i32, y: i32, value: i16) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            self.cells[(y * self.width + x) as usize] = value;
        }
    }
}

impl TileQuery for SideMap {
    fn probe(&self, x: i32, y: i32) -> TileProbe {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return TileProbe::OutOfBounds;
        }
        if self.cells[(y * self.width + x) as usize] < 0 {
            TileProbe::Open
        } else {
            TileProbe::Solid
        }
    }

    fn grid_width(&self) -> i32 {
        self.width
    }

    fn grid_height(&self) -> i32 {
        self.height
    }
}

// =============================================================================
// LEVEL DEFINITIONS
// =============================================================================

/// Level-definition errors.
#[derive(Debug, Error)]
pub enum LevelError {
    /// Requested level index does not exist.
    #[error("unknown level index {0}")]
    UnknownLevel(usize),

    /// Tile rows do not form a rectangle.
    #[error("side map rows have inconsistent widths")]
    RaggedRows,

    /// A side has no tiles at all.
    #[error("side map is empty")]
    EmptyMap,

    /// An element lies outside its side's grid.
    #[error("element at ({x}, {y}) is out of bounds")]
    ElementOutOfBounds {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
    },

    /// A box was placed on solid terrain.
    #[error("box at ({x}, {y}) sits on solid terrain")]
    BoxOnSolid {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
    },

    /// Two boxes share a tile.
    #[error("two boxes occupy tile ({x}, {y})")]
    DuplicateBoxTile {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
    },

    /// The player start is not an open, box-free tile.
    #[error("player start at ({x}, {y}) is not an open tile")]
    BadPlayerStart {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
    },

    /// Malformed JSON definition.
    #[error("failed to parse level definition: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Seed description of one element, local to a side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementDef {
    /// A pushable box.
    Box {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
        /// Crossing weight
        #[serde(default = "default_box_weight")]
        weight: f32,
        /// Type tag matched against box targets
        #[serde(default = "default_box_type")]
        box_type: String,
    },
    /// A box target tile.
    BoxTarget {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
        /// Required box type
        #[serde(default = "default_box_type")]
        box_type: String,
    },
    /// The player's own target tile.
    PlayerTarget {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
        /// Alternate win behavior flag
        #[serde(default)]
        is_special: bool,
    },
    /// A cosmetic element.
    Decoration {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
        /// What to draw
        decoration: DecorationKind,
    },
}

fn default_box_weight() -> f32 {
    0.5
}

fn default_box_type() -> String {
    "default".to_string()
}

/// One side of a level pair: terrain plus element seeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SideLevel {
    /// Row-major terrain rows; `-1` open, >= 0 solid
    pub tiles: Vec<Vec<i16>>,

    /// Elements seeded onto this side
    #[serde(default)]
    pub elements: Vec<ElementDef>,
}

impl SideLevel {
    /// An all-open side of the given dimensions with no elements.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            tiles: vec![vec![-1; width]; height],
            elements: Vec::new(),
        }
    }

    /// Build the terrain map, validating the shape.
    pub fn build_map(&self) -> Result<SideMap, LevelError> {
        SideMap::from_rows(&self.tiles)
    }
}

/// Where the actor starts when the level loads.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStart {
    /// Tile column
    pub x: i32,
    /// Tile row
    pub y: i32,
    /// Starting side
    pub side: Side,
}

impl PlayerStart {
    /// As a world position.
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.side)
    }
}

fn default_initial_weight() -> f32 {
    1.0
}

/// Both halves of one puzzle, played simultaneously.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelPair {
    /// Left side definition
    pub left: SideLevel,

    /// Right side definition
    pub right: SideLevel,

    /// Actor spawn tile
    pub player_start: PlayerStart,

    /// Left seesaw weight after load
    #[serde(default = "default_initial_weight")]
    pub initial_left_weight: f32,

    /// Right seesaw weight after load
    #[serde(default = "default_initial_weight")]
    pub initial_right_weight: f32,
}

impl LevelPair {
    /// Side definition for `side`.
    pub fn side(&self, side: Side) -> &SideLevel {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Validate terrain shapes and element placement.
    pub fn validate(&self) -> Result<(), LevelError> {
        for side in [Side::Left, Side::Right] {
            let map = self.side(side).build_map()?;
            let mut box_tiles: Vec<(i32, i32)> = Vec::new();
            for def in &self.side(side).elements {
                let (x, y) = match def {
                    ElementDef::Box { x, y, .. }
                    | ElementDef::BoxTarget { x, y, .. }
                    | ElementDef::PlayerTarget { x, y, .. }
                    | ElementDef::Decoration { x, y, .. } => (*x, *y),
                };
                match map.probe(x, y) {
                    TileProbe::OutOfBounds => {
                        return Err(LevelError::ElementOutOfBounds { x, y });
                    }
                    TileProbe::Solid if matches!(def, ElementDef::Box { .. }) => {
                        return Err(LevelError::BoxOnSolid { x, y });
                    }
                    _ => {}
                }
                if let ElementDef::Box { x, y, .. } = def {
                    if box_tiles.contains(&(*x, *y)) {
                        return Err(LevelError::DuplicateBoxTile { x: *x, y: *y });
                    }
                    box_tiles.push((*x, *y));
                }
            }
        }

        let start = self.player_start;
        let start_map = self.side(start.side).build_map()?;
        let start_blocked = start_map.probe(start.x, start.y) != TileProbe::Open
            || self.side(start.side).elements.iter().any(|def| {
                matches!(def, ElementDef::Box { x, y, .. } if *x == start.x && *y == start.y)
            });
        if start_blocked {
            return Err(LevelError::BadPlayerStart { x: start.x, y: start.y });
        }
        Ok(())
    }
}

/// Ordered collection of level pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    /// Pairs in progression order
    pub levels: Vec<LevelPair>,
}

impl LevelSet {
    /// Parse a level set from JSON, validating every pair.
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let set: LevelSet = serde_json::from_str(json)?;
        for pair in &set.levels {
            pair.validate()?;
        }
        Ok(set)
    }

    /// The pair at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&LevelPair> {
        self.levels.get(index)
    }

    /// Number of level pairs.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the set holds no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The built-in demo pair: two open 6x7 grids, one box and target per
    /// side, player target on the right half.
    pub fn builtin() -> Self {
        let mut left = SideLevel::open(6, 7);
        left.elements = vec![
            ElementDef::Box { x: 3, y: 3, weight: 0.5, box_type: "default".to_string() },
            ElementDef::BoxTarget { x: 1, y: 3, box_type: "default".to_string() },
            ElementDef::Decoration { x: 1, y: 1, decoration: DecorationKind::Orb },
        ];

        let mut right = SideLevel::open(6, 7);
        right.elements = vec![
            ElementDef::Box { x: 2, y: 2, weight: 0.5, box_type: "dark".to_string() },
            ElementDef::BoxTarget { x: 4, y: 2, box_type: "dark".to_string() },
            ElementDef::PlayerTarget { x: 2, y: 3, is_special: false },
            ElementDef::Decoration { x: 4, y: 5, decoration: DecorationKind::Teleporter },
        ];

        let pair = LevelPair {
            left,
            right,
            player_start: PlayerStart { x: 4, y: 3, side: Side::Left },
            initial_left_weight: 1.0,
            initial_right_weight: 1.0,
        };
        debug_assert!(pair.validate().is_ok());
        Self { levels: vec![pair] }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_distinguishes_bounds_from_occupancy() {
        let mut map = SideMap::open(3, 3);
        map.set(1, 1, 7);

        assert_eq!(map.probe(0, 0), TileProbe::Open);
        assert_eq!(map.probe(1, 1), TileProbe::Solid);
        assert_eq!(map.probe(-1, 0), TileProbe::OutOfBounds);
        assert_eq!(map.probe(3, 0), TileProbe::OutOfBounds);
        assert_eq!(map.probe(0, 3), TileProbe::OutOfBounds);
    }

    #[test]
    fn test_from_rows_rejects_ragged_shapes() {
        assert!(matches!(
            SideMap::from_rows(&[vec![-1, -1], vec![-1]]),
            Err(LevelError::RaggedRows)
        ));
        assert!(matches!(SideMap::from_rows(&[]), Err(LevelError::EmptyMap)));
    }

    #[test]
    fn test_builtin_level_validates() {
        let set = LevelSet::builtin();
        assert_eq!(set.len(), 1);
        assert!(set.get(0).unwrap().validate().is_ok());
        assert!(set.get(1).is_none());
    }

    #[test]
    fn test_validation_rejects_box_on_solid() {
        let mut pair = LevelSet::builtin().levels.remove(0);
        pair.left.tiles[3][3] = 0; // solid under the left box
        assert!(matches!(pair.validate(), Err(LevelError::BoxOnSolid { x: 3, y: 3 })));
    }

    #[test]
    fn test_validation_rejects_duplicate_box_tiles() {
        let mut pair = LevelSet::builtin().levels.remove(0);
        pair.left.elements.push(ElementDef::Box {
            x: 3,
            y: 3,
            weight: 0.5,
            box_type: "dark".to_string(),
        });
        assert!(matches!(pair.validate(), Err(LevelError::DuplicateBoxTile { x: 3, y: 3 })));
    }

    #[test]
    fn test_validation_rejects_player_start_on_box() {
        let mut pair = LevelSet::builtin().levels.remove(0);
        pair.player_start = PlayerStart { x: 3, y: 3, side: Side::Left };
        assert!(matches!(pair.validate(), Err(LevelError::BadPlayerStart { x: 3, y: 3 })));
    }

    #[test]
    fn test_level_set_json_round_trip() {
        let set = LevelSet::builtin();
        let json = serde_json::to_string(&set).unwrap();
        let parsed = LevelSet::from_json(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_level_set_json_defaults() {
        let json = r#"{
            "levels": [{
                "left": {
                    "tiles": [[-1, -1], [-1, -1]],
                    "elements": [{"kind": "box", "x": 0, "y": 0}]
                },
                "right": {
                    "tiles": [[-1, -1], [-1, -1]]
                },
                "player_start": {"x": 1, "y": 1, "side": "Left"}
            }]
        }"#;
        let set = LevelSet::from_json(json).unwrap();
        let pair = set.get(0).unwrap();
        assert_eq!(pair.initial_left_weight, 1.0);
        assert_eq!(pair.initial_right_weight, 1.0);
        match &pair.left.elements[0] {
            ElementDef::Box { weight, box_type, .. } => {
                assert_eq!(*weight, 0.5);
                assert_eq!(box_type, "default");
            }
            other => panic!("expected box, got {:?}", other),
        }
    }
}
