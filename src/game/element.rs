//! Level Elements
//!
//! Boxes, targets, and decorations, stored per side in an id-keyed arena.
//! Moving a box across the shared edge is a keyed remove/insert between the
//! two arenas, never an in-place list splice. BTreeMap keeps iteration
//! order deterministic.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::game::grid::Position;

/// Unique element identifier, allocated by the world from a monotonic
/// counter at level load. Ids stay stable for the lifetime of a level.
pub type ElementId = u32;

// =============================================================================
// ELEMENT VARIANTS
// =============================================================================

/// A pushable weighted box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxState {
    /// Unique box ID
    pub id: ElementId,

    /// Current tile position (side included)
    pub pos: Position,

    /// Weight transferred between sides when this box crosses
    pub weight: f32,

    /// Type tag matched against box targets
    pub box_type: String,
}

/// A target tile requiring a box of a specific type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxTarget {
    /// Tile this target occupies
    pub pos: Position,

    /// Required box type
    pub box_type: String,
}

/// The tile the actor must stand on to finish the level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerTarget {
    /// Tile this target occupies
    pub pos: Position,

    /// Marks the alternate win behavior (e.g. return to the first level)
    pub is_special: bool,
}

/// Purely cosmetic element kinds carried through the level data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DecorationKind {
    /// Glowing orb
    Orb = 0,
    /// Teleporter pad (visual only)
    Teleporter = 1,
}

/// A cosmetic element. Never affects occupancy or correctness.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    /// Tile this decoration sits on
    pub pos: Position,

    /// What to draw
    pub kind: DecorationKind,
}

/// Tagged element union.
///
/// One closed enum instead of run-time type tests over an untyped list;
/// the arena's accessors below are the typed queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Element {
    /// Pushable box
    Box(BoxState),
    /// Box target tile
    BoxTarget(BoxTarget),
    /// Player target tile
    PlayerTarget(PlayerTarget),
    /// Cosmetic element
    Decoration(Decoration),
}

// =============================================================================
// ARENA
// =============================================================================

/// One side's element collection, keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementArena {
    elements: BTreeMap<ElementId, Element>,
}

impl ElementArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove everything (level despawn).
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Insert an element under its id.
    pub fn insert(&mut self, id: ElementId, element: Element) {
        let previous = self.elements.insert(id, element);
        debug_assert!(previous.is_none(), "element id {} inserted twice", id);
    }

    /// Remove an element by id.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        self.elements.remove(&id)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the arena holds nothing.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate boxes in id order.
    pub fn boxes(&self) -> impl Iterator<Item = &BoxState> {
        self.elements.values().filter_map(|element| match element {
            Element::Box(b) => Some(b),
            _ => None,
        })
    }

    /// Iterate box targets in id order.
    pub fn box_targets(&self) -> impl Iterator<Item = &BoxTarget> {
        self.elements.values().filter_map(|element| match element {
            Element::BoxTarget(t) => Some(t),
            _ => None,
        })
    }

    /// Iterate player targets in id order.
    pub fn player_targets(&self) -> impl Iterator<Item = &PlayerTarget> {
        self.elements.values().filter_map(|element| match element {
            Element::PlayerTarget(t) => Some(t),
            _ => None,
        })
    }

    /// The box occupying `pos`, if any.
    ///
    /// At most one box may occupy a tile; the resolver guarantees it.
    pub fn box_at(&self, pos: Position) -> Option<&BoxState> {
        self.boxes().find(|b| b.pos == pos)
    }

    /// The box with the given id, if present on this side.
    pub fn box_by_id(&self, id: ElementId) -> Option<&BoxState> {
        match self.elements.get(&id) {
            Some(Element::Box(b)) => Some(b),
            _ => None,
        }
    }

    /// Mutable access to the box with the given id.
    pub fn box_by_id_mut(&mut self, id: ElementId) -> Option<&mut BoxState> {
        match self.elements.get_mut(&id) {
            Some(Element::Box(b)) => Some(b),
            _ => None,
        }
    }

    /// The box target at `pos`, if any.
    pub fn box_target_at(&self, pos: Position) -> Option<&BoxTarget> {
        self.box_targets().find(|t| t.pos == pos)
    }

    /// The player target at `pos`, if any.
    pub fn player_target_at(&self, pos: Position) -> Option<&PlayerTarget> {
        self.player_targets().find(|t| t.pos == pos)
    }

    /// Count of box targets on this side.
    pub fn box_target_count(&self) -> u32 {
        self.box_targets().count() as u32
    }

    /// Whether a box of the matching type sits on the target at `pos`.
    pub fn is_matching_box_on_target(&self, pos: Position) -> bool {
        match (self.box_at(pos), self.box_target_at(pos)) {
            (Some(b), Some(t)) => b.box_type == t.box_type,
            _ => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::grid::Side;

    fn make_box(id: ElementId, x: i32, y: i32, box_type: &str) -> Element {
        Element::Box(BoxState {
            id,
            pos: Position::new(x, y, Side::Left),
            weight: 0.5,
            box_type: box_type.to_string(),
        })
    }

    #[test]
    fn test_typed_queries() {
        let mut arena = ElementArena::new();
        arena.insert(1, make_box(1, 2, 3, "default"));
        arena.insert(2, Element::BoxTarget(BoxTarget {
            pos: Position::new(4, 4, Side::Left),
            box_type: "default".to_string(),
        }));
        arena.insert(3, Element::PlayerTarget(PlayerTarget {
            pos: Position::new(1, 1, Side::Left),
            is_special: false,
        }));

        assert_eq!(arena.boxes().count(), 1);
        assert_eq!(arena.box_target_count(), 1);
        assert_eq!(arena.player_targets().count(), 1);
        assert!(arena.box_at(Position::new(2, 3, Side::Left)).is_some());
        assert!(arena.box_at(Position::new(4, 4, Side::Left)).is_none());
        assert!(arena.box_target_at(Position::new(4, 4, Side::Left)).is_some());
        assert!(arena.player_target_at(Position::new(1, 1, Side::Left)).is_some());
    }

    #[test]
    fn test_matching_box_on_target_requires_type_match() {
        let mut arena = ElementArena::new();
        let pos = Position::new(2, 2, Side::Right);
        arena.insert(1, Element::BoxTarget(BoxTarget {
            pos,
            box_type: "dark".to_string(),
        }));
        arena.insert(2, Element::Box(BoxState {
            id: 2,
            pos,
            weight: 0.5,
            box_type: "default".to_string(),
        }));

        assert!(!arena.is_matching_box_on_target(pos));

        arena.box_by_id_mut(2).unwrap().box_type = "dark".to_string();
        assert!(arena.is_matching_box_on_target(pos));
    }

    #[test]
    fn test_side_transfer_is_keyed_remove_insert() {
        let mut left = ElementArena::new();
        let mut right = ElementArena::new();
        left.insert(5, make_box(5, 5, 3, "default"));

        let element = left.remove(5).unwrap();
        right.insert(5, element);

        assert!(left.box_by_id(5).is_none());
        assert!(right.box_by_id(5).is_some());
        assert!(left.is_empty());
    }

    #[test]
    fn test_iteration_order_is_id_order() {
        let mut arena = ElementArena::new();
        arena.insert(9, make_box(9, 0, 0, "a"));
        arena.insert(1, make_box(1, 1, 0, "b"));
        arena.insert(4, make_box(4, 2, 0, "c"));

        let ids: Vec<ElementId> = arena.boxes().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 4, 9]);
    }
}
