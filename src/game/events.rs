//! World Events
//!
//! Events published on the bus after the coordinator commits a change.
//! Both side-local views render from these; undo replays through the same
//! channel, so a view cannot tell forward play from rewinding.

use serde::{Serialize, Deserialize};

use crate::game::element::ElementId;
use crate::game::grid::Side;

/// Dispatch topic, one per event variant.
///
/// Subscriptions are per-topic so a view only sees the traffic it asked
/// for, while payloads stay a single closed enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Topic {
    /// Actor position changed
    PlayerMoved = 0,
    /// A box position changed
    BoxMoved = 1,
    /// A box switched element collections between sides
    BoxReassignedSide = 2,
    /// The seesaw weights changed
    WeightChanged = 3,
    /// Satisfied-target count changed
    TargetCountChanged = 4,
    /// The level was completed
    GameWon = 5,
}

/// Event payloads published by the world coordinator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// The actor now occupies the given tile.
    PlayerMoved {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
        /// Side the actor is on
        side: Side,
    },

    /// A box now occupies the given tile.
    BoxMoved {
        /// Identifier of the moved box
        box_id: ElementId,
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
        /// Side the box is on
        side: Side,
    },

    /// A box crossed the shared edge and changed element collections.
    BoxReassignedSide {
        /// Identifier of the crossing box
        box_id: ElementId,
        /// Side it left
        from_side: Side,
        /// Side it entered
        to_side: Side,
    },

    /// The seesaw weights changed.
    WeightChanged {
        /// New left weight
        left: f32,
        /// New right weight
        right: f32,
    },

    /// The satisfied box-target count changed.
    TargetCountChanged {
        /// Targets currently satisfied
        current: u32,
        /// Targets in the level pair
        total: u32,
    },

    /// Every box target is satisfied and the actor reached its own target.
    GameWon {
        /// Whether the reached player target carries the alternate win
        /// behavior (e.g. return to the first level)
        is_special: bool,
    },
}

impl WorldEvent {
    /// Topic this event dispatches on.
    pub fn topic(&self) -> Topic {
        match self {
            WorldEvent::PlayerMoved { .. } => Topic::PlayerMoved,
            WorldEvent::BoxMoved { .. } => Topic::BoxMoved,
            WorldEvent::BoxReassignedSide { .. } => Topic::BoxReassignedSide,
            WorldEvent::WeightChanged { .. } => Topic::WeightChanged,
            WorldEvent::TargetCountChanged { .. } => Topic::TargetCountChanged,
            WorldEvent::GameWon { .. } => Topic::GameWon,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
