//! Undo Log
//!
//! A stack of steps, each the list of reversible operations produced by
//! one accepted move. Operations are plain data: only what is needed to
//! restore state, never live references. The world replays them through
//! the same event bus as forward play.

use serde::{Serialize, Deserialize};

use crate::game::element::ElementId;
use crate::game::grid::{Direction, Position};

/// One reversible operation, captured before its state was mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum UndoOp {
    /// Restore the actor's tile and cosmetic facing.
    RestorePlayer {
        /// Pre-move position
        pos: Position,
        /// Pre-move facing
        facing: Direction,
    },

    /// Restore a box's tile (side included).
    RestoreBox {
        /// Which box
        box_id: ElementId,
        /// Pre-move position
        pos: Position,
    },

    /// Restore both seesaw weights.
    RestoreWeights {
        /// Pre-move left weight
        left: f32,
        /// Pre-move right weight
        right: f32,
    },

    /// Restore the target counters.
    RestoreTargetCounts {
        /// Pre-move satisfied count
        current: u32,
        /// Pre-move total count
        total: u32,
    },
}

/// Step-grouped undo stack.
///
/// Operations accumulate in an open buffer during one discrete move;
/// [`UndoLog::begin_new_step`] seals the buffer onto the stack. Undoing
/// yields a step's operations in reverse registration order, so effects
/// unwind last-applied-first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoLog {
    steps: Vec<Vec<UndoOp>>,
    current: Vec<UndoOp>,
}

impl UndoLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation to the open buffer.
    pub fn register(&mut self, op: UndoOp) {
        self.current.push(op);
    }

    /// Seal the open buffer onto the step stack.
    ///
    /// No-op when the buffer is empty, so rejected moves never produce
    /// empty steps.
    pub fn begin_new_step(&mut self) {
        if !self.current.is_empty() {
            self.steps.push(std::mem::take(&mut self.current));
        }
    }

    /// Pop the most recent step, in reverse registration order.
    ///
    /// Falls back to draining the still-open buffer when no step has been
    /// sealed yet. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Vec<UndoOp>> {
        let mut step = if let Some(step) = self.steps.pop() {
            step
        } else if !self.current.is_empty() {
            std::mem::take(&mut self.current)
        } else {
            return None;
        };
        step.reverse();
        Some(step)
    }

    /// Whether a step or open buffer remains.
    pub fn can_undo(&self) -> bool {
        !self.steps.is_empty() || !self.current.is_empty()
    }

    /// Number of sealed steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Number of operations in the open buffer.
    pub fn open_op_count(&self) -> usize {
        self.current.len()
    }

    /// Discard all steps and the open buffer (level transition).
    pub fn clear(&mut self) {
        self.steps.clear();
        self.current.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
