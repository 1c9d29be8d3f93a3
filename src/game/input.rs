//! Input Latch
//!
//! Edge bookkeeping between a raw keyboard poller and the coordinator.
//! One key-down edge yields at most one discrete step; holding a key does
//! not repeat. When several directions are pending at once, resolution
//! follows [`Direction::PRIORITY`] (left > right > up > down), never a
//! combined diagonal.

use serde::{Serialize, Deserialize};

use crate::game::grid::Direction;

/// Per-direction key-edge latch.
///
/// The external collaborator reports raw `press`/`release` transitions;
/// the game loop drains one step per frame via [`MoveLatch::take_step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLatch {
    held: [bool; 4],
    pending: [bool; 4],
}

impl MoveLatch {
    /// Create with no keys held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a key-down transition.
    ///
    /// Arms one pending step unless the key was already held (key repeat
    /// from the OS must not re-arm the latch).
    pub fn press(&mut self, direction: Direction) {
        let idx = direction as usize;
        if !self.held[idx] {
            self.held[idx] = true;
            self.pending[idx] = true;
        }
    }

    /// Report a key-up transition, disarming any pending step for it.
    pub fn release(&mut self, direction: Direction) {
        let idx = direction as usize;
        self.held[idx] = false;
        self.pending[idx] = false;
    }

    /// Whether a direction key is currently held.
    #[inline]
    pub fn is_held(&self, direction: Direction) -> bool {
        self.held[direction as usize]
    }

    /// Take the next discrete step, if one is armed.
    ///
    /// Consumes the highest-priority pending direction; the others stay
    /// armed for subsequent frames.
    pub fn take_step(&mut self) -> Option<Direction> {
        for direction in Direction::PRIORITY {
            let idx = direction as usize;
            if self.pending[idx] {
                self.pending[idx] = false;
                return Some(direction);
            }
        }
        None
    }

    /// Drop all held and pending state (e.g. on window focus loss).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// TESTS
// =============================================================================
