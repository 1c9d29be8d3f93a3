//! Weight Balance
//!
//! The seesaw model: one accumulated weight per side, and the derived
//! vertical offset between the two viewports. The signed difference also
//! drives the logical row shift applied when an entity crosses the shared
//! edge (see `game::movement`).

use serde::{Serialize, Deserialize};

use crate::game::grid::Side;
use crate::TILE_SIZE;

/// Largest weight difference reflected by the display offset.
///
/// The *logical* crossing shift is intentionally unclamped; only the
/// cosmetic pixel offset saturates, so the viewports stay on screen no
/// matter how lopsided the puzzle gets.
pub const MAX_WEIGHT_DIFF: f32 = 10.0;

/// Per-side accumulated weights and the derived seesaw offset.
///
/// Setters trigger no side effects; the coordinator publishes
/// `WeightChanged` after committing a move. All gameplay mutations funnel
/// through [`WeightBalance::transfer`], which keeps the pair zero-sum by
/// construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightBalance {
    left: f32,
    right: f32,
}

impl Default for WeightBalance {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl WeightBalance {
    /// Create with explicit starting weights.
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Current weight on the left side.
    #[inline]
    pub fn left_weight(&self) -> f32 {
        self.left
    }

    /// Current weight on the right side.
    #[inline]
    pub fn right_weight(&self) -> f32 {
        self.right
    }

    /// Overwrite the left weight.
    pub fn set_left_weight(&mut self, value: f32) {
        self.left = value;
    }

    /// Overwrite the right weight.
    pub fn set_right_weight(&mut self, value: f32) {
        self.right = value;
    }

    /// Reset both weights (level transition).
    pub fn reset(&mut self, left: f32, right: f32) {
        self.left = left;
        self.right = right;
    }

    /// Move `weight` onto `to`, taking it off the opposite side.
    ///
    /// The only gameplay mutation path; symmetric and zero-sum. A side may
    /// go negative when enough mass piles up opposite it; the seesaw just
    /// tilts further.
    pub fn transfer(&mut self, weight: f32, to: Side) {
        match to {
            Side::Left => {
                self.left += weight;
                self.right -= weight;
            }
            Side::Right => {
                self.right += weight;
                self.left -= weight;
            }
        }
    }

    /// Signed difference as seen from `from`: how many rows lower the
    /// opposite side sits when crossing out of `from`.
    #[inline]
    pub fn imbalance_from(&self, from: Side) -> f32 {
        match from {
            Side::Left => self.left - self.right,
            Side::Right => self.right - self.left,
        }
    }

    /// Logical row shift for a crossing out of `from`.
    ///
    /// Truncates toward zero; with half-unit box weights and the fixed
    /// half-unit actor shift the difference is always integral.
    #[inline]
    pub fn row_shift_from(&self, from: Side) -> i32 {
        self.imbalance_from(from).trunc() as i32
    }

    /// Cosmetic vertical offset in pixels between the two viewports.
    ///
    /// `tile_half_size * clamp(left - right, -MAX_WEIGHT_DIFF, MAX_WEIGHT_DIFF)`.
    /// Zero difference means a symmetric layout.
    pub fn delta_pixels(&self) -> f32 {
        let diff = (self.left - self.right).clamp(-MAX_WEIGHT_DIFF, MAX_WEIGHT_DIFF);
        TILE_SIZE / 2.0 * diff
    }

    /// Initial vertical position for both viewports at zero difference,
    /// centering them so each can travel half the maximum offset either way.
    pub fn initial_offset(&self) -> f32 {
        MAX_WEIGHT_DIFF * TILE_SIZE / 2.0
    }
}

// =============================================================================
// TESTS
// =============================================================================
