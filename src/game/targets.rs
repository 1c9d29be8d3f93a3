//! Target Tracking
//!
//! Counts satisfied box targets and gates the win condition. Every
//! mutating call notifies registered listeners synchronously with
//! `(current, total)`; the coordinator additionally publishes a
//! `TargetCountChanged` bus event once per committed move.

use std::cell::RefCell;
use std::rc::Rc;

use crate::game::level::LevelPair;

type TargetListener = Rc<RefCell<dyn FnMut(u32, u32)>>;

/// Handle for removing a target-count listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Satisfied/total box-target bookkeeping for the active level pair.
#[derive(Default)]
pub struct TargetTracker {
    current: u32,
    total: u32,
    next_listener_id: u64,
    listeners: Vec<(u64, TargetListener)>,
}

impl TargetTracker {
    /// Create with zero counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets currently satisfied.
    #[inline]
    pub fn current_targets(&self) -> u32 {
        self.current
    }

    /// Targets in the active level pair.
    #[inline]
    pub fn total_targets(&self) -> u32 {
        self.total
    }

    /// Overwrite the satisfied count.
    pub fn set_current_targets(&mut self, count: u32) {
        self.current = count;
        self.check_bounds();
        self.notify();
    }

    /// Overwrite the total count.
    pub fn set_total_targets(&mut self, count: u32) {
        self.total = count;
        self.check_bounds();
        self.notify();
    }

    /// A box landed on its matching target.
    pub fn increment_targets(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount);
        self.check_bounds();
        self.notify();
    }

    /// A box left its matching target.
    pub fn decrement_targets(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
        self.notify();
    }

    /// Recompute the total from a level pair and reset the satisfied count.
    pub fn load_level(&mut self, pair: &LevelPair) {
        use crate::game::grid::Side;
        use crate::game::level::ElementDef;

        let mut total = 0;
        for side in [Side::Left, Side::Right] {
            for def in &pair.side(side).elements {
                if matches!(def, ElementDef::BoxTarget { .. }) {
                    total += 1;
                }
            }
        }
        self.total = total;
        self.current = 0;
        self.notify();
    }

    /// Whether every box target is satisfied.
    #[inline]
    pub fn all_satisfied(&self) -> bool {
        self.current == self.total
    }

    /// Register a listener invoked synchronously on every count change.
    pub fn on_target_count_changed<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(u32, u32) + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Rc::new(RefCell::new(listener))));
        ListenerId(id)
    }

    /// Remove a previously registered listener.
    pub fn off_target_count_changed(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id.0);
    }

    fn check_bounds(&self) {
        debug_assert!(
            self.current <= self.total,
            "satisfied targets {} exceed total {}",
            self.current,
            self.total
        );
    }

    fn notify(&mut self) {
        let (current, total) = (self.current, self.total);
        // Snapshot so a listener may (un)register without invalidating
        // the iteration.
        let snapshot: Vec<TargetListener> =
            self.listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in snapshot {
            (&mut *listener.borrow_mut())(current, total);
        }
    }
}

impl std::fmt::Debug for TargetTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetTracker")
            .field("current", &self.current)
            .field("total", &self.total)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
