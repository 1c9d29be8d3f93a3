//! World Coordinator
//!
//! The single source of truth shared by both side-local views. Owns the
//! weights, the target counts, the undo log, the element arenas, and the
//! event bus; every mutation funnels through here. One discrete move
//! either fully commits or is fully rejected before control returns.

use thiserror::Error;
use tracing::debug;

use crate::core::bus::EventBus;
use crate::core::hash::{compute_world_hash, StateHash};
use crate::core::weight::WeightBalance;
use crate::game::element::{
    BoxState, BoxTarget, Decoration, Element, ElementArena, ElementId, PlayerTarget,
};
use crate::game::events::WorldEvent;
use crate::game::grid::{Direction, Position, Side, SidePair};
use crate::game::level::{ElementDef, LevelError, LevelSet, SideMap};
use crate::game::movement::{resolve_move, MoveContext, MovePlan, MoveResolution, RejectReason, SideView};
use crate::game::targets::TargetTracker;
use crate::game::undo::{UndoLog, UndoOp};
use crate::PLAYER_CROSSING_WEIGHT;

// =============================================================================
// STATE TYPES
// =============================================================================

/// The one player token. Lives in the world, not in either side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorState {
    /// Canonical tile position
    pub pos: Position,

    /// Last committed move direction; cosmetic orientation only
    pub facing: Direction,
}

/// One side's terrain plus element arena.
#[derive(Clone, Debug, Default)]
pub struct SideState {
    /// Static terrain for the active level
    pub terrain: SideMap,

    /// Boxes, targets, and decorations on this side
    pub elements: ElementArena,
}

/// Outcome of an `attempt_move` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move committed.
    Committed {
        /// Whether the actor crossed the shared edge
        player_crossed: bool,
        /// Number of boxes pushed
        boxes_pushed: usize,
    },
    /// The move was a no-op; nothing mutated.
    Rejected(RejectReason),
}

/// Programming-error conditions that can never arise from legal play.
///
/// Distinct from [`RejectReason`]: a rejected move is a normal outcome,
/// an invariant violation is a bug.
#[derive(Debug, Error)]
pub enum InvariantViolation {
    /// Two boxes resolved to the same tile.
    #[error("two boxes occupy ({x}, {y}) on {side:?}")]
    DoubleOccupancy {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
        /// Side of the collision
        side: Side,
    },

    /// More targets satisfied than exist.
    #[error("satisfied target count {current} exceeds total {total}")]
    TargetCountOverflow {
        /// Satisfied count
        current: u32,
        /// Total count
        total: u32,
    },
}

// =============================================================================
// WORLD
// =============================================================================

/// Authoritative puzzle state and the coordinator of every mutation.
pub struct World {
    bus: EventBus,
    weights: WeightBalance,
    tracker: TargetTracker,
    undo: UndoLog,
    levels: LevelSet,
    sides: SidePair<SideState>,
    actor: ActorState,
    current_level: Option<usize>,
    next_element_id: ElementId,
    won: bool,
}

impl World {
    /// Create a world over a level set. No level is loaded yet.
    pub fn new(levels: LevelSet) -> Self {
        Self {
            bus: EventBus::new(),
            weights: WeightBalance::default(),
            tracker: TargetTracker::new(),
            undo: UndoLog::new(),
            levels,
            sides: SidePair::default(),
            actor: ActorState {
                pos: Position::new(0, 0, Side::Left),
                facing: Direction::Right,
            },
            current_level: None,
            next_element_id: 1,
            won: false,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The event bus views subscribe on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Current seesaw weights.
    pub fn weights(&self) -> &WeightBalance {
        &self.weights
    }

    /// Target counters.
    pub fn targets(&self) -> &TargetTracker {
        &self.tracker
    }

    /// Mutable target counters (listener registration).
    pub fn targets_mut(&mut self) -> &mut TargetTracker {
        &mut self.tracker
    }

    /// The actor.
    pub fn actor(&self) -> &ActorState {
        &self.actor
    }

    /// One side's terrain and elements.
    pub fn side(&self, side: Side) -> &SideState {
        self.sides.get(side)
    }

    /// Index of the loaded level, if any.
    pub fn current_level(&self) -> Option<usize> {
        self.current_level
    }

    /// Whether the loaded level has been won.
    pub fn has_won(&self) -> bool {
        self.won
    }

    /// Whether any step can be undone.
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    // -------------------------------------------------------------------------
    // Level lifecycle
    // -------------------------------------------------------------------------

    /// Load the level pair at `index`.
    ///
    /// Performs the whole level-transition contract: despawns the previous
    /// pair, repopulates both arenas, recounts targets, resets the seesaw
    /// to the pair's initial weights, clears the undo log, and resets the
    /// win latch.
    pub fn load_level(&mut self, index: usize) -> Result<(), LevelError> {
        let pair = self
            .levels
            .get(index)
            .ok_or(LevelError::UnknownLevel(index))?
            .clone();
        pair.validate()?;

        self.despawn_level();
        for side in [Side::Left, Side::Right] {
            self.sides.get_mut(side).terrain = pair.side(side).build_map()?;
            for def in &pair.side(side).elements {
                let id = self.next_element_id;
                self.next_element_id += 1;
                let element = Self::element_from_def(id, def, side);
                self.sides.get_mut(side).elements.insert(id, element);
            }
        }

        self.actor = ActorState {
            pos: pair.player_start.position(),
            facing: Direction::Right,
        };
        self.tracker.load_level(&pair);
        self.weights
            .reset(pair.initial_left_weight, pair.initial_right_weight);
        self.undo.clear();
        self.won = false;
        self.current_level = Some(index);

        debug!(level = index, targets = self.tracker.total_targets(), "level loaded");

        // Sync both views with the freshly loaded state.
        self.bus.publish(&WorldEvent::WeightChanged {
            left: self.weights.left_weight(),
            right: self.weights.right_weight(),
        });
        self.bus.publish(&WorldEvent::TargetCountChanged {
            current: self.tracker.current_targets(),
            total: self.tracker.total_targets(),
        });
        self.bus.publish(&WorldEvent::PlayerMoved {
            x: self.actor.pos.x,
            y: self.actor.pos.y,
            side: self.actor.pos.side,
        });
        Ok(())
    }

    /// Clear the element arenas.
    ///
    /// Deliberately narrow: weights and the undo log are reset by
    /// `load_level`, which callers use for an actual level transition.
    pub fn despawn_level(&mut self) {
        self.sides.left.elements.clear();
        self.sides.right.elements.clear();
        self.current_level = None;
    }

    fn element_from_def(id: ElementId, def: &ElementDef, side: Side) -> Element {
        match def {
            ElementDef::Box { x, y, weight, box_type } => Element::Box(BoxState {
                id,
                pos: Position::new(*x, *y, side),
                weight: *weight,
                box_type: box_type.clone(),
            }),
            ElementDef::BoxTarget { x, y, box_type } => Element::BoxTarget(BoxTarget {
                pos: Position::new(*x, *y, side),
                box_type: box_type.clone(),
            }),
            ElementDef::PlayerTarget { x, y, is_special } => Element::PlayerTarget(PlayerTarget {
                pos: Position::new(*x, *y, side),
                is_special: *is_special,
            }),
            ElementDef::Decoration { x, y, decoration } => Element::Decoration(Decoration {
                pos: Position::new(*x, *y, side),
                kind: *decoration,
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Attempt one discrete move.
    ///
    /// On success the world mutates, undo operations are recorded and
    /// sealed as one step, and events are published. On rejection nothing
    /// happens at all: no state change, no undo entry, no event.
    pub fn attempt_move(&mut self, direction: Direction) -> MoveOutcome {
        let resolution = {
            let ctx = MoveContext::new(
                SideView {
                    tiles: &self.sides.left.terrain,
                    boxes: &self.sides.left.elements,
                },
                SideView {
                    tiles: &self.sides.right.terrain,
                    boxes: &self.sides.right.elements,
                },
                &self.weights,
            );
            resolve_move(&ctx, self.actor.pos, direction)
        };

        let plan = match resolution {
            MoveResolution::Rejected(reason) => return MoveOutcome::Rejected(reason),
            MoveResolution::Plan(plan) => plan,
        };

        self.commit(plan)
    }

    fn commit(&mut self, plan: MovePlan) -> MoveOutcome {
        let pre_left = self.weights.left_weight();
        let pre_right = self.weights.right_weight();
        let pre_current = self.tracker.current_targets();
        let pre_total = self.tracker.total_targets();

        // Capture the inverse before mutating anything.
        self.undo.register(UndoOp::RestoreTargetCounts {
            current: pre_current,
            total: pre_total,
        });
        self.undo.register(UndoOp::RestoreWeights { left: pre_left, right: pre_right });
        for bm in &plan.box_moves {
            self.undo.register(UndoOp::RestoreBox { box_id: bm.box_id, pos: bm.from });
        }
        self.undo.register(UndoOp::RestorePlayer {
            pos: self.actor.pos,
            facing: self.actor.facing,
        });

        // Relocate boxes furthest-first; weights evolve as crossings land.
        for bm in &plan.box_moves {
            let was_on = self
                .sides
                .get(bm.from.side)
                .elements
                .is_matching_box_on_target(bm.from);

            self.relocate_box(bm.box_id, bm.from.side, bm.to);
            if bm.crossed() {
                self.weights.transfer(bm.weight, bm.to.side);
            }

            let is_on = self
                .sides
                .get(bm.to.side)
                .elements
                .is_matching_box_on_target(bm.to);
            if !was_on && is_on {
                self.tracker.increment_targets(1);
            } else if was_on && !is_on {
                self.tracker.decrement_targets(1);
            }

            self.bus.publish(&WorldEvent::BoxMoved {
                box_id: bm.box_id,
                x: bm.to.x,
                y: bm.to.y,
                side: bm.to.side,
            });
            if bm.crossed() {
                self.bus.publish(&WorldEvent::BoxReassignedSide {
                    box_id: bm.box_id,
                    from_side: bm.from.side,
                    to_side: bm.to.side,
                });
            }
        }

        // The actor lands on its latched destination.
        self.actor.pos = plan.player_to;
        self.actor.facing = plan.direction;
        if plan.player_crossed() {
            self.weights.transfer(PLAYER_CROSSING_WEIGHT, plan.player_to.side);
        }
        self.bus.publish(&WorldEvent::PlayerMoved {
            x: self.actor.pos.x,
            y: self.actor.pos.y,
            side: self.actor.pos.side,
        });

        self.undo.begin_new_step();

        if self.weights.left_weight() != pre_left || self.weights.right_weight() != pre_right {
            self.bus.publish(&WorldEvent::WeightChanged {
                left: self.weights.left_weight(),
                right: self.weights.right_weight(),
            });
        }
        if self.tracker.current_targets() != pre_current
            || self.tracker.total_targets() != pre_total
        {
            self.bus.publish(&WorldEvent::TargetCountChanged {
                current: self.tracker.current_targets(),
                total: self.tracker.total_targets(),
            });
        }

        debug_assert!(self.check_invariants().is_ok());

        self.evaluate_win();

        MoveOutcome::Committed {
            player_crossed: plan.player_crossed(),
            boxes_pushed: plan.box_moves.len(),
        }
    }

    fn relocate_box(&mut self, box_id: ElementId, from_side: Side, to: Position) {
        if from_side == to.side {
            if let Some(b) = self.sides.get_mut(from_side).elements.box_by_id_mut(box_id) {
                b.pos = to;
            }
        } else {
            let element = self.sides.get_mut(from_side).elements.remove(box_id);
            if let Some(Element::Box(mut b)) = element {
                b.pos = to;
                self.sides.get_mut(to.side).elements.insert(box_id, Element::Box(b));
            }
        }
    }

    fn evaluate_win(&mut self) {
        if self.won || !self.tracker.all_satisfied() {
            return;
        }
        let target = self
            .sides
            .get(self.actor.pos.side)
            .elements
            .player_target_at(self.actor.pos);
        if let Some(target) = target {
            let is_special = target.is_special;
            self.won = true;
            self.bus.publish(&WorldEvent::GameWon { is_special });
        }
    }

    // -------------------------------------------------------------------------
    // Undo
    // -------------------------------------------------------------------------

    /// Undo the most recent step. Returns false when there is nothing to
    /// undo.
    ///
    /// Inverse operations replay through the same bus as forward play, so
    /// views update identically either way.
    pub fn undo(&mut self) -> bool {
        let ops = match self.undo.undo() {
            Some(ops) => ops,
            None => return false,
        };
        for op in ops {
            self.apply_undo_op(op);
        }

        // Rewinding past the winning move re-arms the win latch.
        if self.won && !self.is_win_position() {
            self.won = false;
        }
        true
    }

    /// Undo every step back to the state right after the last level load.
    pub fn restart(&mut self) {
        while self.undo() {}
    }

    fn is_win_position(&self) -> bool {
        self.tracker.all_satisfied()
            && self
                .sides
                .get(self.actor.pos.side)
                .elements
                .player_target_at(self.actor.pos)
                .is_some()
    }

    fn apply_undo_op(&mut self, op: UndoOp) {
        match op {
            UndoOp::RestorePlayer { pos, facing } => {
                self.actor = ActorState { pos, facing };
                self.bus.publish(&WorldEvent::PlayerMoved {
                    x: pos.x,
                    y: pos.y,
                    side: pos.side,
                });
            }
            UndoOp::RestoreBox { box_id, pos } => {
                let from_side = if self.sides.left.elements.box_by_id(box_id).is_some() {
                    Side::Left
                } else {
                    Side::Right
                };
                debug_assert!(
                    self.sides.get(from_side).elements.box_by_id(box_id).is_some(),
                    "undo references unknown box {}",
                    box_id
                );

                self.relocate_box(box_id, from_side, pos);
                self.bus.publish(&WorldEvent::BoxMoved {
                    box_id,
                    x: pos.x,
                    y: pos.y,
                    side: pos.side,
                });
                if from_side != pos.side {
                    self.bus.publish(&WorldEvent::BoxReassignedSide {
                        box_id,
                        from_side,
                        to_side: pos.side,
                    });
                }
            }
            UndoOp::RestoreWeights { left, right } => {
                self.weights.reset(left, right);
                self.bus.publish(&WorldEvent::WeightChanged { left, right });
            }
            UndoOp::RestoreTargetCounts { current, total } => {
                self.tracker.set_total_targets(total);
                self.tracker.set_current_targets(current);
                self.bus.publish(&WorldEvent::TargetCountChanged { current, total });
            }
        }
    }

    // -------------------------------------------------------------------------
    // Verification
    // -------------------------------------------------------------------------

    /// Check the hard state invariants.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for side in [Side::Left, Side::Right] {
            let mut seen = std::collections::BTreeSet::new();
            for b in self.sides.get(side).elements.boxes() {
                if !seen.insert(b.pos) {
                    return Err(InvariantViolation::DoubleOccupancy {
                        x: b.pos.x,
                        y: b.pos.y,
                        side,
                    });
                }
            }
        }
        if self.tracker.current_targets() > self.tracker.total_targets() {
            return Err(InvariantViolation::TargetCountOverflow {
                current: self.tracker.current_targets(),
                total: self.tracker.total_targets(),
            });
        }
        Ok(())
    }

    /// Deterministic fingerprint of the undoable state: actor, boxes,
    /// weights, and target counts. The win latch is presentation-flow
    /// state and deliberately excluded.
    pub fn world_hash(&self) -> StateHash {
        compute_world_hash(|h| {
            h.update_u32(self.current_level.map(|i| i as u32).unwrap_or(u32::MAX));
            h.update_i32(self.actor.pos.x);
            h.update_i32(self.actor.pos.y);
            h.update_u8(self.actor.pos.side as u8);
            h.update_u8(self.actor.facing as u8);
            h.update_f32(self.weights.left_weight());
            h.update_f32(self.weights.right_weight());
            h.update_u32(self.tracker.current_targets());
            h.update_u32(self.tracker.total_targets());
            for side in [Side::Left, Side::Right] {
                let arena = &self.sides.get(side).elements;
                h.update_u32(arena.len() as u32);
                for b in arena.boxes() {
                    h.update_u32(b.id);
                    h.update_i32(b.pos.x);
                    h.update_i32(b.pos.y);
                    h.update_u8(b.pos.side as u8);
                    h.update_f32(b.weight);
                    h.update_str(&b.box_type);
                }
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
