//! Movement Resolution
//!
//! Computes the destination of a directional move for the actor and for
//! any contiguous chain of boxes in front of it, including side-crossing
//! remaps and the weight-shifted landing row. Resolution is pure: it reads
//! terrain, box occupancy, and weights, and either rejects the move or
//! returns a plan for the coordinator to apply verbatim.

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::core::weight::WeightBalance;
use crate::game::element::{BoxState, ElementArena, ElementId};
use crate::game::grid::{Direction, Position, Side, SidePair};
use crate::game::level::{TileProbe, TileQuery};

// =============================================================================
// CONTEXT
// =============================================================================

/// Read-only view of one side used during resolution.
pub struct SideView<'a> {
    /// Terrain probe for this side
    pub tiles: &'a dyn TileQuery,
    /// Element collection for this side
    pub boxes: &'a ElementArena,
}

/// Everything resolution is allowed to read.
pub struct MoveContext<'a> {
    sides: SidePair<SideView<'a>>,
    weights: &'a WeightBalance,
}

impl<'a> MoveContext<'a> {
    /// Assemble a context from both side views and the current weights.
    pub fn new(left: SideView<'a>, right: SideView<'a>, weights: &'a WeightBalance) -> Self {
        Self { sides: SidePair::new(left, right), weights }
    }

    fn probe(&self, pos: Position) -> TileProbe {
        self.sides.get(pos.side).tiles.probe(pos.x, pos.y)
    }

    fn box_at(&self, pos: Position) -> Option<&BoxState> {
        self.sides.get(pos.side).boxes.box_at(pos)
    }

    fn widths(&self) -> SidePair<i32> {
        SidePair::new(
            self.sides.left.tiles.grid_width(),
            self.sides.right.tiles.grid_width(),
        )
    }

    fn all_box_positions(&self) -> BTreeSet<Position> {
        self.sides
            .left
            .boxes
            .boxes()
            .chain(self.sides.right.boxes.boxes())
            .map(|b| b.pos)
            .collect()
    }
}

// =============================================================================
// CROSSING
// =============================================================================

/// One step from `pos` in `direction`, remapping across the shared edge.
///
/// Leaving the left side past its last column lands in the right side's
/// first column; leaving the right side before its first column lands in
/// the left side's last column. The landing row shifts by the signed,
/// unclamped weight difference as seen from the departed side. All other
/// edges do not wrap; the resulting position may be out of bounds and
/// must be probed by the caller.
pub fn crossing_step(
    pos: Position,
    direction: Direction,
    widths: &SidePair<i32>,
    weights: &WeightBalance,
) -> Position {
    let (dx, dy) = direction.delta();
    let x = pos.x + dx;
    let y = pos.y + dy;
    match pos.side {
        Side::Left if x >= widths.left => Position::new(
            0,
            y + weights.row_shift_from(Side::Left),
            Side::Right,
        ),
        Side::Right if x < 0 => Position::new(
            widths.right - 1,
            y + weights.row_shift_from(Side::Right),
            Side::Left,
        ),
        side => Position::new(x, y, side),
    }
}

// =============================================================================
// RESOLUTION RESULT
// =============================================================================

/// Why a move did not happen. A normal outcome, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Destination tile (after any crossing remap) is outside the grid.
    OutOfBounds,
    /// Destination tile is impassable terrain.
    SolidTerrain,
    /// A pushed chain has nowhere to go.
    BlockedChain,
}

/// One box relocation within a plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedBoxMove {
    /// Which box
    pub box_id: ElementId,
    /// Its crossing weight
    pub weight: f32,
    /// Tile it leaves
    pub from: Position,
    /// Tile it lands on
    pub to: Position,
}

impl PlannedBoxMove {
    /// Whether this relocation crosses the shared edge.
    #[inline]
    pub fn crossed(&self) -> bool {
        self.from.side != self.to.side
    }
}

/// A fully validated move, ready to be applied verbatim.
///
/// `box_moves` is in application order: the box furthest along the push
/// direction first, so no relocation ever lands on a tile still occupied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovePlan {
    /// Direction that produced this plan (becomes the actor's facing)
    pub direction: Direction,
    /// Actor tile before the move
    pub player_from: Position,
    /// Actor tile after the move
    pub player_to: Position,
    /// Box relocations, furthest first
    pub box_moves: Vec<PlannedBoxMove>,
}

impl MovePlan {
    /// Whether the actor crosses the shared edge.
    #[inline]
    pub fn player_crossed(&self) -> bool {
        self.player_from.side != self.player_to.side
    }
}

/// Outcome of resolving one directional input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MoveResolution {
    /// The move cannot happen; nothing may mutate.
    Rejected(RejectReason),
    /// The move is valid; apply the plan.
    Plan(MovePlan),
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Resolve a directional move for the actor at `actor`.
///
/// The actor's destination is latched here, with the weights as they are
/// now; pushed boxes relocate before the actor lands, and each box's own
/// landing row is re-evaluated with the weights live at its relocation
/// (an earlier crossing in the same chain shifts where the boxes behind
/// it land).
pub fn resolve_move(
    ctx: &MoveContext<'_>,
    actor: Position,
    direction: Direction,
) -> MoveResolution {
    let widths = ctx.widths();
    let player_to = crossing_step(actor, direction, &widths, ctx.weights);

    match ctx.probe(player_to) {
        TileProbe::OutOfBounds => return MoveResolution::Rejected(RejectReason::OutOfBounds),
        TileProbe::Solid => return MoveResolution::Rejected(RejectReason::SolidTerrain),
        TileProbe::Open => {}
    }

    // Collect the maximal contiguous run of boxes ahead of the actor,
    // applying the crossing remap at every step.
    let mut chain: Vec<(ElementId, f32, Position)> = Vec::new();
    let mut cursor = player_to;
    while let Some(b) = ctx.box_at(cursor) {
        if chain.iter().any(|(id, _, _)| *id == b.id) {
            // The chain wrapped the torus back onto itself: a full ring
            // of boxes can never move.
            return MoveResolution::Rejected(RejectReason::BlockedChain);
        }
        chain.push((b.id, b.weight, cursor));
        cursor = crossing_step(cursor, direction, &widths, ctx.weights);
    }

    // Simulate application furthest-box-first. Weights evolve as crossing
    // boxes relocate, so each box's landing tile is derived from the
    // weights at its own turn.
    let mut sim_weights = ctx.weights.clone();
    let mut occupied = ctx.all_box_positions();
    let mut box_moves = Vec::with_capacity(chain.len());
    for &(box_id, weight, from) in chain.iter().rev() {
        let to = crossing_step(from, direction, &widths, &sim_weights);
        match ctx.probe(to) {
            TileProbe::Open => {}
            _ => return MoveResolution::Rejected(RejectReason::BlockedChain),
        }
        let removed = occupied.remove(&from);
        debug_assert!(removed, "chain box missing from occupancy set");
        if occupied.contains(&to) {
            return MoveResolution::Rejected(RejectReason::BlockedChain);
        }
        occupied.insert(to);
        if to.side != from.side {
            sim_weights.transfer(weight, to.side);
        }
        box_moves.push(PlannedBoxMove { box_id, weight, from, to });
    }

    // The chain's first box has vacated the actor's tile; a sheared
    // crossing elsewhere in the chain must not have landed on it.
    if occupied.contains(&player_to) {
        return MoveResolution::Rejected(RejectReason::BlockedChain);
    }

    MoveResolution::Plan(MovePlan {
        direction,
        player_from: actor,
        player_to,
        box_moves,
    })
}

// =============================================================================
// TESTS
// =============================================================================
