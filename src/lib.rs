//! # Counterbalance
//!
//! Logic core for a two-viewport seesaw box-pushing puzzle: two visually
//! separate grids that are one continuous toroidal world, joined at their
//! shared edge by a weight-dependent vertical offset.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       COUNTERBALANCE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── bus.rs      - Typed publish/subscribe event dispatch    │
//! │  ├── weight.rs   - Per-side weights + seesaw offset          │
//! │  └── hash.rs     - State fingerprints for verification       │
//! │                                                              │
//! │  game/           - Puzzle logic (deterministic)              │
//! │  ├── grid.rs     - Sides, positions, directions              │
//! │  ├── element.rs  - Box/target/decoration arenas              │
//! │  ├── level.rs    - Terrain, tile queries, level definitions  │
//! │  ├── input.rs    - Key-edge latch with direction priority    │
//! │  ├── movement.rs - Crossing + push-chain resolution          │
//! │  ├── targets.rs  - Satisfied-target tracking                 │
//! │  ├── undo.rs     - Step-grouped reversible operations        │
//! │  ├── events.rs   - Events consumed by the side views         │
//! │  └── world.rs    - The coordinator that owns everything      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The whole core is single-threaded, synchronous, and deterministic:
//! - Element arenas use BTreeMap for sorted iteration
//! - No system time, no randomness
//! - One move fully commits or is fully rejected before control returns
//!
//! Rendering, audio, asset loading, and raw input polling are external
//! collaborators. They consume [`game::events::WorldEvent`] values from
//! the bus and feed commands to [`game::world::World`]; both side-local
//! views observe the same authoritative state.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::bus::{EventBus, Subscription};
pub use crate::core::hash::StateHash;
pub use crate::core::weight::{WeightBalance, MAX_WEIGHT_DIFF};
pub use crate::game::element::{BoxState, Element, ElementId};
pub use crate::game::events::{Topic, WorldEvent};
pub use crate::game::grid::{Direction, Position, Side};
pub use crate::game::input::MoveLatch;
pub use crate::game::level::{LevelError, LevelPair, LevelSet, TileProbe, TileQuery};
pub use crate::game::movement::RejectReason;
pub use crate::game::world::{MoveOutcome, World};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Edge length of one tile in pixels.
pub const TILE_SIZE: f32 = 32.0;

/// Fixed weight shift applied when the actor crosses the shared edge.
///
/// Independent of any box weight; the actor has no weight attribute.
pub const PLAYER_CROSSING_WEIGHT: f32 = 0.5;
