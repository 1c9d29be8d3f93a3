//! Puzzle logic: grid model, elements, levels, movement, targets, undo,
//! and the world coordinator.

pub mod element;
pub mod events;
pub mod grid;
pub mod input;
pub mod level;
pub mod movement;
pub mod targets;
pub mod undo;
pub mod world;
