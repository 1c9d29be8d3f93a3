//! Deterministic primitives: event dispatch, seesaw weights, state hashing.

pub mod bus;
pub mod hash;
pub mod weight;
