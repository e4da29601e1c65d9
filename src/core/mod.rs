//! Core deterministic primitives.
//!
//! Nothing here reads the wall clock or OS entropy. Given the same seed and
//! the same tick sequence, the engine makes the same choices.

pub mod rng;
pub mod time;

pub use rng::{derive_turn_seed, DeterministicRng};
pub use time::{millis_from_ticks, ticks_from_millis, Tick};
