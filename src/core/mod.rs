//! Core primitives.
//!
//! Vector math, tick-based time and state hashing shared by every
//! gameplay module.

pub mod vec2;
pub mod time;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use time::{Ticks, FixedStepClock, seconds_to_ticks, ticks_to_seconds};
pub use hash::{StateHash, StateHasher, compute_state_hash};
