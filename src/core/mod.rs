//! Core deterministic primitives.
//!
//! Integer-only coordinates and hashing shared by the map layers and the
//! step dispatcher.

pub mod fixed;
pub mod vec2;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use hash::{ScheduleHash, ScheduleHasher};
