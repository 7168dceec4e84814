//! Q16.16 Fixed-Point Map Coordinates
//!
//! Object anchors and trigger shapes are stored as fixed-point pixel
//! coordinates so containment answers never depend on float rounding.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 pixels                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A 32768 pixel range covers a 1024x1024 map of 32 pixel tiles.

/// Q16.16 fixed-point number stored as i32.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE;

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1;

/// Convert a float (map file value) to fixed-point.
///
/// Only for loading and tests. Tick code stays on integers.
///
/// ```
/// use tilestep::core::fixed::{to_fixed, FIXED_ONE};
/// const HALF_TILE: i32 = to_fixed(16.5);
/// assert_eq!(HALF_TILE, FIXED_ONE * 16 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Convert whole pixels to fixed-point.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i << FIXED_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(FIXED_ONE, 65536);
        assert_eq!(FIXED_HALF, 32768);
        assert_eq!(from_int(32), 32 * 65536);
    }

    #[test]
    fn test_to_fixed_and_back() {
        assert_eq!(to_fixed(1.0), FIXED_ONE);
        assert_eq!(to_fixed(-2.5), -(FIXED_ONE * 2 + FIXED_HALF));
        assert!((to_float(to_fixed(123.25)) - 123.25).abs() < 0.0001);
    }
}
