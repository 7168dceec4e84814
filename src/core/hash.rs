//! Schedule Hashing
//!
//! Deterministic SHA-256 digests of hook schedules, used to check that two
//! maps built from the same mechanics dispatch in the same order.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type ScheduleHash = [u8; 32];

/// Deterministic hasher for dispatch schedules.
///
/// Order of updates is part of the digest.
pub struct ScheduleHasher {
    hasher: Sha256,
}

impl ScheduleHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for hook buckets.
    pub fn for_buckets() -> Self {
        Self::new(b"TILESTEP_BUCKETS_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a length-prefixed string.
    ///
    /// The prefix keeps `["ab", "c"]` and `["a", "bc"]` apart.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> ScheduleHash {
        self.hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hasher_determinism() {
        let make_hash = || {
            let mut hasher = ScheduleHasher::for_buckets();
            hasher.update_u8(3);
            hasher.update_str("stepMoveWalk");
            hasher.update_i32(-10);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = ScheduleHasher::new(b"test");
            h.update_str("a");
            h.update_str("b");
            h.finalize()
        };

        let hash2 = {
            let mut h = ScheduleHasher::new(b"test");
            h.update_str("b");
            h.update_str("a");
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_length_prefix_separates_boundaries() {
        let hash1 = {
            let mut h = ScheduleHasher::new(b"test");
            h.update_str("ab");
            h.update_str("c");
            h.finalize()
        };

        let hash2 = {
            let mut h = ScheduleHasher::new(b"test");
            h.update_str("a");
            h.update_str("bc");
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let hash1 = ScheduleHasher::new(b"DOMAIN_A").finalize();
        let hash2 = ScheduleHasher::new(b"DOMAIN_B").finalize();
        assert_ne!(hash1, hash2);
    }
}
