//! Stable 64-bit string hashing.

use fnv::FnvHasher;
use std::hash::Hasher;

/// FNV-1a 64-bit hash of a string.
///
/// Used for cache keys and for deriving user ids from email addresses, so the
/// result must never change between releases or processes.
pub fn fnv64(s: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(s.as_bytes());
    hasher.finish()
}
