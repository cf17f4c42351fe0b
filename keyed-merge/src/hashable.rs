//! Hashing of keys for distribution.
//!
//! The default route for a key without a bespoke partitioner is its FNV hash, which is stable
//! across processes and platforms, unlike the randomly seeded `std` hasher.

use std::hash::{Hash, Hasher};

/// Types with a `hashed` method, producing a stable 64 bit hash.
pub trait Hashable {
    /// A hash of the associated value.
    fn hashed(&self) -> u64;
}

impl<T: Hash> Hashable for T {
    #[inline]
    fn hashed(&self) -> u64 {
        let mut h: fnv::FnvHasher = Default::default();
        self.hash(&mut h);
        h.finish()
    }
}
