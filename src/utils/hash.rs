//! Hashing of canonical entity bytes.

use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64;

/// xxh3 of `bytes`. Not collision resistant; pair it with a byte comparison.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// Set of byte strings bucketed by [`content_hash`].
///
/// Membership compares bytes within a bucket, so two strings sharing a hash
/// are still told apart.
#[derive(Debug, Default)]
pub struct CanonicalSet {
    buckets: HashMap<u64, Vec<usize>>,
    entries: Vec<Vec<u8>>,
}

impl CanonicalSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, bytes: &[u8]) -> bool {
        self.buckets
            .get(&content_hash(bytes))
            .is_some_and(|slots| slots.iter().any(|&i| self.entries[i] == bytes))
    }

    /// Add `bytes`. Returns `false` when an identical string was already present.
    pub fn insert(&mut self, bytes: Vec<u8>) -> bool {
        let slots = self.buckets.entry(content_hash(&bytes)).or_default();
        if slots.iter().any(|&i| self.entries[i] == bytes) {
            return false;
        }
        slots.push(self.entries.len());
        self.entries.push(bytes);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
