//! Run-scoped mutable state: the exact-dedup hash set and the output index.
//!
//! One [`RunState`] exists per output target. It is owned by the job runner
//! and lent by `&mut` to the exact-dedup and record-writer stages, so there is
//! a single writer and no locking.

use std::collections::HashSet;
use std::fmt;

/// 128-bit content digest (truncated BLAKE3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    pub fn of(text: &str) -> Self {
        let digest = blake3::hash(text.as_bytes());
        let mut out = [0u8; 16];
        out.copy_from_slice(&digest.as_bytes()[..16]);
        Self(out)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Debug, Default)]
pub struct RunState {
    seen: HashSet<ContentHash>,
    next_index: u64,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hash. Returns `false` if it had already been seen.
    pub fn insert_hash(&mut self, hash: ContentHash) -> bool {
        self.seen.insert(hash)
    }

    /// Index the next retained record will receive.
    pub fn peek_index(&self) -> u64 {
        self.next_index
    }

    /// Consume the current index after a record has been written.
    pub fn commit_index(&mut self) -> u64 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
