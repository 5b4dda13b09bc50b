/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Move, Score, ZobristKey};

/// Number of bytes in a megabyte.
const BYTES_IN_MB: usize = 1024 * 1024;

/// How a stored score relates to the true value of its node.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Bound {
    /// The score is exact.
    #[default]
    Exact,

    /// The score failed high; the true value is at least this score.
    Lower,

    /// The score failed low; the true value is at most this score.
    Upper,
}

/// Result of probing the [`TTable`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ProbeResult {
    /// A usable entry was found; its score may be returned immediately.
    Cutoff(Score),

    /// An entry was found, but its score is not usable at these bounds.
    /// Its best move is still valuable for ordering.
    Hit(Move),

    /// No entry is stored for this key.
    Miss,
}

/// An entry in the transposition table.
///
/// A zeroed key marks an empty slot, so the (astronomically unlikely)
/// position whose hash is zero is simply never cached.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub struct TTableEntry {
    /// Zobrist key of the position this entry describes.
    pub key: u64,

    /// Best move found at this position.
    pub mv: Move,

    /// Score found at this position, with mate distances stored
    /// node-relative (see [`Score::absolute`]).
    pub score: Score,

    /// Depth of the search that produced this entry.
    pub depth: u8,

    /// How `score` relates to the true value.
    pub bound: Bound,
}

/// Transposition table: a fixed-size, direct-mapped cache of search results.
///
/// Sized to the largest power of two entries that fits the configured
/// megabytes, so indexing is a single mask of the Zobrist key.
pub struct TTable {
    entries: Vec<TTableEntry>,
}

impl TTable {
    /// Default size of the table, in megabytes.
    pub const DEFAULT_SIZE: usize = 64;

    /// Minimum size of the table, in megabytes.
    pub const MIN_SIZE: usize = 4;

    /// Maximum size of the table, in megabytes.
    pub const MAX_SIZE: usize = 4_096;

    /// Create a new [`TTable`] of `size` megabytes.
    #[inline(always)]
    pub fn new(size: usize) -> Self {
        let mut table = Self { entries: Vec::new() };
        table.resize(size);
        table
    }

    /// Re-allocates the table to `size` megabytes, discarding all entries.
    pub fn resize(&mut self, size: usize) {
        let requested = (size * BYTES_IN_MB) / size_of::<TTableEntry>();

        let mut capacity = 1;
        while capacity * 2 <= requested {
            capacity *= 2;
        }

        self.entries = vec![TTableEntry::default(); capacity];
    }

    /// Clears all entries.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.entries.fill(TTableEntry::default());
    }

    /// Number of entries this table can hold.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Size of this table, in megabytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.capacity() * size_of::<TTableEntry>() / BYTES_IN_MB
    }

    /// Number of used entries.
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.entries.iter().filter(|entry| entry.key != 0).count()
    }

    /// Maps `key` to an index into this table.
    #[inline(always)]
    fn index(&self, key: ZobristKey) -> usize {
        key.inner() as usize & (self.capacity() - 1)
    }

    /// Probes the table for `key` at the provided depth and bounds.
    ///
    /// A stored entry from a depth at least `depth` produces a
    /// [`ProbeResult::Cutoff`] iff:
    /// 1. its bound is [`Bound::Exact`], or
    /// 2. its bound is [`Bound::Lower`] and its score is `>= beta`, or
    /// 3. its bound is [`Bound::Upper`] and its score is `<= alpha`.
    ///
    /// Otherwise a matching entry yields its move for ordering. The caller is
    /// responsible for converting mate scores with [`Score::relative`].
    pub fn probe(&self, key: ZobristKey, depth: i32, alpha: Score, beta: Score) -> ProbeResult {
        let entry = &self.entries[self.index(key)];

        if entry.key != key.inner() {
            return ProbeResult::Miss;
        }

        if (entry.depth as i32) >= depth {
            match entry.bound {
                Bound::Exact => return ProbeResult::Cutoff(entry.score),
                Bound::Lower if entry.score >= beta => return ProbeResult::Cutoff(entry.score),
                Bound::Upper if entry.score <= alpha => return ProbeResult::Cutoff(entry.score),
                _ => {}
            }
        }

        ProbeResult::Hit(entry.mv)
    }

    /// Stores an entry for `key`, preferring deeper results.
    ///
    /// An empty slot is always written. A slot holding the same position is
    /// overwritten when the new result is at least as deep or is exact. A
    /// colliding slot is overwritten only by a result at least as deep.
    /// Depths below zero (quiescence) are clamped to zero so they never
    /// outrank main-search entries.
    pub fn store(&mut self, key: ZobristKey, mv: Move, score: Score, depth: i32, bound: Bound) {
        let index = self.index(key);
        let entry = &mut self.entries[index];
        let depth = depth.max(0) as u8;

        let replace = if entry.key == 0 {
            true
        } else if entry.key == key.inner() {
            depth >= entry.depth || bound == Bound::Exact
        } else {
            depth >= entry.depth
        };

        if replace {
            *entry = TTableEntry {
                key: key.inner(),
                mv,
                score,
                depth,
                bound,
            };
        }
    }
}

impl Default for TTable {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}
