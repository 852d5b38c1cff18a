//! Transposition table for caching search results
//!
//! Lives for one move decision: cleared when a new decision starts and reused
//! across the iterative-deepening depths of that decision.
//!
//! # Example
//!
//! ```
//! use renju::board::Pos;
//! use renju::search::{TranspositionTable, NodeType};
//!
//! let mut tt = TranspositionTable::new(1); // 1 MB
//! let hash = 0x123456789ABCDEF0;
//! tt.store(hash, 5, 100, NodeType::Exact, Some(Pos::new(7, 7)));
//!
//! assert_eq!(tt.probe(hash, 5, -1000, 1000), Some((100, Some(Pos::new(7, 7)))));
//! ```

use crate::board::Pos;

/// How a stored score relates to the true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Exact score - the search completed inside the window
    Exact,
    /// Lower bound - score >= stored value (beta cutoff)
    LowerBound,
    /// Upper bound - score <= stored value (alpha fail-low)
    UpperBound,
}

/// Transposition table entry
#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    pub hash: u64,
    pub depth: i8,
    pub score: i32,
    pub node_type: NodeType,
    pub best_move: Option<Pos>,
}

/// Direct-mapped transposition table with depth-preferred replacement.
pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    size: usize,
}

impl TranspositionTable {
    /// Create a new transposition table with the given size in megabytes.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TTEntry>>();
        let size = ((size_mb * 1024 * 1024) / entry_size).max(1024);

        Self {
            entries: vec![None; size],
            size,
        }
    }

    #[inline]
    fn slot(&self, hash: u64) -> usize {
        (hash as usize) % self.size
    }

    /// Probe the table for a position.
    ///
    /// Returns `Some((score, best_move))` only when the entry is deep enough
    /// and its bound is compatible with the `(alpha, beta)` window.
    /// Use [`best_move`](Self::best_move) for ordering hints.
    #[must_use]
    pub fn probe(&self, hash: u64, depth: i8, alpha: i32, beta: i32) -> Option<(i32, Option<Pos>)> {
        let entry = self.entries[self.slot(hash)]?;
        if entry.hash != hash || entry.depth < depth {
            return None;
        }
        match entry.node_type {
            NodeType::Exact => Some((entry.score, entry.best_move)),
            NodeType::LowerBound if entry.score >= beta => Some((entry.score, entry.best_move)),
            NodeType::UpperBound if entry.score <= alpha => Some((entry.score, entry.best_move)),
            _ => None,
        }
    }

    /// Raw entry for a hash, regardless of depth.
    #[must_use]
    pub fn entry(&self, hash: u64) -> Option<TTEntry> {
        self.entries[self.slot(hash)].filter(|e| e.hash == hash)
    }

    /// Best move stored for this position, for move ordering.
    #[must_use]
    pub fn best_move(&self, hash: u64) -> Option<Pos> {
        self.entry(hash).and_then(|e| e.best_move)
    }

    /// Store a position in the table.
    ///
    /// Replaces an entry if the slot is empty, holds the same position, or
    /// the new search is at least as deep.
    pub fn store(
        &mut self,
        hash: u64,
        depth: i8,
        score: i32,
        node_type: NodeType,
        best_move: Option<Pos>,
    ) {
        let idx = self.slot(hash);
        let should_replace = match &self.entries[idx] {
            None => true,
            Some(e) => e.hash == hash || e.depth <= depth,
        };

        if should_replace {
            self.entries[idx] = Some(TTEntry {
                hash,
                depth,
                score,
                node_type,
                best_move,
            });
        }
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
    }

    /// Get statistics about table usage.
    #[must_use]
    pub fn stats(&self) -> TTStats {
        let used = self.entries.iter().filter(|e| e.is_some()).count();
        TTStats {
            size: self.size,
            used,
            usage_percent: (used as f64 / self.size as f64 * 100.0) as u8,
        }
    }
}

/// Statistics about transposition table usage.
#[derive(Debug, Clone, Copy)]
pub struct TTStats {
    pub size: usize,
    pub used: usize,
    /// Percentage of table in use (0-100)
    pub usage_percent: u8,
}
