//! Search module for the Renju engine
//!
//! Contains:
//! - Zobrist hashing for position identification
//! - Transposition table for caching search results
//! - Alpha-Beta search with iterative deepening
//! - VCF/VCT/Mise-VCF threat search for forced wins

pub mod alphabeta;
pub mod threat;
pub mod tt;
pub mod zobrist;

pub use alphabeta::{RootCandidate, SearchResult, SearchStats, Searcher};
pub use threat::{ForcedWin, ForcedWinKind, ThreatNode, ThreatReply, ThreatSearcher};
pub use tt::{NodeType, TTEntry, TTStats, TranspositionTable};
pub use zobrist::{ZobristTable, ZOBRIST};
