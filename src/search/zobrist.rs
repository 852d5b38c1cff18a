//! Zobrist hashing for position identification
//!
//! Zobrist hashing allows O(1) incremental hash updates when placing/removing stones.
//! The same keys serve the transposition table (with side to move) and the
//! legality cache (stones only).
//!
//! # Example
//!
//! ```
//! use renju::board::{Board, Stone, Pos};
//! use renju::search::ZOBRIST;
//!
//! let mut board = Board::new();
//! let hash1 = ZOBRIST.hash(&board, Stone::Black);
//!
//! let pos = Pos::new(7, 7);
//! board.place_stone(pos, Stone::Black);
//! let hash2 = ZOBRIST.hash(&board, Stone::White);
//!
//! // Incremental update is equivalent to full recomputation
//! assert_eq!(ZOBRIST.update_place(hash1, pos, Stone::Black), hash2);
//! ```

use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::board::{Board, Pos, Stone, TOTAL_CELLS};

/// Fixed seed so hashes are reproducible across runs and workers.
const ZOBRIST_SEED: u64 = 0x1234_5678_9ABC_DEF0;

/// Process-wide key table. Immutable after first use, so workers may share it.
pub static ZOBRIST: Lazy<ZobristTable> = Lazy::new(ZobristTable::new);

/// Zobrist key table.
///
/// One random value per (position, color) plus a side-to-move key.
pub struct ZobristTable {
    black: [u64; TOTAL_CELLS],
    white: [u64; TOTAL_CELLS],
    black_to_move: u64,
}

impl ZobristTable {
    /// Create a key table from the fixed seed.
    #[must_use]
    pub fn new() -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(ZOBRIST_SEED);

        let mut black = [0u64; TOTAL_CELLS];
        let mut white = [0u64; TOTAL_CELLS];
        for i in 0..TOTAL_CELLS {
            black[i] = rng.gen();
            white[i] = rng.gen();
        }

        Self {
            black,
            white,
            black_to_move: rng.gen(),
        }
    }

    #[inline]
    fn key(&self, pos: Pos, stone: Stone) -> u64 {
        let idx = pos.to_index();
        match stone {
            Stone::Black => self.black[idx],
            Stone::White => self.white[idx],
            Stone::Empty => 0,
        }
    }

    /// Hash of the stones alone, without the side-to-move component.
    /// Keys the legality cache.
    #[must_use]
    pub fn hash_stones(&self, board: &Board) -> u64 {
        let mut h = 0u64;
        for pos in board.black.iter_ones() {
            h ^= self.black[pos.to_index()];
        }
        for pos in board.white.iter_ones() {
            h ^= self.white[pos.to_index()];
        }
        h
    }

    /// Compute the full hash for a board position.
    ///
    /// This iterates over all stones on the board. For incremental updates
    /// during search, use `update_place` and `update_remove` instead.
    #[must_use]
    pub fn hash(&self, board: &Board, side_to_move: Stone) -> u64 {
        let h = self.hash_stones(board);
        if side_to_move == Stone::Black {
            h ^ self.black_to_move
        } else {
            h
        }
    }

    /// Incrementally update hash after placing a stone.
    ///
    /// Note: This also toggles the side-to-move component.
    #[inline]
    #[must_use]
    pub fn update_place(&self, hash: u64, pos: Pos, stone: Stone) -> u64 {
        hash ^ self.key(pos, stone) ^ self.black_to_move
    }

    /// Incrementally update hash after removing a stone.
    /// XOR is its own inverse, so this equals `update_place`.
    #[inline]
    #[must_use]
    pub fn update_remove(&self, hash: u64, pos: Pos, stone: Stone) -> u64 {
        self.update_place(hash, pos, stone)
    }

    /// Add or remove one stone without touching the side-to-move key.
    #[inline]
    #[must_use]
    pub fn update_stone(&self, hash: u64, pos: Pos, stone: Stone) -> u64 {
        hash ^ self.key(pos, stone)
    }

    /// Toggle the side-to-move component of the hash.
    ///
    /// Used for null move pruning where the side changes without placing a stone.
    #[inline]
    #[must_use]
    pub fn toggle_side(&self, hash: u64) -> u64 {
        hash ^ self.black_to_move
    }
}

impl Default for ZobristTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zobrist_empty_board() {
        let zt = ZobristTable::new();
        let board = Board::new();

        assert_eq!(zt.hash(&board, Stone::White), 0);
        assert_eq!(zt.hash(&board, Stone::Black), zt.black_to_move);
        assert_eq!(zt.hash_stones(&board), 0);
    }

    #[test]
    fn test_zobrist_deterministic() {
        let zt1 = ZobristTable::new();
        let zt2 = ZobristTable::new();
        let mut board = Board::new();
        board.place_stone(Pos::new(3, 4), Stone::White);

        assert_eq!(zt1.hash(&board, Stone::Black), zt2.hash(&board, Stone::Black));
        assert_eq!(zt1.hash(&board, Stone::Black), ZOBRIST.hash(&board, Stone::Black));
    }

    #[test]
    fn test_zobrist_incremental() {
        let zt = ZobristTable::new();
        let mut board = Board::new();
        let pos = Pos::new(7, 7);

        let hash1 = zt.hash(&board, Stone::Black);
        board.place_stone(pos, Stone::Black);
        let hash2 = zt.hash(&board, Stone::White);

        assert_eq!(zt.update_place(hash1, pos, Stone::Black), hash2);
        assert_eq!(zt.update_remove(hash2, pos, Stone::Black), hash1);
    }

    #[test]
    fn test_zobrist_stone_only_update() {
        let zt = ZobristTable::new();
        let mut board = Board::new();
        board.place_stone(Pos::new(5, 5), Stone::Black);
        let before = zt.hash_stones(&board);

        board.place_stone(Pos::new(5, 6), Stone::White);
        assert_eq!(
            zt.update_stone(before, Pos::new(5, 6), Stone::White),
            zt.hash_stones(&board)
        );
    }

    #[test]
    fn test_zobrist_colors_differ() {
        let zt = ZobristTable::new();
        let mut b1 = Board::new();
        let mut b2 = Board::new();
        b1.place_stone(Pos::new(7, 7), Stone::Black);
        b2.place_stone(Pos::new(7, 7), Stone::White);
        assert_ne!(zt.hash_stones(&b1), zt.hash_stones(&b2));
    }

    #[test]
    fn test_zobrist_same_position_different_path() {
        let zt = ZobristTable::new();
        let mut board1 = Board::new();
        let mut board2 = Board::new();

        board1.place_stone(Pos::new(7, 7), Stone::Black);
        board1.place_stone(Pos::new(8, 8), Stone::White);

        board2.place_stone(Pos::new(8, 8), Stone::White);
        board2.place_stone(Pos::new(7, 7), Stone::Black);

        assert_eq!(zt.hash(&board1, Stone::Black), zt.hash(&board2, Stone::Black));
    }

    #[test]
    fn test_zobrist_toggle_side() {
        let zt = ZobristTable::new();
        let mut board = Board::new();
        board.place_stone(Pos::new(7, 7), Stone::Black);
        let h = zt.hash(&board, Stone::White);
        assert_eq!(zt.toggle_side(h), zt.hash(&board, Stone::Black));
    }

    #[test]
    fn test_zobrist_all_corners() {
        let zt = ZobristTable::new();
        let mut board = Board::new();
        let corners = [
            Pos::new(0, 0),
            Pos::new(0, 14),
            Pos::new(14, 0),
            Pos::new(14, 14),
        ];
        for &pos in &corners {
            board.place_stone(pos, Stone::Black);
        }

        let expected = corners
            .iter()
            .fold(0u64, |h, p| h ^ zt.black[p.to_index()]);
        assert_eq!(zt.hash(&board, Stone::White), expected);
    }
}
