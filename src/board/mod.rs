//! Board representation for Renju

pub mod bitboard;
pub mod board;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// Re-exports
pub use bitboard::Bitboard;
pub use board::Board;

/// Board size (15x15)
pub const BOARD_SIZE: usize = 15;
pub const TOTAL_CELLS: usize = BOARD_SIZE * BOARD_SIZE; // 225

/// The four line axes: horizontal, vertical, and the two diagonals.
pub const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Stone colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stone {
    Empty,
    Black,
    White,
}

impl Stone {
    /// Get opponent color
    #[inline]
    pub fn opponent(self) -> Stone {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
            Stone::Empty => Stone::Empty,
        }
    }

    /// Character used in the text board format.
    #[inline]
    pub fn symbol(self) -> char {
        match self {
            Stone::Black => 'X',
            Stone::White => 'O',
            Stone::Empty => '.',
        }
    }

    /// Index into per-color tables (Black = 0, White = 1).
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Stone::White => 1,
            _ => 0,
        }
    }
}

/// Position on the board. Row 0 is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub row: u8,
    pub col: u8,
}

impl Pos {
    #[inline]
    pub fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < BOARD_SIZE as u8 && col < BOARD_SIZE as u8);
        Self { row, col }
    }

    /// The center point (7, 7).
    pub const CENTER: Pos = Pos { row: 7, col: 7 };

    #[inline]
    pub fn to_index(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Self {
            row: (idx / BOARD_SIZE) as u8,
            col: (idx % BOARD_SIZE) as u8,
        }
    }

    #[inline]
    pub fn is_valid(row: i32, col: i32) -> bool {
        row >= 0 && row < BOARD_SIZE as i32 && col >= 0 && col < BOARD_SIZE as i32
    }

    /// Checked construction from signed coordinates.
    #[inline]
    pub fn try_new(row: i32, col: i32) -> Option<Pos> {
        if Self::is_valid(row, col) {
            Some(Pos {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// Step `k` cells along direction `(dr, dc)`, `None` when leaving the board.
    #[inline]
    pub fn offset(self, dr: i32, dc: i32, k: i32) -> Option<Pos> {
        Self::try_new(i32::from(self.row) + dr * k, i32::from(self.col) + dc * k)
    }

    /// Chebyshev distance to the center.
    #[inline]
    pub fn center_distance(self) -> i32 {
        let c = (BOARD_SIZE / 2) as i32;
        (i32::from(self.row) - c).abs().max((i32::from(self.col) - c).abs())
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_index().cmp(&other.to_index())
    }
}

/// Renju notation: column letter `a`..`o`, row number counted from the bottom.
/// `Pos::CENTER` is `h8`.
impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.col) as char;
        let rank = BOARD_SIZE - self.row as usize;
        write!(f, "{file}{rank}")
    }
}

impl FromStr for Pos {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let file = chars
            .next()
            .map(|c| c.to_ascii_lowercase())
            .ok_or_else(|| EngineError::InvalidPosition(s.to_string()))?;
        if !('a'..='o').contains(&file) {
            return Err(EngineError::InvalidPosition(s.to_string()));
        }
        let rank: usize = chars
            .as_str()
            .parse()
            .map_err(|_| EngineError::InvalidPosition(s.to_string()))?;
        if rank == 0 || rank > BOARD_SIZE {
            return Err(EngineError::InvalidPosition(s.to_string()));
        }
        Ok(Pos::new((BOARD_SIZE - rank) as u8, file as u8 - b'a'))
    }
}
