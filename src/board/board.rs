//! Board structure

use serde::{Deserialize, Serialize};

use super::bitboard::Bitboard;
use super::{Pos, Stone, BOARD_SIZE, TOTAL_CELLS};
use crate::error::EngineError;

/// Game board: one bitboard per color.
///
/// Serialized as 15 strings of `.`/`X`/`O`, top row first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Board {
    /// Black stones bitboard
    pub black: Bitboard,
    /// White stones bitboard
    pub white: Bitboard,
}

impl Board {
    pub fn new() -> Self {
        Self {
            black: Bitboard::new(),
            white: Bitboard::new(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        BOARD_SIZE
    }

    /// Get stone at position
    #[inline]
    pub fn get(&self, pos: Pos) -> Stone {
        if self.black.get(pos) {
            Stone::Black
        } else if self.white.get(pos) {
            Stone::White
        } else {
            Stone::Empty
        }
    }

    /// Stone at signed coordinates; off-board cells read as `None`.
    #[inline]
    pub fn get_at(&self, row: i32, col: i32) -> Option<Stone> {
        Pos::try_new(row, col).map(|p| self.get(p))
    }

    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        !self.black.get(pos) && !self.white.get(pos)
    }

    /// Place a stone without any legality check.
    /// Speculative placements must be undone with `remove_stone`.
    #[inline]
    pub fn place_stone(&mut self, pos: Pos, stone: Stone) {
        match stone {
            Stone::Black => self.black.set(pos),
            Stone::White => self.white.set(pos),
            Stone::Empty => {}
        }
    }

    /// Remove a stone
    #[inline]
    pub fn remove_stone(&mut self, pos: Pos) {
        self.black.clear(pos);
        self.white.clear(pos);
    }

    /// Place a game move, rejecting occupied cells.
    pub fn play(&mut self, pos: Pos, stone: Stone) -> Result<(), EngineError> {
        if stone == Stone::Empty {
            return Err(EngineError::InvalidSide);
        }
        if !self.is_empty(pos) {
            return Err(EngineError::Occupied(pos));
        }
        self.place_stone(pos, stone);
        Ok(())
    }

    /// Get bitboard for a color (returns None for Empty)
    #[inline]
    pub fn stones(&self, stone: Stone) -> Option<&Bitboard> {
        match stone {
            Stone::Black => Some(&self.black),
            Stone::White => Some(&self.white),
            Stone::Empty => None,
        }
    }

    /// Every occupied cell.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.black.union(&self.white)
    }

    /// Total stones on board
    #[inline]
    pub fn stone_count(&self) -> u32 {
        self.black.count() + self.white.count()
    }

    #[inline]
    pub fn is_board_empty(&self) -> bool {
        self.black.is_empty() && self.white.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.stone_count() as usize >= TOTAL_CELLS
    }

    /// Side to move assuming alternate play from an empty board.
    pub fn side_to_move(&self) -> Stone {
        if self.black.count() > self.white.count() {
            Stone::White
        } else {
            Stone::Black
        }
    }

    /// Empty cells within `radius` (Chebyshev) of any stone, in index order.
    /// Returns the center alone on an empty board.
    pub fn candidate_moves(&self, radius: i32) -> Vec<Pos> {
        if self.is_board_empty() {
            return vec![Pos::CENTER];
        }
        let mut seen = [false; TOTAL_CELLS];
        let mut moves = Vec::with_capacity(64);
        for stone in self.occupied().iter_ones() {
            for dr in -radius..=radius {
                for dc in -radius..=radius {
                    let Some(p) = stone.offset(dr, dc, 1) else {
                        continue;
                    };
                    let idx = p.to_index();
                    if seen[idx] {
                        continue;
                    }
                    seen[idx] = true;
                    if self.is_empty(p) {
                        moves.push(p);
                    }
                }
            }
        }
        moves.sort_unstable();
        moves
    }

    /// Parse the text format: one string per row, top first.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, EngineError> {
        if rows.len() != BOARD_SIZE {
            return Err(EngineError::BoardFormat(format!(
                "expected {BOARD_SIZE} rows, got {}",
                rows.len()
            )));
        }
        let mut board = Board::new();
        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != BOARD_SIZE {
                return Err(EngineError::BoardFormat(format!(
                    "row {r} has {} cells",
                    row.chars().count()
                )));
            }
            for (c, ch) in row.chars().enumerate() {
                let stone = match ch {
                    '.' | '+' | '-' => continue,
                    'X' | 'x' | 'B' | 'b' => Stone::Black,
                    'O' | 'o' | 'W' | 'w' => Stone::White,
                    other => {
                        return Err(EngineError::BoardFormat(format!(
                            "unexpected '{other}' at row {r}"
                        )))
                    }
                };
                board.place_stone(Pos::new(r as u8, c as u8), stone);
            }
        }
        Ok(board)
    }

    /// Text format, one string per row.
    pub fn to_rows(&self) -> Vec<String> {
        (0..BOARD_SIZE)
            .map(|r| {
                (0..BOARD_SIZE)
                    .map(|c| self.get(Pos::new(r as u8, c as u8)).symbol())
                    .collect()
            })
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<String>> for Board {
    type Error = EngineError;

    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        Board::from_rows(&rows)
    }
}

impl From<Board> for Vec<String> {
    fn from(board: Board) -> Self {
        board.to_rows()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.to_rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}
