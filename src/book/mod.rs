//! Opening book for the first three moves
//!
//! - empty board: Black takes the center;
//! - one stone: White answers on one of its eight neighbours;
//! - two stones: Black plays one of the 26 named openings, mapped onto the
//!   actual position by the board symmetry that carries the canonical White
//!   stone onto the real one.
//!
//! Any other position has no book move.

pub mod jushu;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Board, Pos, Stone};

pub use jushu::{Jushu, OpeningKind, JUSHU_COUNT};

/// One of the eight symmetries of the square board, about the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symmetry(u8);

impl Symmetry {
    pub const ALL: [Symmetry; 8] = [
        Symmetry(0),
        Symmetry(1),
        Symmetry(2),
        Symmetry(3),
        Symmetry(4),
        Symmetry(5),
        Symmetry(6),
        Symmetry(7),
    ];

    /// Apply to an offset `(dx, dy)` from the center.
    pub fn apply(self, (dx, dy): (i32, i32)) -> (i32, i32) {
        // rotate by 90 degrees `self.0 % 4` times, then mirror x for 4..8
        let (x, y) = match self.0 % 4 {
            0 => (dx, dy),
            1 => (-dy, dx),
            2 => (-dx, -dy),
            _ => (dy, -dx),
        };
        if self.0 >= 4 {
            (-x, y)
        } else {
            (x, y)
        }
    }

    pub fn apply_pos(self, pos: Pos) -> Pos {
        from_offset(self.apply(to_offset(pos))).unwrap_or(pos)
    }
}

/// Offset of a cell from the center, `dy` pointing up.
pub fn to_offset(pos: Pos) -> (i32, i32) {
    let c = i32::from(Pos::CENTER.row);
    (i32::from(pos.col) - c, c - i32::from(pos.row))
}

pub fn from_offset((dx, dy): (i32, i32)) -> Option<Pos> {
    let c = i32::from(Pos::CENTER.row);
    Pos::try_new(c - dy, c + dx)
}

/// Openings Black prefers when not randomising, per kind.
const PREFERRED: [(OpeningKind, Jushu); 2] = [
    (OpeningKind::Direct, Jushu::Kagetsu),
    (OpeningKind::Indirect, Jushu::Hogetsu),
];

/// Strong openings sampled when randomising.
const STRONG_DIRECT: [Jushu; 4] = [Jushu::Kagetsu, Jushu::Ugetsu, Jushu::Keigetsu, Jushu::Shogetsu];
const STRONG_INDIRECT: [Jushu; 4] = [Jushu::Hogetsu, Jushu::Ungetsu, Jushu::Kosei, Jushu::Suigetsu];

/// Stateless opening book.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpeningBook;

impl OpeningBook {
    pub fn new() -> Self {
        Self
    }

    /// Book move for positions with at most two stones.
    ///
    /// With `randomize` the choice among equivalent candidates is drawn from
    /// `rng`; otherwise it is deterministic.
    pub fn book_move<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R, randomize: bool) -> Option<Pos> {
        match board.stone_count() {
            0 => Some(Pos::CENTER),
            1 => self.second_move(board, rng, randomize),
            2 => self.third_move(board, rng, randomize),
            _ => None,
        }
    }

    fn second_move<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R, randomize: bool) -> Option<Pos> {
        let first = board.black.iter_ones().next()?;
        // Toward the center first so an off-center opening still has room
        let mut neighbours: Vec<Pos> = (-1..=1)
            .flat_map(|dr| (-1..=1).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| (dr, dc) != (0, 0))
            .filter_map(|(dr, dc)| first.offset(dr, dc, 1))
            .filter(|p| board.is_empty(*p))
            .collect();
        neighbours.sort_by_key(|p| (p.center_distance(), *p));
        if randomize {
            neighbours.choose(rng).copied()
        } else {
            // Directly above is the usual direct opening
            first
                .offset(-1, 0, 1)
                .filter(|p| board.is_empty(*p))
                .or_else(|| neighbours.first().copied())
        }
    }

    fn third_move<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R, randomize: bool) -> Option<Pos> {
        let (kind, sym) = self.orientation(board)?;
        let jushu = if randomize {
            let pool: &[Jushu] = match kind {
                OpeningKind::Direct => &STRONG_DIRECT,
                OpeningKind::Indirect => &STRONG_INDIRECT,
            };
            *pool.choose(rng)?
        } else {
            PREFERRED.iter().find(|(k, _)| *k == kind)?.1
        };
        let pos = from_offset(sym.apply(jushu.black_offset()))?;
        board.is_empty(pos).then_some(pos)
    }

    /// Opening kind and the symmetry mapping canonical coordinates onto the
    /// board, for a center Black stone plus an adjacent White stone.
    fn orientation(&self, board: &Board) -> Option<(OpeningKind, Symmetry)> {
        if board.black.count() != 1 || board.white.count() != 1 {
            return None;
        }
        if board.get(Pos::CENTER) != Stone::Black {
            return None;
        }
        let white = to_offset(board.white.iter_ones().next()?);
        for kind in [OpeningKind::Direct, OpeningKind::Indirect] {
            if let Some(sym) = Symmetry::ALL
                .into_iter()
                .find(|s| s.apply(kind.white_offset()) == white)
            {
                return Some((kind, sym));
            }
        }
        None
    }

    /// Name the opening of a three-stone position, under any symmetry.
    pub fn classify_opening(&self, board: &Board) -> Option<Jushu> {
        classify_opening(board)
    }
}

/// Name the opening of a three-stone position (center Black, adjacent White,
/// second Black within the 5x5 square), under any symmetry.
pub fn classify_opening(board: &Board) -> Option<Jushu> {
    if board.black.count() != 2 || board.white.count() != 1 {
        return None;
    }
    if board.get(Pos::CENTER) != Stone::Black {
        return None;
    }
    let white = to_offset(board.white.iter_ones().next()?);
    let third = to_offset(board.black.iter_ones().find(|p| *p != Pos::CENTER)?);

    for sym in Symmetry::ALL {
        for kind in [OpeningKind::Direct, OpeningKind::Indirect] {
            if sym.apply(kind.white_offset()) != white {
                continue;
            }
            if let Some(j) = Jushu::of_kind(kind).find(|j| sym.apply(j.black_offset()) == third) {
                return Some(j);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn opening(white: (i32, i32), black: (i32, i32)) -> Board {
        let mut board = Board::new();
        board.place_stone(Pos::CENTER, Stone::Black);
        board.place_stone(from_offset(white).unwrap(), Stone::White);
        board.place_stone(from_offset(black).unwrap(), Stone::Black);
        board
    }

    #[test]
    fn test_symmetries_are_distinct_bijections() {
        let probe = (1, 2);
        let images: Vec<_> = Symmetry::ALL.iter().map(|s| s.apply(probe)).collect();
        for (i, a) in images.iter().enumerate() {
            assert!(!images[i + 1..].contains(a));
        }
        assert_eq!(Symmetry(0).apply_pos(Pos::new(3, 4)), Pos::new(3, 4));
        assert_eq!(Symmetry(2).apply_pos(Pos::CENTER), Pos::CENTER);
    }

    #[test]
    fn test_offset_roundtrip() {
        assert_eq!(to_offset(Pos::CENTER), (0, 0));
        assert_eq!(to_offset(Pos::new(6, 7)), (0, 1));
        assert_eq!(from_offset((1, 1)), Some(Pos::new(6, 8)));
        assert_eq!(from_offset((8, 0)), None);
    }

    #[test]
    fn test_empty_board_center() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let book = OpeningBook::new();
        assert_eq!(book.book_move(&Board::new(), &mut rng, true), Some(Pos::CENTER));
        assert_eq!(book.book_move(&Board::new(), &mut rng, false), Some(Pos::CENTER));
    }

    #[test]
    fn test_second_move_is_neighbour() {
        let book = OpeningBook::new();
        let mut board = Board::new();
        board.place_stone(Pos::CENTER, Stone::Black);
        for seed in 0..16 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let mv = book.book_move(&board, &mut rng, true).unwrap();
            assert_eq!(mv.center_distance(), 1, "seed {seed} gave {mv}");
        }
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert_eq!(book.book_move(&board, &mut rng, false), Some(Pos::new(6, 7)));
    }

    #[test]
    fn test_third_move_direct_and_indirect() {
        let book = OpeningBook::new();
        let mut rng = ChaCha20Rng::seed_from_u64(3);

        // White below the center: Kagetsu mirrored to the bottom
        let mut board = Board::new();
        board.place_stone(Pos::CENTER, Stone::Black);
        board.place_stone(Pos::new(8, 7), Stone::White);
        let mv = book.book_move(&board, &mut rng, false).unwrap();
        board.place_stone(mv, Stone::Black);
        assert_eq!(classify_opening(&board), Some(Jushu::Kagetsu));

        let mut board = Board::new();
        board.place_stone(Pos::CENTER, Stone::Black);
        board.place_stone(Pos::new(8, 6), Stone::White);
        let mv = book.book_move(&board, &mut rng, false).unwrap();
        board.place_stone(mv, Stone::Black);
        assert_eq!(classify_opening(&board), Some(Jushu::Hogetsu));
    }

    #[test]
    fn test_randomized_third_move_is_named_opening() {
        let book = OpeningBook::new();
        let mut board = Board::new();
        board.place_stone(Pos::CENTER, Stone::Black);
        board.place_stone(Pos::new(7, 8), Stone::White);
        for seed in 0..8 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let mv = book.book_move(&board, &mut rng, true).unwrap();
            let mut b = board.clone();
            b.place_stone(mv, Stone::Black);
            assert!(STRONG_DIRECT.contains(&classify_opening(&b).unwrap()));
        }
    }

    #[test]
    fn test_classify_every_opening_under_every_symmetry() {
        for j in Jushu::ALL {
            for sym in Symmetry::ALL {
                let board = opening(sym.apply(j.kind().white_offset()), sym.apply(j.black_offset()));
                assert_eq!(classify_opening(&board), Some(j), "{j} under {sym:?}");
            }
        }
    }

    #[test]
    fn test_no_book_move_later() {
        let book = OpeningBook::new();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let board = opening((0, 1), (1, 1));
        assert_eq!(book.book_move(&board, &mut rng, true), None);
        // Non-adjacent white stone: not a book position
        let mut board = Board::new();
        board.place_stone(Pos::CENTER, Stone::Black);
        board.place_stone(Pos::new(3, 3), Stone::White);
        assert_eq!(book.book_move(&board, &mut rng, false), None);
    }
}
