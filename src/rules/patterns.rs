//! Line pattern scanner
//!
//! Answers "what does this line become if `color` plays at `pos`?" for one of
//! the four axes. The scan copies an 11-cell window (offsets -5..=5) into a
//! stack array with the hypothetical stone at the center, so callers' boards
//! are never touched.
//!
//! Definitions used throughout the rules code:
//! - a **five point** is an empty cell that completes a five together with
//!   the placed stone (exactly five for Black, five or more for White);
//! - a **four** is a line with at least one five point;
//! - a **straight four** is four consecutive stones whose both ends are five
//!   points (the `_XXXX_` shape);
//! - a **three** is a line that is not a four and has an empty cell which
//!   turns it into a straight four containing the placed stone. Those cells
//!   are the three's **straight-four points**.

use crate::board::{Board, Pos, Stone, DIRECTIONS};

/// Window radius on each side of the scanned cell.
const RADIUS: i32 = 5;
const WIDTH: usize = (2 * RADIUS + 1) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Own,
    Empty,
    /// Opponent stone or off-board
    Wall,
}

/// Shape a placement produces on one axis, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Shape {
    None,
    /// Can become a four but never a straight four
    ClosedThree,
    /// `●_●●` / `●●_●` with room on both sides
    JumpThree,
    /// `_●●●_` with room to become a straight four
    OpenThree,
    /// One five point, stones split by the point (`●●●_●`, `●●_●●`, `●_●●●`)
    JumpFour,
    /// One five point at the end of four consecutive stones
    ClosedFour,
    /// Straight four `_●●●●_`
    OpenFour,
    /// Two independent five points on one axis (`●_●●●_●`)
    DoubleFour,
    Five,
    Overline,
}

impl Shape {
    /// Number of fours this axis contributes.
    #[inline]
    pub fn four_count(self) -> u8 {
        match self {
            Shape::DoubleFour => 2,
            Shape::OpenFour | Shape::ClosedFour | Shape::JumpFour => 1,
            _ => 0,
        }
    }

    #[inline]
    pub fn is_three(self) -> bool {
        matches!(self, Shape::OpenThree | Shape::JumpThree)
    }

    #[inline]
    pub fn is_four(self) -> bool {
        self.four_count() > 0
    }
}

/// Small fixed-capacity set of board cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Points {
    len: u8,
    cells: [Option<Pos>; 4],
}

impl Points {
    #[inline]
    pub fn push(&mut self, pos: Pos) {
        if (self.len as usize) < self.cells.len() && !self.contains(pos) {
            self.cells[self.len as usize] = Some(pos);
            self.len += 1;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        self.iter().any(|p| p == pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = Pos> + '_ {
        self.cells[..self.len as usize].iter().flatten().copied()
    }
}

/// Result of scanning one axis for one hypothetical placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineShape {
    /// Index into `DIRECTIONS`
    pub dir: usize,
    pub shape: Shape,
    /// Consecutive stones through the placed cell, placed stone included
    pub run: u8,
    /// Cells completing five (only filled for fours)
    pub five_points: Points,
    /// Cells turning a three into a straight four (only filled for threes)
    pub straight_four_points: Points,
}

#[derive(Clone, Copy)]
struct Window {
    cells: [Cell; WIDTH],
    origin: Pos,
    dr: i32,
    dc: i32,
    color: Stone,
}

impl Window {
    fn build(board: &Board, pos: Pos, color: Stone, dir: usize) -> Self {
        let (dr, dc) = DIRECTIONS[dir];
        let mut cells = [Cell::Wall; WIDTH];
        for k in -RADIUS..=RADIUS {
            let cell = if k == 0 {
                Cell::Own
            } else {
                match pos.offset(dr, dc, k).map(|p| board.get(p)) {
                    Some(s) if s == color => Cell::Own,
                    Some(Stone::Empty) => Cell::Empty,
                    _ => Cell::Wall,
                }
            };
            cells[(k + RADIUS) as usize] = cell;
        }
        Self {
            cells,
            origin: pos,
            dr,
            dc,
            color,
        }
    }

    #[inline]
    fn at(&self, k: i32) -> Cell {
        self.cells[(k + RADIUS) as usize]
    }

    #[inline]
    fn set(&mut self, k: i32, cell: Cell) {
        self.cells[(k + RADIUS) as usize] = cell;
    }

    #[inline]
    fn pos(&self, k: i32) -> Option<Pos> {
        self.origin.offset(self.dr, self.dc, k)
    }

    /// Length of the run of own stones through the center.
    fn run(&self) -> i32 {
        let mut n = 1;
        let mut k = 1;
        while k <= RADIUS && self.at(k) == Cell::Own {
            n += 1;
            k += 1;
        }
        k = -1;
        while k >= -RADIUS && self.at(k) == Cell::Own {
            n += 1;
            k -= 1;
        }
        n
    }

    #[inline]
    fn is_five(&self, run: i32) -> bool {
        if self.color == Stone::Black {
            run == 5
        } else {
            run >= 5
        }
    }

    /// Offsets in -4..=4 that complete a five through the center.
    /// Assumes the center run is not already a five.
    fn five_offsets(&mut self) -> ([i32; 4], usize) {
        let mut out = [0i32; 4];
        let mut n = 0;
        for k in -(RADIUS - 1)..=(RADIUS - 1) {
            if k == 0 || self.at(k) != Cell::Empty {
                continue;
            }
            self.set(k, Cell::Own);
            let five = self.is_five(self.run());
            self.set(k, Cell::Empty);
            if five && n < out.len() {
                out[n] = k;
                n += 1;
            }
        }
        (out, n)
    }

    fn four_shape(&mut self, run: i32) -> (Shape, Points) {
        let (offs, n) = self.five_offsets();
        let mut points = Points::default();
        for &k in &offs[..n] {
            if let Some(p) = self.pos(k) {
                points.push(p);
            }
        }
        let shape = match n {
            0 => Shape::None,
            1 if run == 4 => Shape::ClosedFour,
            1 => Shape::JumpFour,
            2 if offs[1] - offs[0] == 5 => Shape::OpenFour,
            _ => Shape::DoubleFour,
        };
        (shape, points)
    }

    /// Straight-four points of a line that is not a four, and whether any
    /// empty cell makes some (non-straight) four.
    fn three_points(&mut self) -> (Points, bool) {
        let mut points = Points::default();
        let mut any_four = false;
        for e in -(RADIUS - 2)..=(RADIUS - 2) {
            if e == 0 || self.at(e) != Cell::Empty {
                continue;
            }
            self.set(e, Cell::Own);
            let (offs, n) = self.five_offsets();
            self.set(e, Cell::Empty);
            if n == 0 {
                continue;
            }
            any_four = true;
            let straight = (0..n).any(|i| {
                (i + 1..n).any(|j| {
                    let (a, b) = (offs[i].min(offs[j]), offs[i].max(offs[j]));
                    b - a == 5 && a < 0 && b > 0 && a < e && e < b
                })
            });
            if straight {
                if let Some(p) = self.pos(e) {
                    points.push(p);
                }
            }
        }
        (points, any_four)
    }
}

/// Scan one axis for a hypothetical `color` stone at `pos`.
///
/// The cell at `pos` is treated as holding `color` whatever the board says,
/// so callers can scan both empty cells and stones already played.
pub fn scan_line(board: &Board, pos: Pos, color: Stone, dir: usize) -> LineShape {
    let mut win = Window::build(board, pos, color, dir);
    let run = win.run();
    let mut out = LineShape {
        dir,
        shape: Shape::None,
        run: run as u8,
        five_points: Points::default(),
        straight_four_points: Points::default(),
    };

    if color == Stone::Black && run >= 6 {
        out.shape = Shape::Overline;
        return out;
    }
    if win.is_five(run) {
        out.shape = Shape::Five;
        return out;
    }

    let (four, five_points) = win.four_shape(run);
    if four != Shape::None {
        out.shape = four;
        out.five_points = five_points;
        return out;
    }

    let (straight, any_four) = win.three_points();
    if !straight.is_empty() {
        out.shape = if run == 3 {
            Shape::OpenThree
        } else {
            Shape::JumpThree
        };
        out.straight_four_points = straight;
    } else if any_four {
        out.shape = Shape::ClosedThree;
    }
    out
}

/// Scan all four axes.
pub fn scan_all(board: &Board, pos: Pos, color: Stone) -> [LineShape; 4] {
    [
        scan_line(board, pos, color, 0),
        scan_line(board, pos, color, 1),
        scan_line(board, pos, color, 2),
        scan_line(board, pos, color, 3),
    ]
}

/// Whether `color` at `pos` completes a five (exactly five for Black).
pub fn makes_five(board: &Board, pos: Pos, color: Stone) -> bool {
    (0..DIRECTIONS.len()).any(|d| {
        let win = Window::build(board, pos, color, d);
        win.is_five(win.run())
    })
}

/// Whether Black at `pos` makes six or more in a row.
pub fn makes_overline(board: &Board, pos: Pos) -> bool {
    (0..DIRECTIONS.len()).any(|d| Window::build(board, pos, Stone::Black, d).run() >= 6)
}

/// Total fours over all axes for `color` at `pos`.
pub fn count_fours(board: &Board, pos: Pos, color: Stone) -> u8 {
    scan_all(board, pos, color)
        .iter()
        .map(|s| s.shape.four_count())
        .sum()
}

/// Whether `color` at `pos` makes at least one four (and no five).
pub fn makes_four(board: &Board, pos: Pos, color: Stone) -> bool {
    (0..DIRECTIONS.len()).any(|d| scan_line(board, pos, color, d).shape.is_four())
}

/// Whether `color` at `pos` makes an open or jump three on some axis.
pub fn makes_three(board: &Board, pos: Pos, color: Stone) -> bool {
    (0..DIRECTIONS.len()).any(|d| scan_line(board, pos, color, d).shape.is_three())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Place `color` stones on row 7 at the given columns.
    fn row_board(black: &[u8], white: &[u8]) -> Board {
        let mut board = Board::new();
        for &c in black {
            board.place_stone(Pos::new(7, c), Stone::Black);
        }
        for &c in white {
            board.place_stone(Pos::new(7, c), Stone::White);
        }
        board
    }

    fn horizontal(board: &Board, col: u8, color: Stone) -> LineShape {
        scan_line(board, Pos::new(7, col), color, 0)
    }

    #[test]
    fn test_exact_five() {
        // . X X X X [X] .
        let board = row_board(&[3, 4, 5, 6], &[]);
        assert_eq!(horizontal(&board, 7, Stone::Black).shape, Shape::Five);
        assert!(makes_five(&board, Pos::new(7, 7), Stone::Black));
    }

    #[test]
    fn test_overline_black_but_five_for_white() {
        // X X X [.] X X
        let board = row_board(&[3, 4, 5, 7, 8], &[]);
        assert_eq!(horizontal(&board, 6, Stone::Black).shape, Shape::Overline);
        assert!(!makes_five(&board, Pos::new(7, 6), Stone::Black));
        assert!(makes_overline(&board, Pos::new(7, 6)));

        let board = row_board(&[], &[3, 4, 5, 7, 8]);
        assert_eq!(horizontal(&board, 6, Stone::White).shape, Shape::Five);
    }

    #[test]
    fn test_open_four() {
        // . X X X [X] .
        let board = row_board(&[4, 5, 6], &[]);
        let s = horizontal(&board, 7, Stone::Black);
        assert_eq!(s.shape, Shape::OpenFour);
        assert_eq!(s.five_points.len(), 2);
        assert!(s.five_points.contains(Pos::new(7, 3)));
        assert!(s.five_points.contains(Pos::new(7, 8)));
    }

    #[test]
    fn test_closed_four_against_wall() {
        // O X X X [X] .
        let board = row_board(&[4, 5, 6], &[3]);
        let s = horizontal(&board, 7, Stone::Black);
        assert_eq!(s.shape, Shape::ClosedFour);
        assert_eq!(s.five_points.iter().collect::<Vec<_>>(), vec![Pos::new(7, 8)]);
    }

    #[test]
    fn test_edge_closes_four() {
        // |X X X [X] . : board edge acts as a wall
        let board = row_board(&[0, 1, 2], &[]);
        assert_eq!(horizontal(&board, 3, Stone::Black).shape, Shape::ClosedFour);
    }

    #[test]
    fn test_jump_four() {
        // X X [X] . X
        let board = row_board(&[5, 6, 9], &[]);
        let s = horizontal(&board, 7, Stone::Black);
        assert_eq!(s.shape, Shape::JumpFour);
        assert!(s.five_points.contains(Pos::new(7, 8)));
    }

    #[test]
    fn test_four_blocked_by_overline_for_black() {
        // X . X X [X] X : filling the gap makes six, so no five point on that side
        // X [X] X X . X X would be an overline four; check a simpler one:
        // X . X X [X] . . with an extra X beyond the right gap
        let board = row_board(&[3, 5, 6, 9], &[]);
        // placing 7: stones 3,5,6,7,9 -> gap 4 gives 3..7 five (col 8 empty), gap 8 gives 5..9 five
        let s = horizontal(&board, 7, Stone::Black);
        assert_eq!(s.shape, Shape::DoubleFour);

        // With col 2 also black, gap 4 makes 2..7 = six: only one four left
        let board = row_board(&[2, 3, 5, 6, 9], &[]);
        let s = horizontal(&board, 7, Stone::Black);
        assert_eq!(s.shape, Shape::JumpFour);
        assert_eq!(s.five_points.iter().collect::<Vec<_>>(), vec![Pos::new(7, 8)]);
    }

    #[test]
    fn test_open_three() {
        // . . X X [X] . .
        let board = row_board(&[5, 6], &[]);
        let s = horizontal(&board, 7, Stone::Black);
        assert_eq!(s.shape, Shape::OpenThree);
        assert_eq!(s.straight_four_points.len(), 2);
        assert!(s.straight_four_points.contains(Pos::new(7, 4)));
        assert!(s.straight_four_points.contains(Pos::new(7, 8)));
    }

    #[test]
    fn test_jump_three() {
        // . X . X [X] .
        let board = row_board(&[4, 6], &[]);
        let s = horizontal(&board, 7, Stone::Black);
        assert_eq!(s.shape, Shape::JumpThree);
        assert_eq!(
            s.straight_four_points.iter().collect::<Vec<_>>(),
            vec![Pos::new(7, 5)]
        );
    }

    #[test]
    fn test_three_blocked_one_side_is_still_three() {
        // O . X X [X] . . : only the right extension makes a straight four
        let board = row_board(&[5, 6], &[3]);
        let s = horizontal(&board, 7, Stone::Black);
        assert_eq!(s.shape, Shape::OpenThree);
        assert_eq!(
            s.straight_four_points.iter().collect::<Vec<_>>(),
            vec![Pos::new(7, 8)]
        );
    }

    #[test]
    fn test_closed_three() {
        // O X X [X] . . : can only become a closed four
        let board = row_board(&[5, 6], &[4]);
        assert_eq!(horizontal(&board, 7, Stone::Black).shape, Shape::ClosedThree);
    }

    #[test]
    fn test_three_at_edge_is_not_open() {
        // |X X [X] . . . : straight four would need col -1
        let board = row_board(&[0, 1], &[]);
        let s = horizontal(&board, 2, Stone::Black);
        // 0..3 is a four whose left end is the edge; 1..4 is impossible (0 occupied)
        assert_eq!(s.shape, Shape::ClosedThree);
    }

    #[test]
    fn test_scan_does_not_mutate() {
        let board = row_board(&[5, 6], &[]);
        let before = board.clone();
        let _ = scan_all(&board, Pos::new(7, 7), Stone::Black);
        assert_eq!(board, before);
    }

    #[test]
    fn test_diagonal_scan() {
        let mut board = Board::new();
        for i in 3..6u8 {
            board.place_stone(Pos::new(i, i), Stone::White);
        }
        let s = scan_line(&board, Pos::new(6, 6), Stone::White, 2);
        assert_eq!(s.shape, Shape::OpenFour);
        assert_eq!(count_fours(&board, Pos::new(6, 6), Stone::White), 1);
    }
}
