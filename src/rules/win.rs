//! Win condition checking for Renju
//!
//! Black wins only with exactly five in a row; six or more is an overline and
//! does not win. White wins with five or more.

use crate::board::{Board, Pos, Stone, DIRECTIONS, TOTAL_CELLS};

use super::patterns::makes_five;

/// Length of the `color` run through `pos` along `DIRECTIONS[dir]`,
/// counting `pos` itself whatever it holds.
fn run_through(board: &Board, pos: Pos, color: Stone, dir: usize) -> (usize, Pos) {
    let (dr, dc) = DIRECTIONS[dir];
    let mut start = pos;
    let mut n = 1;
    let mut k = 1;
    while let Some(p) = pos.offset(dr, dc, -k) {
        if board.get(p) != color {
            break;
        }
        start = p;
        n += 1;
        k += 1;
    }
    k = 1;
    while let Some(p) = pos.offset(dr, dc, k) {
        if board.get(p) != color {
            break;
        }
        n += 1;
        k += 1;
    }
    (n, start)
}

#[inline]
fn is_winning_run(len: usize, color: Stone) -> bool {
    match color {
        Stone::Black => len == 5,
        Stone::White => len >= 5,
        Stone::Empty => false,
    }
}

/// Whether the `color` stone at `pos` is part of a winning line.
#[inline]
pub fn has_five_at_pos(board: &Board, pos: Pos, color: Stone) -> bool {
    (0..DIRECTIONS.len()).any(|d| is_winning_run(run_through(board, pos, color, d).0, color))
}

/// Cells of the winning line through `pos`, if any.
pub fn winning_line_at(board: &Board, pos: Pos, color: Stone) -> Option<Vec<Pos>> {
    for d in 0..DIRECTIONS.len() {
        let (len, start) = run_through(board, pos, color, d);
        if is_winning_run(len, color) {
            let (dr, dc) = DIRECTIONS[d];
            return Some(
                (0..len as i32)
                    .filter_map(|k| start.offset(dr, dc, k))
                    .collect(),
            );
        }
    }
    None
}

/// Find the positions of a winning line for `stone`, if one exists.
pub fn find_five_positions(board: &Board, stone: Stone) -> Option<Vec<Pos>> {
    let stones = board.stones(stone)?;
    stones
        .iter_ones()
        .find_map(|pos| winning_line_at(board, pos, stone))
}

pub fn has_five_in_row(board: &Board, stone: Stone) -> bool {
    find_five_positions(board, stone).is_some()
}

/// Winner on a finished board, if any.
pub fn check_winner(board: &Board) -> Option<Stone> {
    [Stone::Black, Stone::White]
        .into_iter()
        .find(|&s| has_five_in_row(board, s))
}

/// Empty cells where `color` would complete a five.
///
/// Every such cell touches one of `color`'s stones, so only their
/// neighbourhoods are inspected.
pub fn five_points(board: &Board, color: Stone) -> Vec<Pos> {
    let Some(stones) = board.stones(color) else {
        return Vec::new();
    };
    let mut seen = [false; TOTAL_CELLS];
    let mut out = Vec::new();
    for s in stones.iter_ones() {
        for dr in -1..=1 {
            for dc in -1..=1 {
                let Some(p) = s.offset(dr, dc, 1) else {
                    continue;
                };
                if seen[p.to_index()] {
                    continue;
                }
                seen[p.to_index()] = true;
                if board.is_empty(p) && makes_five(board, p, color) {
                    out.push(p);
                }
            }
        }
    }
    out.sort_unstable();
    out
}
