//! Heuristic evaluation function for Renju positions
//!
//! Evaluates board positions based on:
//! - Line patterns (fours, threes, twos) counted once per segment
//! - Double-threat combinations
//! - Mise points: empty cells where one move would make two threats
//! - Counter-four exposure of open threes
//! - Forbidden-move vulnerability for Black
//! - Centrality and the named-opening bonus

use crate::board::{Board, Pos, Stone, BOARD_SIZE, DIRECTIONS, TOTAL_CELLS};
use crate::book::classify_opening;
use crate::rules::ForbiddenChecker;

use super::patterns::{PatternWeights, FIVE_SCORE};

/// Maximum Manhattan distance from center on a 15x15 board
const MAX_CENTER_DIST: i32 = 14;

/// Forbidden checks per evaluation are capped; each one copies the board.
const MAX_FORBIDDEN_PROBES: usize = 6;

/// Mise cells are capped so crowded positions do not dominate.
const MAX_MISE_POINTS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    None,
    ClosedTwo,
    OpenTwo,
    ClosedThree,
    OpenThree,
    Four,
    OpenFour,
    Five,
}

/// One scanned segment and the empty cells that extend it.
struct Segment {
    kind: LineKind,
    extensions: [Option<Pos>; 3],
}

/// Per-color totals collected in one pass.
struct SideSummary {
    score: i32,
    five: bool,
    open_fours: i32,
    fours: i32,
    open_threes: i32,
    /// Lines that can still become a four (closed threes)
    four_resources: i32,
    /// Extension cells of threes and fours
    key_points: Vec<Pos>,
    /// Direction bits of two-level extensions per cell
    two_marks: [u8; TOTAL_CELLS],
    /// Direction bits of three-level extensions per cell
    three_marks: [u8; TOTAL_CELLS],
}

impl SideSummary {
    fn new() -> Self {
        Self {
            score: 0,
            five: false,
            open_fours: 0,
            fours: 0,
            open_threes: 0,
            four_resources: 0,
            key_points: Vec::new(),
            two_marks: [0; TOTAL_CELLS],
            three_marks: [0; TOTAL_CELLS],
        }
    }

    /// Cells where a single move would create two threats.
    fn mise_points(&self, color: Stone) -> i32 {
        let mut n = 0;
        for i in 0..TOTAL_CELLS {
            let all = self.two_marks[i] | self.three_marks[i];
            let fork = if color == Stone::Black {
                // two twos become a double-three, which Black may not play
                self.three_marks[i] != 0 && all.count_ones() >= 2
            } else {
                all.count_ones() >= 2
            };
            if fork {
                n += 1;
            }
        }
        n.min(MAX_MISE_POINTS)
    }
}

/// Evaluate the board from the perspective of `color` with a fresh
/// forbidden-move checker.
///
/// Returns a score where:
/// - Positive values indicate advantage for `color`
/// - `FIVE_SCORE` / `-FIVE_SCORE` mark a finished game
///
/// Symmetric for negamax: `evaluate(b, Black, w) == -evaluate(b, White, w)`.
#[must_use]
pub fn evaluate(board: &Board, color: Stone, weights: &PatternWeights) -> i32 {
    let mut checker = ForbiddenChecker::with_cache_capacity(256);
    evaluate_with(board, color, weights, &mut checker)
}

/// Evaluate using the caller's forbidden-move checker (and its cache).
pub fn evaluate_with(
    board: &Board,
    color: Stone,
    weights: &PatternWeights,
    checker: &mut ForbiddenChecker,
) -> i32 {
    let opponent = color.opponent();
    let mine = summarize(board, color, weights);
    let theirs = summarize(board, opponent, weights);

    if mine.five {
        return FIVE_SCORE;
    }
    if theirs.five {
        return -FIVE_SCORE;
    }

    let pattern_score = mine.score - theirs.score;
    let combo_score = combo_bonus(&mine, weights) - combo_bonus(&theirs, weights);
    let mise_score =
        (mine.mise_points(color) - theirs.mise_points(opponent)) * weights.mise_point;
    let counter_score = counter_four_penalty(&theirs, &mine, weights)
        - counter_four_penalty(&mine, &theirs, weights);
    let position_score =
        evaluate_positions(board, color, weights) - evaluate_positions(board, opponent, weights);

    let (black, white) = if color == Stone::Black {
        (&mine, &theirs)
    } else {
        (&theirs, &mine)
    };
    let black_penalty = forbidden_vulnerability(board, black, white, weights, checker);
    let forbidden_score = if color == Stone::Black {
        -black_penalty
    } else {
        black_penalty
    };

    pattern_score
        + combo_score
        + mise_score
        + counter_score
        + position_score
        + forbidden_score
        + opening_bonus(board, color, weights)
}

/// Named-opening bonus: exactly the configured value for Black and its
/// negation for White, only while the board holds the three opening stones.
pub fn opening_bonus(board: &Board, color: Stone, weights: &PatternWeights) -> i32 {
    if board.stone_count() != 3 {
        return 0;
    }
    let Some(jushu) = classify_opening(board) else {
        return 0;
    };
    let value = weights.opening(jushu);
    match color {
        Stone::Black => value,
        Stone::White => -value,
        Stone::Empty => 0,
    }
}

fn summarize(board: &Board, color: Stone, weights: &PatternWeights) -> SideSummary {
    let mut summary = SideSummary::new();
    let Some(stones) = board.stones(color) else {
        return summary;
    };

    for pos in stones.iter_ones() {
        for (dir, &(dr, dc)) in DIRECTIONS.iter().enumerate() {
            let Some(seg) = evaluate_line(board, pos, dr, dc, color) else {
                continue;
            };
            let bit = 1u8 << dir;
            match seg.kind {
                LineKind::Five => summary.five = true,
                LineKind::OpenFour => {
                    summary.score += weights.open_four;
                    summary.open_fours += 1;
                }
                LineKind::Four => {
                    summary.score += weights.four;
                    summary.fours += 1;
                }
                LineKind::OpenThree => {
                    summary.score += weights.open_three;
                    summary.open_threes += 1;
                }
                LineKind::ClosedThree => {
                    summary.score += weights.closed_three;
                    summary.four_resources += 1;
                }
                LineKind::OpenTwo => summary.score += weights.open_two,
                LineKind::ClosedTwo => summary.score += weights.closed_two,
                LineKind::None => {}
            }
            for ext in seg.extensions.iter().flatten() {
                let idx = ext.to_index();
                match seg.kind {
                    LineKind::OpenTwo => summary.two_marks[idx] |= bit,
                    LineKind::OpenThree | LineKind::ClosedThree => {
                        summary.three_marks[idx] |= bit;
                    }
                    _ => {}
                }
                if matches!(
                    seg.kind,
                    LineKind::OpenThree | LineKind::Four | LineKind::OpenFour
                ) {
                    summary.key_points.push(*ext);
                }
            }
        }
    }
    summary
}

/// Positions where the opponent cannot block every threat.
fn combo_bonus(side: &SideSummary, weights: &PatternWeights) -> i32 {
    let mut bonus = 0;
    if side.open_fours >= 1 && (side.fours >= 1 || side.open_threes >= 1) {
        bonus += weights.double_threat;
    }
    if side.fours >= 2 {
        bonus += weights.double_threat;
    }
    if side.fours >= 1 && side.open_threes >= 1 {
        bonus += weights.double_threat;
    }
    if side.open_threes >= 2 {
        bonus += weights.double_threat / 2;
    }
    bonus
}

/// An open three is worth less when the other side can answer with fours.
fn counter_four_penalty(side: &SideSummary, other: &SideSummary, weights: &PatternWeights) -> i32 {
    side.open_threes.min(other.four_resources + other.fours) * weights.counter_four
}

/// Black key points that Black may not play, plus White five points Black
/// could not block.
fn forbidden_vulnerability(
    board: &Board,
    black: &SideSummary,
    white: &SideSummary,
    weights: &PatternWeights,
    checker: &mut ForbiddenChecker,
) -> i32 {
    let mut penalty = 0;
    let mut probes = 0;
    let mut seen = Vec::with_capacity(MAX_FORBIDDEN_PROBES);

    let candidates = black
        .key_points
        .iter()
        .map(|p| (*p, weights.forbidden_point))
        .chain(white.key_points.iter().map(|p| (*p, weights.forbidden_point * 2)));
    for (pos, weight) in candidates {
        if probes >= MAX_FORBIDDEN_PROBES {
            break;
        }
        if seen.contains(&pos) || !board.is_empty(pos) {
            continue;
        }
        seen.push(pos);
        probes += 1;
        if checker.classify(board, pos).is_forbidden {
            penalty += weight;
        }
    }
    penalty
}

/// Evaluate a single line segment starting at `pos` in direction `(dr, dc)`.
///
/// Only counts the segment if `pos` is its first stone (no same-color stone
/// in the negative direction), so each segment is counted exactly once.
/// One internal gap is allowed (`X_XXX`, `XX_X`).
fn evaluate_line(board: &Board, pos: Pos, dr: i32, dc: i32, color: Stone) -> Option<Segment> {
    let before = pos.offset(dr, dc, -1);
    if before.is_some_and(|p| board.get(p) == color) {
        return None;
    }

    let mut extensions = [None; 3];
    let mut open_ends = 0;
    if let Some(p) = before.filter(|p| board.is_empty(*p)) {
        open_ends += 1;
        extensions[0] = Some(p);
    }

    let mut count = 1;
    let mut gap: Option<Pos> = None;
    let mut k = 1;
    while let Some(p) = pos.offset(dr, dc, k) {
        match board.get(p) {
            s if s == color => count += 1,
            Stone::Empty if gap.is_none() => {
                let resumes = pos
                    .offset(dr, dc, k + 1)
                    .is_some_and(|n| board.get(n) == color);
                if resumes {
                    gap = Some(p);
                } else {
                    open_ends += 1;
                    extensions[2] = Some(p);
                    break;
                }
            }
            Stone::Empty => {
                open_ends += 1;
                extensions[2] = Some(p);
                break;
            }
            _ => break,
        }
        k += 1;
    }
    extensions[1] = gap;

    let kind = if gap.is_some() {
        match count {
            5.. if color == Stone::Black => LineKind::None,
            5.. => LineKind::Four,
            4 => LineKind::Four,
            3 if open_ends == 2 => LineKind::OpenThree,
            3 if open_ends == 1 => LineKind::ClosedThree,
            2 if open_ends == 2 => LineKind::OpenTwo,
            _ => LineKind::None,
        }
    } else {
        match (count, open_ends) {
            (6.., _) if color == Stone::Black => LineKind::None,
            (5.., _) => LineKind::Five,
            (4, 2) => LineKind::OpenFour,
            (4, 1) => LineKind::Four,
            (3, 2) => LineKind::OpenThree,
            (3, 1) => LineKind::ClosedThree,
            (2, 2) => LineKind::OpenTwo,
            (2, 1) => LineKind::ClosedTwo,
            _ => LineKind::None,
        }
    };
    Some(Segment { kind, extensions })
}

/// Stones closer to the center are worth more.
fn evaluate_positions(board: &Board, color: Stone, weights: &PatternWeights) -> i32 {
    let Some(stones) = board.stones(color) else {
        return 0;
    };
    let center = (BOARD_SIZE / 2) as i32;
    stones
        .iter_ones()
        .map(|pos| {
            let dist = (i32::from(pos.row) - center).abs() + (i32::from(pos.col) - center).abs();
            (MAX_CENTER_DIST - dist) * weights.position
        })
        .sum()
}
