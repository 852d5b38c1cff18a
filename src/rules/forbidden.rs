//! Renju forbidden moves for Black
//!
//! Black may not play a double-three, a double-four or an overline, unless
//! the same move completes an exact five. A three only counts when it can
//! really become a straight four: at least one of its straight-four points
//! must itself be legal for Black with the three's stone on the board. That
//! check recurses, so a three can be "false" because its extension is itself
//! forbidden.
//!
//! Recursion carries an explicit in-progress set. A nested request for a cell
//! that is already being classified answers "not forbidden": inside a cycle a
//! three is not yet proven, so it cannot forbid anything. Results that relied
//! on such a cut are never cached.
//!
//! On a real board that cycle cannot close. Each cell under classification
//! holds its Black stone while its straight-four points are judged, and those
//! points are always empty, so a nested request never names an in-progress
//! cell. Every answer is then the plain fixed point of the recursion; only
//! the depth ceiling can still cut it short.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::board::{Board, Pos, Stone};
use crate::search::zobrist::ZOBRIST;

use super::patterns::{scan_all, Shape};

/// Nested classifications deeper than this are treated as unproven.
pub const MAX_RECURSION_DEPTH: usize = 16;

/// Default capacity of the cross-call legality cache.
const DEFAULT_CACHE_CAPACITY: usize = 1 << 16;

/// Why a move is forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenKind {
    #[default]
    None,
    DoubleThree,
    DoubleFour,
    Overline,
}

/// Legality classification of one empty cell for Black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ForbiddenMoveResult {
    pub is_forbidden: bool,
    pub kind: ForbiddenKind,
}

impl From<ForbiddenKind> for ForbiddenMoveResult {
    fn from(kind: ForbiddenKind) -> Self {
        Self {
            is_forbidden: kind != ForbiddenKind::None,
            kind,
        }
    }
}

impl ForbiddenMoveResult {
    pub const ALLOWED: ForbiddenMoveResult = ForbiddenMoveResult {
        is_forbidden: false,
        kind: ForbiddenKind::None,
    };
}

/// Cross-call cache keyed by (stone hash, cell).
///
/// The stone hash changes with every placement, so stale entries are never
/// hit; the map is simply dropped when it grows past its capacity.
#[derive(Debug)]
pub struct LegalityCache {
    map: HashMap<(u64, Pos), ForbiddenKind>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl LegalityCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity.min(4096)),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, hash: u64, pos: Pos) -> Option<ForbiddenKind> {
        let found = self.map.get(&(hash, pos)).copied();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn insert(&mut self, hash: u64, pos: Pos, kind: ForbiddenKind) {
        if self.map.len() >= self.capacity {
            self.map.clear();
        }
        self.map.insert((hash, pos), kind);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for LegalityCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenStats {
    /// Top-level classify requests
    pub checks: u64,
    /// Classifications actually computed (including nested ones)
    pub evaluations: u64,
    pub cache_hits: u64,
    /// Nested requests answered by the in-progress or depth rule
    pub cycle_cuts: u64,
    pub board_copies: u64,
}

/// State of one top-level classification.
struct CallContext {
    local: HashMap<(u64, Pos), ForbiddenKind>,
    in_progress: Vec<Pos>,
    cuts: u64,
}

impl CallContext {
    fn new(in_progress: &[Pos]) -> Self {
        Self {
            local: HashMap::new(),
            in_progress: in_progress.to_vec(),
            cuts: 0,
        }
    }
}

/// Forbidden-move classifier owning a session-long legality cache.
#[derive(Debug, Default)]
pub struct ForbiddenChecker {
    cache: LegalityCache,
    stats: ForbiddenStats,
}

impl ForbiddenChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            cache: LegalityCache::new(capacity),
            stats: ForbiddenStats::default(),
        }
    }

    pub fn stats(&self) -> ForbiddenStats {
        self.stats
    }

    pub fn cache(&self) -> &LegalityCache {
        &self.cache
    }

    /// Classify `pos` for Black without touching `board`.
    /// Works on a private copy.
    pub fn classify(&mut self, board: &Board, pos: Pos) -> ForbiddenMoveResult {
        let mut work = board.clone();
        self.stats.board_copies += 1;
        self.classify_mut(&mut work, pos)
    }

    /// Classify `pos` for Black using place/undo on `board`.
    /// The board is restored before returning.
    pub fn classify_mut(&mut self, board: &mut Board, pos: Pos) -> ForbiddenMoveResult {
        self.classify_with(board, pos, &[])
    }

    /// Classification with a pre-seeded in-progress set.
    pub(crate) fn classify_with(
        &mut self,
        board: &mut Board,
        pos: Pos,
        in_progress: &[Pos],
    ) -> ForbiddenMoveResult {
        self.stats.checks += 1;
        let hash = ZOBRIST.hash_stones(board);
        let mut ctx = CallContext::new(in_progress);
        self.resolve(board, pos, hash, 0, &mut ctx).into()
    }

    pub fn is_forbidden(&mut self, board: &mut Board, pos: Pos) -> bool {
        self.classify_mut(board, pos).is_forbidden
    }

    /// Empty, and for Black also not forbidden.
    pub fn is_legal(&mut self, board: &mut Board, pos: Pos, color: Stone) -> bool {
        if !board.is_empty(pos) {
            return false;
        }
        match color {
            Stone::Black => !self.is_forbidden(board, pos),
            Stone::White => true,
            Stone::Empty => false,
        }
    }

    fn resolve(
        &mut self,
        board: &mut Board,
        pos: Pos,
        hash: u64,
        depth: usize,
        ctx: &mut CallContext,
    ) -> ForbiddenKind {
        if ctx.in_progress.contains(&pos) || depth > MAX_RECURSION_DEPTH {
            ctx.cuts += 1;
            self.stats.cycle_cuts += 1;
            return ForbiddenKind::None;
        }
        if !board.is_empty(pos) {
            return ForbiddenKind::None;
        }
        if let Some(kind) = ctx.local.get(&(hash, pos)) {
            self.stats.cache_hits += 1;
            return *kind;
        }
        if let Some(kind) = self.cache.get(hash, pos) {
            self.stats.cache_hits += 1;
            return kind;
        }

        self.stats.evaluations += 1;
        let cuts_before = ctx.cuts;
        ctx.in_progress.push(pos);
        let kind = self.evaluate(board, pos, hash, depth, ctx);
        ctx.in_progress.pop();

        if ctx.cuts == cuts_before {
            ctx.local.insert((hash, pos), kind);
            self.cache.insert(hash, pos, kind);
        } else {
            trace!(%pos, ?kind, depth, "provisional legality result not cached");
        }
        kind
    }

    fn evaluate(
        &mut self,
        board: &mut Board,
        pos: Pos,
        hash: u64,
        depth: usize,
        ctx: &mut CallContext,
    ) -> ForbiddenKind {
        let shapes = scan_all(board, pos, Stone::Black);

        if shapes.iter().any(|s| s.shape == Shape::Five) {
            return ForbiddenKind::None;
        }
        if shapes.iter().any(|s| s.shape == Shape::Overline) {
            return ForbiddenKind::Overline;
        }
        let fours: u8 = shapes.iter().map(|s| s.shape.four_count()).sum();
        if fours >= 2 {
            return ForbiddenKind::DoubleFour;
        }

        let threes: Vec<_> = shapes.iter().filter(|s| s.shape.is_three()).collect();
        if threes.len() < 2 {
            return ForbiddenKind::None;
        }

        // The three's own stone stays on the board while its extensions are judged.
        board.place_stone(pos, Stone::Black);
        let child_hash = ZOBRIST.update_stone(hash, pos, Stone::Black);
        let mut valid = 0;
        for three in &threes {
            let real = three
                .straight_four_points
                .iter()
                .any(|sfp| self.resolve(board, sfp, child_hash, depth + 1, ctx) == ForbiddenKind::None);
            if real {
                valid += 1;
                if valid >= 2 {
                    break;
                }
            }
        }
        board.remove_stone(pos);

        if valid >= 2 {
            ForbiddenKind::DoubleThree
        } else {
            ForbiddenKind::None
        }
    }
}

/// One-shot classification with a fresh checker.
pub fn classify(board: &Board, pos: Pos) -> ForbiddenMoveResult {
    ForbiddenChecker::new().classify(board, pos)
}

/// Whether Black may not play `pos`.
pub fn is_forbidden(board: &Board, pos: Pos) -> bool {
    classify(board, pos).is_forbidden
}

/// Whether `color` may play `pos`: empty, and not forbidden for Black.
pub fn is_legal_move(board: &Board, pos: Pos, color: Stone) -> bool {
    if !board.is_empty(pos) {
        return false;
    }
    color == Stone::White || (color == Stone::Black && !is_forbidden(board, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::TOTAL_CELLS;

    fn place(board: &mut Board, cells: &[(u8, u8)], color: Stone) {
        for &(r, c) in cells {
            board.place_stone(Pos::new(r, c), color);
        }
    }

    /// The eight board symmetries applied to a cell.
    fn transform(p: Pos, sym: usize) -> Pos {
        let n = 14u8;
        let (r, c) = (p.row, p.col);
        let (r, c) = match sym % 4 {
            0 => (r, c),
            1 => (c, n - r),
            2 => (n - r, n - c),
            _ => (n - c, r),
        };
        if sym >= 4 {
            Pos::new(r, n - c)
        } else {
            Pos::new(r, c)
        }
    }

    fn transform_board(board: &Board, sym: usize) -> Board {
        let mut out = Board::new();
        for p in board.black.iter_ones() {
            out.place_stone(transform(p, sym), Stone::Black);
        }
        for p in board.white.iter_ones() {
            out.place_stone(transform(p, sym), Stone::White);
        }
        out
    }

    /// Cross of two open threes through (7,7).
    fn cross_board() -> Board {
        let mut board = Board::new();
        //     col: 5 6 7 8 9
        // row 5:   . . _ . .
        // row 6:   . . B . .
        // row 7:   _ B _ B _
        // row 8:   . . B . .
        // row 9:   . . _ . .
        place(
            &mut board,
            &[(7, 6), (7, 8), (6, 7), (8, 7)],
            Stone::Black,
        );
        board
    }

    #[test]
    fn test_empty_board_not_forbidden() {
        let board = Board::new();
        assert_eq!(classify(&board, Pos::CENTER), ForbiddenMoveResult::ALLOWED);
    }

    #[test]
    fn test_occupied_cell_not_forbidden() {
        let board = cross_board();
        assert!(!classify(&board, Pos::new(7, 6)).is_forbidden);
        assert!(!is_legal_move(&board, Pos::new(7, 6), Stone::Black));
    }

    #[test]
    fn test_double_three_cross() {
        let board = cross_board();
        let result = classify(&board, Pos::CENTER);
        assert!(result.is_forbidden, "cross pattern should be forbidden");
        assert_eq!(result.kind, ForbiddenKind::DoubleThree);
        assert!(!is_legal_move(&board, Pos::CENTER, Stone::Black));
    }

    #[test]
    fn test_white_has_no_forbidden_moves() {
        let mut board = Board::new();
        place(&mut board, &[(7, 6), (7, 8), (6, 7), (8, 7)], Stone::White);
        assert!(is_legal_move(&board, Pos::CENTER, Stone::White));
        let mut checker = ForbiddenChecker::new();
        assert!(checker.is_legal(&mut board, Pos::CENTER, Stone::White));
    }

    #[test]
    fn test_single_three_allowed() {
        let mut board = Board::new();
        place(&mut board, &[(7, 6), (7, 8)], Stone::Black);
        assert!(!is_forbidden(&board, Pos::CENTER));
    }

    #[test]
    fn test_blocked_three_does_not_count() {
        let mut board = cross_board();
        // O B _ B _ : horizontal becomes a closed three
        place(&mut board, &[(7, 5)], Stone::White);
        place(&mut board, &[(7, 9)], Stone::White);
        assert!(!is_forbidden(&board, Pos::CENTER));
    }

    #[test]
    fn test_double_four_two_axes() {
        let mut board = Board::new();
        place(&mut board, &[(7, 4), (7, 5), (7, 6)], Stone::Black);
        place(&mut board, &[(4, 7), (5, 7), (6, 7)], Stone::Black);
        let result = classify(&board, Pos::CENTER);
        assert_eq!(result.kind, ForbiddenKind::DoubleFour);
    }

    #[test]
    fn test_double_four_same_line() {
        // B _ B B [.] _ B  -> X.XXX.X after the move
        let mut board = Board::new();
        place(&mut board, &[(7, 3), (7, 5), (7, 6), (7, 9)], Stone::Black);
        let result = classify(&board, Pos::new(7, 7));
        assert_eq!(result.kind, ForbiddenKind::DoubleFour);
    }

    #[test]
    fn test_overline() {
        let mut board = Board::new();
        place(&mut board, &[(7, 2), (7, 3), (7, 4), (7, 6), (7, 7)], Stone::Black);
        let result = classify(&board, Pos::new(7, 5));
        assert_eq!(result.kind, ForbiddenKind::Overline);
    }

    #[test]
    fn test_five_overrides_double_four() {
        let mut board = Board::new();
        // horizontal five plus two more fours through (7,7)
        place(&mut board, &[(7, 3), (7, 4), (7, 5), (7, 6)], Stone::Black);
        place(&mut board, &[(4, 7), (5, 7), (6, 7)], Stone::Black);
        place(&mut board, &[(4, 4), (5, 5), (6, 6)], Stone::Black);
        let result = classify(&board, Pos::CENTER);
        assert!(!result.is_forbidden, "five must override double-four");
    }

    #[test]
    fn test_five_overrides_double_three() {
        let mut board = cross_board();
        place(&mut board, &[(3, 3), (4, 4), (5, 5), (6, 6)], Stone::Black);
        assert!(!is_forbidden(&board, Pos::CENTER));
    }

    #[test]
    fn test_false_three_extension_is_overline() {
        let mut board = Board::new();
        // Horizontal: O _ B B [.] _ _   only straight-four point is (7,8)
        place(&mut board, &[(7, 3)], Stone::White);
        place(&mut board, &[(7, 5), (7, 6)], Stone::Black);
        // Vertical open three
        place(&mut board, &[(8, 7), (9, 7)], Stone::Black);
        assert_eq!(classify(&board, Pos::CENTER).kind, ForbiddenKind::DoubleThree);

        // Column 8 turns (7,8) into an overline point
        place(&mut board, &[(5, 8), (6, 8), (8, 8), (9, 8), (10, 8)], Stone::Black);
        assert!(is_forbidden(&board, Pos::new(7, 8)));
        assert!(
            !is_forbidden(&board, Pos::CENTER),
            "three whose extension is forbidden must not count"
        );
    }

    #[test]
    fn test_false_three_extension_is_double_three() {
        let mut board = Board::new();
        place(&mut board, &[(7, 3)], Stone::White);
        place(&mut board, &[(7, 5), (7, 6)], Stone::Black);
        place(&mut board, &[(8, 7), (9, 7)], Stone::Black);
        assert!(is_forbidden(&board, Pos::CENTER));

        // With (7,7) on the board, (7,8) becomes four-three-three:
        // vertical (7..9, 8) and anti-diagonal (9,6)-(8,7)-(7,8)
        place(&mut board, &[(8, 8), (9, 8), (9, 6)], Stone::Black);

        let mut nested = board.clone();
        nested.place_stone(Pos::CENTER, Stone::Black);
        assert_eq!(classify(&nested, Pos::new(7, 8)).kind, ForbiddenKind::DoubleThree);

        assert!(
            !is_forbidden(&board, Pos::CENTER),
            "nested double-three makes the horizontal three false"
        );
    }

    #[test]
    fn test_in_progress_cell_is_not_forbidden() {
        let mut board = cross_board();
        let mut checker = ForbiddenChecker::new();
        let result = checker.classify_with(&mut board, Pos::CENTER, &[Pos::CENTER]);
        assert!(!result.is_forbidden);
        assert_eq!(checker.stats().cycle_cuts, 1);
        // Cut results are not cached: a normal call still sees the double-three
        assert!(checker.classify_mut(&mut board, Pos::CENTER).is_forbidden);
    }

    #[test]
    fn test_nested_double_three_board_needs_no_cycle_cut() {
        let mut board = Board::new();
        place(&mut board, &[(7, 3)], Stone::White);
        place(
            &mut board,
            &[(7, 5), (7, 6), (8, 7), (9, 7), (8, 8), (9, 8), (9, 6)],
            Stone::Black,
        );

        let mut checker = ForbiddenChecker::new();
        let mut forbidden = Vec::new();
        for idx in 0..TOTAL_CELLS {
            let pos = Pos::from_index(idx);
            if board.is_empty(pos) && checker.classify_mut(&mut board, pos).is_forbidden {
                forbidden.push(pos);
            }
        }
        assert_eq!(checker.stats().cycle_cuts, 0);
        assert!(!forbidden.contains(&Pos::CENTER));

        let mut nested = board.clone();
        nested.place_stone(Pos::CENTER, Stone::Black);
        let mut checker = ForbiddenChecker::new();
        let result = checker.classify_mut(&mut nested, Pos::new(7, 8));
        assert_eq!(result.kind, ForbiddenKind::DoubleThree);
        assert_eq!(checker.stats().cycle_cuts, 0);

        // Shared-cache answers match one-shot answers
        for idx in 0..TOTAL_CELLS {
            let pos = Pos::from_index(idx);
            if board.is_empty(pos) {
                assert_eq!(is_forbidden(&board, pos), forbidden.contains(&pos), "{pos}");
            }
        }
    }

    #[test]
    fn test_classify_is_idempotent_and_restores_board() {
        let mut board = Board::new();
        place(&mut board, &[(7, 3)], Stone::White);
        place(&mut board, &[(7, 5), (7, 6), (8, 7), (9, 7), (8, 8), (9, 8), (9, 6)], Stone::Black);
        let before = board.clone();

        let mut checker = ForbiddenChecker::new();
        let first = checker.classify_mut(&mut board, Pos::CENTER);
        assert_eq!(board, before, "board must be restored");
        let second = checker.classify_mut(&mut board, Pos::CENTER);
        assert_eq!(first, second);
        assert!(checker.stats().cache_hits >= 1);
        assert_eq!(first, classify(&before, Pos::CENTER));
    }

    #[test]
    fn test_classification_symmetric_under_board_symmetries() {
        let mut cases = Vec::new();
        cases.push((cross_board(), Pos::CENTER));

        let mut b = Board::new();
        place(&mut b, &[(7, 3)], Stone::White);
        place(&mut b, &[(7, 5), (7, 6), (8, 7), (9, 7), (8, 8), (9, 8), (9, 6)], Stone::Black);
        cases.push((b, Pos::CENTER));

        let mut b = Board::new();
        place(&mut b, &[(7, 4), (7, 5), (7, 6), (4, 7), (5, 7), (6, 7)], Stone::Black);
        cases.push((b, Pos::CENTER));

        // Off-center double four near the edge
        let mut b = Board::new();
        place(&mut b, &[(2, 0), (2, 1), (2, 2), (3, 4), (4, 5), (5, 6)], Stone::Black);
        assert_eq!(classify(&b, Pos::new(2, 3)).kind, ForbiddenKind::DoubleFour);
        cases.push((b, Pos::new(2, 3)));

        for (board, pos) in &cases {
            let expected = classify(board, *pos);
            for sym in 1..8 {
                let tb = transform_board(board, sym);
                assert_eq!(
                    classify(&tb, transform(*pos, sym)),
                    expected,
                    "symmetry {sym} changed the classification"
                );
            }
        }
    }

    #[test]
    fn test_legality_cache_capacity() {
        let mut cache = LegalityCache::new(2);
        cache.insert(1, Pos::new(0, 0), ForbiddenKind::None);
        cache.insert(2, Pos::new(0, 0), ForbiddenKind::Overline);
        assert_eq!(cache.len(), 2);
        cache.insert(3, Pos::new(0, 0), ForbiddenKind::DoubleFour);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(3, Pos::new(0, 0)), Some(ForbiddenKind::DoubleFour));
        assert_eq!(cache.get(1, Pos::new(0, 0)), None);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }
}
