//! Alpha-Beta search with iterative deepening and transposition table
//!
//! Negamax with alpha-beta pruning over Renju-legal moves. One search call
//! decides one move: the transposition table is cleared at its start and
//! reused across the depths of that call.
//!
//! # Features
//!
//! - Iterative deepening; an interrupted depth is discarded and the last
//!   fully completed depth's result is returned
//! - Principal variation search at every node
//! - Null-move pruning (off near leaves and when facing a four)
//! - Futility pruning at depth 1-2 with depth-indexed margins
//! - TT move, killer moves and history heuristic for ordering
//! - Forced replies: facing a four, only the block is searched
//!
//! # Example
//!
//! ```
//! use renju::board::{Board, Stone, Pos};
//! use renju::config::SearchLimits;
//! use renju::eval::PatternWeights;
//! use renju::search::Searcher;
//!
//! let mut searcher = Searcher::new(4, PatternWeights::default());
//! let limits = SearchLimits { search_depth: 2, ..SearchLimits::default() };
//!
//! let result = searcher.search(&Board::new(), Stone::Black, &limits);
//! assert_eq!(result.best_move, Some(Pos::CENTER));
//! ```

use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, Pos, Stone, TOTAL_CELLS};
use crate::config::SearchLimits;
use crate::eval::{evaluate_with, PatternWeights, FIVE_SCORE, WIN_THRESHOLD};
use crate::rules::{five_points, scan_all, ForbiddenChecker, Shape};

use super::tt::{NodeType, TTStats, TranspositionTable};
use super::zobrist::ZOBRIST;

/// Infinity score for alpha-beta bounds
const INF: i32 = FIVE_SCORE + 1;

/// Killer slots are indexed by ply.
const MAX_PLY: usize = 64;

/// Maximum moves to consider at root.
const MAX_ROOT_MOVES: usize = 24;

/// Root candidates reported with the result.
const MAX_CANDIDATES: usize = 5;

/// Score spread sampled by a randomization factor of 1.0.
const RANDOM_WINDOW: f64 = 2_000.0;

/// Futility margins by remaining depth.
const FUTILITY_MARGIN: [i32; 3] = [0, 3_000, 12_000];

/// Ordering score from which a move counts as tactical (four or three).
const TACTICAL_MOVE: i32 = 5_000;

/// Search counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub nodes: u64,
    /// TT probes that found an entry for the position
    pub tt_hits: u64,
    /// TT hits deep enough, with a usable bound, to end the node
    pub tt_cutoffs: u64,
    pub beta_cutoffs: u64,
    pub null_cutoffs: u64,
    pub futility_skips: u64,
    pub forbidden_checks: u64,
    pub board_copies: u64,
    pub eval_calls: u64,
}

impl SearchStats {
    /// Add another call's counters.
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.tt_hits += other.tt_hits;
        self.tt_cutoffs += other.tt_cutoffs;
        self.beta_cutoffs += other.beta_cutoffs;
        self.null_cutoffs += other.null_cutoffs;
        self.futility_skips += other.futility_skips;
        self.forbidden_checks += other.forbidden_checks;
        self.board_copies += other.board_copies;
        self.eval_calls += other.eval_calls;
    }
}

/// A root move and its search score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCandidate {
    pub position: Pos,
    pub score: i32,
    /// `false` when `score` is only an upper bound from a null-window test
    #[serde(default)]
    pub exact: bool,
}

/// Search result containing the best move found and associated statistics.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move found, if any legal move exists
    pub best_move: Option<Pos>,
    /// Score of the best move from the mover's perspective
    pub score: i32,
    /// Depth fully completed by iterative deepening
    pub depth: u8,
    /// A budget stopped the search before the requested depth
    pub interrupted: bool,
    /// Principal variation, starting with the best move
    pub pv: Vec<Pos>,
    /// Best root moves, strongest first
    pub candidates: Vec<RootCandidate>,
    pub stats: SearchStats,
}

impl SearchResult {
    fn empty() -> Self {
        Self {
            best_move: None,
            score: 0,
            depth: 0,
            interrupted: false,
            pv: Vec::new(),
            candidates: Vec::new(),
            stats: SearchStats::default(),
        }
    }
}

/// Single-threaded iterative-deepening searcher.
pub struct Searcher {
    tt: TranspositionTable,
    weights: PatternWeights,
    checker: ForbiddenChecker,
    killer_moves: [[Option<Pos>; 2]; MAX_PLY],
    history: [[i32; TOTAL_CELLS]; 2],
    stats: SearchStats,
    deadline: Option<Instant>,
    node_limit: u64,
    stopped: bool,
}

impl Searcher {
    /// Create a searcher with a transposition table of `tt_size_mb` megabytes.
    #[must_use]
    pub fn new(tt_size_mb: usize, weights: PatternWeights) -> Self {
        Self {
            tt: TranspositionTable::new(tt_size_mb),
            weights,
            checker: ForbiddenChecker::new(),
            killer_moves: [[None; 2]; MAX_PLY],
            history: [[0; TOTAL_CELLS]; 2],
            stats: SearchStats::default(),
            deadline: None,
            node_limit: 0,
            stopped: false,
        }
    }

    pub fn weights(&self) -> &PatternWeights {
        &self.weights
    }

    pub fn set_weights(&mut self, weights: PatternWeights) {
        self.weights = weights;
    }

    pub fn tt_stats(&self) -> TTStats {
        self.tt.stats()
    }

    /// Deterministic search: no root randomization.
    pub fn search(&mut self, board: &Board, color: Stone, limits: &SearchLimits) -> SearchResult {
        self.run(board, color, limits, 0)
    }

    /// Search, then pick among near-best root moves according to
    /// `limits.randomization`, drawing from `rng`.
    ///
    /// Root moves inside the randomization window get exact scores, so a
    /// move is only drawn for what it is really worth.
    pub fn search_with_rng<R: Rng + ?Sized>(
        &mut self,
        board: &Board,
        color: Stone,
        limits: &SearchLimits,
        rng: &mut R,
    ) -> SearchResult {
        let window = random_window(limits.randomization);
        let mut result = self.run(board, color, limits, window);
        if let Some(choice) = pick_randomized(&result, limits.randomization, rng) {
            if Some(choice.position) != result.best_move {
                debug!(from = ?result.best_move, to = %choice.position, "randomized root move");
                result.best_move = Some(choice.position);
                result.score = choice.score;
                result.pv = vec![choice.position];
            }
        }
        result
    }

    fn begin(&mut self, limits: &SearchLimits) {
        self.tt.clear();
        self.killer_moves = [[None; 2]; MAX_PLY];
        for side in &mut self.history {
            side.fill(0);
        }
        self.stats = SearchStats::default();
        self.stopped = false;
        self.node_limit = limits.node_limit;
        self.deadline = (limits.time_limit_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(limits.time_limit_ms));
    }

    fn check_budget(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if self.node_limit > 0 && self.stats.nodes >= self.node_limit {
            self.stopped = true;
        } else if self.stats.nodes & 1023 == 0 {
            if let Some(deadline) = self.deadline {
                self.stopped = Instant::now() >= deadline;
            }
        }
        self.stopped
    }

    fn run(&mut self, board: &Board, color: Stone, limits: &SearchLimits, window: i32) -> SearchResult {
        self.begin(limits);
        let copies_before = self.checker.stats().board_copies;

        let mut work = board.clone();
        self.stats.board_copies += 1;
        let hash = ZOBRIST.hash(&work, color);

        // Immediate five needs no search
        if let Some(&win) = five_points(&work, color).first() {
            let mut result = SearchResult::empty();
            result.best_move = Some(win);
            result.score = FIVE_SCORE;
            result.depth = 1;
            result.pv = vec![win];
            result.candidates = vec![RootCandidate {
                position: win,
                score: FIVE_SCORE,
                exact: true,
            }];
            result.stats = self.stats;
            return result;
        }

        let mut root_moves = self.root_moves(&mut work, color);
        let mut best = SearchResult::empty();
        let Some(&first) = root_moves.first() else {
            best.stats = self.stats;
            return best;
        };
        best.best_move = Some(first);

        for depth in 1..=limits.search_depth.max(1) {
            let scored = self.search_root(&mut work, color, depth, hash, &root_moves, window);
            if self.stopped {
                best.interrupted = true;
                break;
            }
            let Some(&RootCandidate { position: mv, score, .. }) = scored.first() else {
                break;
            };

            best.best_move = Some(mv);
            best.score = score;
            best.depth = depth;
            best.candidates = scored.iter().take(MAX_CANDIDATES).copied().collect();
            debug!(depth, score, best = %mv, nodes = self.stats.nodes, "depth complete");

            // Prior-depth order for the next iteration
            root_moves = scored.iter().map(|c| c.position).collect();

            if score.abs() >= WIN_THRESHOLD {
                break;
            }
        }

        if let Some(mv) = best.best_move {
            best.pv = self.extract_pv(&mut work, color, mv, best.depth);
        }
        self.stats.board_copies += self.checker.stats().board_copies - copies_before;
        best.stats = self.stats;
        best
    }

    /// Search every root move; returns candidates sorted best first.
    ///
    /// With `window > 0` every move is searched with its lower bound
    /// `window` below the best score so far instead of a null window, so
    /// all moves within that distance of the best get exact scores.
    fn search_root(
        &mut self,
        board: &mut Board,
        color: Stone,
        depth: u8,
        hash: u64,
        moves: &[Pos],
        window: i32,
    ) -> Vec<RootCandidate> {
        let mut alpha = -INF;
        let beta = INF;
        let depth = depth as i8;
        let mut scored: Vec<RootCandidate> = Vec::with_capacity(moves.len());

        for (i, &mv) in moves.iter().enumerate() {
            board.place_stone(mv, color);
            let child = ZOBRIST.update_place(hash, mv, color);

            // Scores above `floor` are exact, the rest are upper bounds
            let floor = match i {
                0 => -INF,
                _ if window > 0 => (alpha - window).max(-INF),
                _ => alpha,
            };
            let score = if i == 0 || window > 0 {
                -self.alpha_beta(board, color.opponent(), depth - 1, -beta, -floor, child, 1, true)
            } else {
                let s = -self.alpha_beta(board, color.opponent(), depth - 1, -alpha - 1, -alpha, child, 1, true);
                if !self.stopped && s > alpha && s < beta {
                    -self.alpha_beta(board, color.opponent(), depth - 1, -beta, -alpha, child, 1, true)
                } else {
                    s
                }
            };
            board.remove_stone(mv);

            if self.stopped {
                return scored;
            }
            scored.push(RootCandidate {
                position: mv,
                score,
                exact: score > floor,
            });
            alpha = alpha.max(score);
        }

        // Stable: equal scores keep prior order
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        if let Some(best) = scored.first() {
            self.tt.store(hash, depth, best.score, NodeType::Exact, Some(best.position));
        }
        scored
    }

    #[allow(clippy::too_many_arguments)]
    fn alpha_beta(
        &mut self,
        board: &mut Board,
        color: Stone,
        depth: i8,
        mut alpha: i32,
        beta: i32,
        hash: u64,
        ply: usize,
        allow_null: bool,
    ) -> i32 {
        self.stats.nodes += 1;
        if self.check_budget() {
            return 0;
        }

        let mate = FIVE_SCORE - ply as i32;
        if !five_points(board, color).is_empty() {
            return mate;
        }
        let threats = five_points(board, color.opponent());
        let facing_four = !threats.is_empty();

        if depth <= 0 || ply >= MAX_PLY - 1 {
            return self.evaluate(board, color);
        }

        if self.tt.entry(hash).is_some() {
            self.stats.tt_hits += 1;
            let probed = self
                .tt
                .probe(hash, depth, score_to_tt(alpha, ply), score_to_tt(beta, ply));
            if let Some((score, _)) = probed {
                self.stats.tt_cutoffs += 1;
                return score_from_tt(score, ply);
            }
        }

        let non_terminal = alpha.abs() < WIN_THRESHOLD && beta.abs() < WIN_THRESHOLD;

        // Null move pruning
        if allow_null && depth >= 3 && !facing_four && non_terminal {
            let r = if depth >= 5 { 3 } else { 2 };
            let null_hash = ZOBRIST.toggle_side(hash);
            let null_score = -self.alpha_beta(
                board,
                color.opponent(),
                depth - 1 - r,
                -beta,
                -beta + 1,
                null_hash,
                ply + 1,
                false,
            );
            if self.stopped {
                return 0;
            }
            if null_score >= beta {
                self.stats.null_cutoffs += 1;
                return beta;
            }
        }

        let moves = if facing_four {
            // Only the block; two five points or a forbidden block lose
            let mut blocks = Vec::with_capacity(1);
            if threats.len() == 1 && self.is_legal(board, threats[0], color) {
                blocks.push((threats[0], TACTICAL_MOVE));
            }
            if blocks.is_empty() {
                return -(mate - 1);
            }
            blocks
        } else {
            let tt_move = self.tt.best_move(hash);
            let limit = match depth {
                1 => 8,
                2..=3 => 10,
                _ => 12,
            };
            self.ordered_moves(board, color, tt_move, ply, limit)
        };
        if moves.is_empty() {
            return 0;
        }

        let static_eval = if depth <= 2 && !facing_four && non_terminal {
            self.evaluate(board, color)
        } else {
            0
        };
        let futility = depth <= 2 && !facing_four && non_terminal;

        let mut best_score = -INF;
        let mut best_move = None;
        let mut node_type = NodeType::UpperBound;

        for (i, &(mv, move_score)) in moves.iter().enumerate() {
            if futility
                && i > 0
                && move_score < TACTICAL_MOVE
                && static_eval + FUTILITY_MARGIN[depth as usize] <= alpha
            {
                self.stats.futility_skips += 1;
                continue;
            }

            board.place_stone(mv, color);
            let child = ZOBRIST.update_place(hash, mv, color);
            let score = if i == 0 {
                -self.alpha_beta(board, color.opponent(), depth - 1, -beta, -alpha, child, ply + 1, true)
            } else {
                let s = -self.alpha_beta(
                    board,
                    color.opponent(),
                    depth - 1,
                    -alpha - 1,
                    -alpha,
                    child,
                    ply + 1,
                    true,
                );
                if !self.stopped && s > alpha && s < beta {
                    -self.alpha_beta(board, color.opponent(), depth - 1, -beta, -alpha, child, ply + 1, true)
                } else {
                    s
                }
            };
            board.remove_stone(mv);

            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score >= beta {
                self.stats.beta_cutoffs += 1;
                if move_score < TACTICAL_MOVE {
                    self.record_cutoff(mv, color, depth, ply);
                }
                node_type = NodeType::LowerBound;
                break;
            }
            if score > alpha {
                alpha = score;
                node_type = NodeType::Exact;
            }
        }

        self.tt
            .store(hash, depth, score_to_tt(best_score, ply), node_type, best_move);
        best_score
    }

    fn evaluate(&mut self, board: &Board, color: Stone) -> i32 {
        self.stats.eval_calls += 1;
        evaluate_with(board, color, &self.weights, &mut self.checker)
    }

    fn is_legal(&mut self, board: &mut Board, pos: Pos, color: Stone) -> bool {
        if color == Stone::Black {
            self.stats.forbidden_checks += 1;
        }
        self.checker.is_legal(board, pos, color)
    }

    fn record_cutoff(&mut self, mv: Pos, color: Stone, depth: i8, ply: usize) {
        let killers = &mut self.killer_moves[ply];
        if killers[0] != Some(mv) {
            killers[1] = killers[0];
            killers[0] = Some(mv);
        }
        let d = i32::from(depth);
        self.history[color.index()][mv.to_index()] += d * d;
    }

    /// Legal root moves, best ordering first. Facing a four, only the block
    /// (or, if it cannot be played, every move: the position is lost).
    fn root_moves(&mut self, board: &mut Board, color: Stone) -> Vec<Pos> {
        let threats = five_points(board, color.opponent());
        if threats.len() == 1 && self.is_legal(board, threats[0], color) {
            return threats;
        }
        self.ordered_moves(board, color, None, 0, MAX_ROOT_MOVES)
            .into_iter()
            .map(|(p, _)| p)
            .collect()
    }

    /// Up to `limit` legal moves with their ordering scores, best first.
    ///
    /// TT move, then killers, then static threat score plus history.
    fn ordered_moves(
        &mut self,
        board: &mut Board,
        color: Stone,
        tt_move: Option<Pos>,
        ply: usize,
        limit: usize,
    ) -> Vec<(Pos, i32)> {
        let killers = self.killer_moves[ply.min(MAX_PLY - 1)];
        let side = color.index();
        let mut scored: Vec<(Pos, i32)> = board
            .candidate_moves(2)
            .into_iter()
            .map(|p| {
                let mut s = score_move(board, p, color) + self.history[side][p.to_index()].min(2_000);
                if tt_move == Some(p) {
                    s += 10_000_000;
                } else if killers.contains(&Some(p)) {
                    s += 3_000;
                }
                (p, s)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut out = Vec::with_capacity(limit);
        for (p, s) in scored {
            if out.len() >= limit {
                break;
            }
            if self.is_legal(board, p, color) {
                out.push((p, s));
            }
        }
        out
    }

    /// Follow TT best moves from the root.
    fn extract_pv(&mut self, board: &mut Board, color: Stone, first: Pos, depth: u8) -> Vec<Pos> {
        let mut pv = vec![first];
        let mut hash = ZOBRIST.hash(board, color);
        let mut side = color;
        let mut played = Vec::new();

        board.place_stone(first, side);
        hash = ZOBRIST.update_place(hash, first, side);
        played.push(first);
        side = side.opponent();

        while pv.len() < usize::from(depth.max(1)) {
            let Some(mv) = self.tt.best_move(hash) else {
                break;
            };
            if !board.is_empty(mv) {
                break;
            }
            board.place_stone(mv, side);
            hash = ZOBRIST.update_place(hash, mv, side);
            played.push(mv);
            pv.push(mv);
            side = side.opponent();
        }
        for p in played {
            board.remove_stone(p);
        }
        pv
    }
}

/// Cheap ordering score for `color` playing `pos`: own threats first, then
/// blocks of the opponent's, then centrality.
fn score_move(board: &Board, pos: Pos, color: Stone) -> i32 {
    let own: i32 = scan_all(board, pos, color)
        .iter()
        .map(|l| match l.shape {
            Shape::Five => 1_000_000,
            Shape::OpenFour | Shape::DoubleFour => 100_000,
            Shape::ClosedFour | Shape::JumpFour => 10_000,
            Shape::OpenThree | Shape::JumpThree => 5_000,
            Shape::ClosedThree => 500,
            _ => 0,
        })
        .sum();
    let block: i32 = scan_all(board, pos, color.opponent())
        .iter()
        .map(|l| match l.shape {
            Shape::Five => 500_000,
            Shape::OpenFour | Shape::DoubleFour => 50_000,
            Shape::ClosedFour | Shape::JumpFour => 5_000,
            Shape::OpenThree | Shape::JumpThree => 2_500,
            Shape::ClosedThree => 200,
            _ => 0,
        })
        .sum();
    own + block + (14 - pos.center_distance() * 2)
}

/// Mate scores are stored relative to the node, not the root, so a
/// transposition reached at another ply keeps its distance to the five.
fn score_to_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= WIN_THRESHOLD {
        score + ply
    } else if score <= -WIN_THRESHOLD {
        score - ply
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= WIN_THRESHOLD {
        score - ply
    } else if score <= -WIN_THRESHOLD {
        score + ply
    } else {
        score
    }
}

/// Score spread for a randomization factor; 0 disables it.
fn random_window(randomization: f64) -> i32 {
    if randomization <= 0.0 {
        return 0;
    }
    (randomization.min(1.0) * RANDOM_WINDOW) as i32
}

/// Near-best candidate drawn uniformly, or `None` to keep the best move.
///
/// Only candidates with exact scores qualify.
fn pick_randomized<R: Rng + ?Sized>(
    result: &SearchResult,
    randomization: f64,
    rng: &mut R,
) -> Option<RootCandidate> {
    let window = random_window(randomization);
    if window == 0 || result.score.abs() >= WIN_THRESHOLD {
        return None;
    }
    let pool: Vec<RootCandidate> = result
        .candidates
        .iter()
        .filter(|c| c.exact && c.score >= result.score - window && c.score > -WIN_THRESHOLD)
        .copied()
        .collect();
    pool.choose(rng).copied()
}
