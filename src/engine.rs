//! Move selection: the evaluate-one-position boundary.
//!
//! The engine tries a fixed priority ladder and stops at the first phase
//! that yields a move:
//!
//! 1. **Book**: opening book for the first three stones
//! 2. **Immediate win**: complete a five
//! 3. **Block**: occupy the opponent's five point
//! 4. **VCF**: own forced win by continuous fours
//! 5. **Defense**: refute the opponent's VCF
//! 6. **VCT / Mise-VCF**: slower forced wins, when the difficulty allows
//! 7. **Alpha-beta**: iterative deepening with randomized root choice
//!
//! Failures never reach the caller of [`Engine::evaluate_move`]: they are
//! logged and replaced by a safe default move.
//!
//! # Example
//!
//! ```
//! use renju::{Board, Difficulty, Engine, EngineParams, EvaluateRequest, Pos, Stone};
//!
//! let mut engine = Engine::new(EngineParams::default(), 7);
//! let request = EvaluateRequest::new(Board::new(), Stone::Black, Difficulty::Beginner);
//! let response = engine.evaluate_move(&request);
//! assert_eq!(response.position, Some(Pos::CENTER));
//! ```

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::{Board, Pos, Stone, BOARD_SIZE};
use crate::book::OpeningBook;
use crate::config::{Difficulty, EngineParams, ThreatLimits};
use crate::error::{EngineError, Result};
use crate::eval::{evaluate_with, PatternWeights, FIVE_SCORE};
use crate::rules::{five_points, ForbiddenChecker};
use crate::search::{
    ForcedWin, RootCandidate, SearchResult, SearchStats, Searcher, TTStats, ThreatSearcher,
};

/// Cells of the opponent's VCF tried as refutations.
const MAX_DEFENSE_CANDIDATES: usize = 12;

/// Root candidates reported to the caller.
const MAX_REPORTED_CANDIDATES: usize = 5;

/// Phase of the ladder that produced the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Book,
    /// Completes a five
    ImmediateWin,
    /// Occupies the opponent's five point
    Block,
    Vcf,
    /// Refutes the opponent's VCF
    Defense,
    Vct,
    MiseVcf,
    AlphaBeta,
    /// Safe default after a failure, or no applicable move
    Fallback,
}

/// Evaluate-one-position request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub board: Board,
    pub side_to_move: Stone,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Overrides the engine's own parameters for this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<EngineParams>,
}

impl EvaluateRequest {
    pub fn new(board: Board, side_to_move: Stone, difficulty: Difficulty) -> Self {
        Self {
            board,
            side_to_move,
            difficulty,
            params: None,
        }
    }

    pub fn with_params(mut self, params: EngineParams) -> Self {
        self.params = Some(params);
        self
    }
}

/// Evaluate-one-position response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    /// `None` only when no move applies (no legal cell, invalid side)
    pub position: Option<Pos>,
    /// From the side to move's perspective
    pub score: i32,
    /// Last completed search depth; 0 outside alpha-beta
    pub depth: u8,
    pub search_type: SearchType,
    pub time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<SearchStats>,
    /// Best root moves, at most five
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<RootCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_win: Option<ForcedWin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pv: Vec<Pos>,
}

impl EvaluateResponse {
    fn quick(pos: Pos, score: i32, search_type: SearchType, time_ms: u64) -> Self {
        Self {
            position: Some(pos),
            score,
            depth: 0,
            search_type,
            time_ms,
            stats: None,
            candidates: Vec::new(),
            forced_win: None,
            pv: vec![pos],
        }
    }

    #[inline]
    fn book(pos: Pos, time_ms: u64) -> Self {
        Self::quick(pos, 0, SearchType::Book, time_ms)
    }

    #[inline]
    fn immediate_win(pos: Pos, time_ms: u64) -> Self {
        Self::quick(pos, FIVE_SCORE, SearchType::ImmediateWin, time_ms)
    }

    #[inline]
    fn block(pos: Pos, score: i32, time_ms: u64) -> Self {
        Self::quick(pos, score, SearchType::Block, time_ms)
    }

    /// Own forced win; the score counts down with the length of the line.
    fn forced(win: ForcedWin, search_type: SearchType, stats: SearchStats, time_ms: u64) -> Self {
        Self {
            position: Some(win.first_move),
            score: FIVE_SCORE - win.sequence.len() as i32,
            depth: 0,
            search_type,
            time_ms,
            stats: Some(stats),
            candidates: Vec::new(),
            pv: win.sequence.clone(),
            forced_win: Some(win),
        }
    }

    /// Reply to the opponent's forced win; `threat` is the line refuted.
    fn defense(pos: Pos, score: i32, threat: ForcedWin, stats: SearchStats, time_ms: u64) -> Self {
        Self {
            position: Some(pos),
            score,
            depth: 0,
            search_type: SearchType::Defense,
            time_ms,
            stats: Some(stats),
            candidates: Vec::new(),
            forced_win: Some(threat),
            pv: vec![pos],
        }
    }

    fn from_alphabeta(result: SearchResult, time_ms: u64) -> Self {
        let mut candidates = result.candidates;
        candidates.truncate(MAX_REPORTED_CANDIDATES);
        Self {
            position: result.best_move,
            score: result.score,
            depth: result.depth,
            search_type: SearchType::AlphaBeta,
            time_ms,
            stats: Some(result.stats),
            candidates,
            forced_win: None,
            pv: result.pv,
        }
    }

    fn fallback(pos: Option<Pos>, time_ms: u64) -> Self {
        Self {
            position: pos,
            score: 0,
            depth: 0,
            search_type: SearchType::Fallback,
            time_ms,
            stats: None,
            candidates: Vec::new(),
            forced_win: None,
            pv: pos.into_iter().collect(),
        }
    }
}

/// Renju engine owning its searchers, caches and RNG.
///
/// One engine serves one player; nothing in it is shared across threads.
pub struct Engine {
    params: EngineParams,
    searcher: Searcher,
    book: OpeningBook,
    checker: ForbiddenChecker,
    rng: ChaCha20Rng,
}

impl Engine {
    /// Engine with `params`, drawing book and root choices from `seed`.
    #[must_use]
    pub fn new(params: EngineParams, seed: u64) -> Self {
        Self {
            searcher: Searcher::new(params.tt_size_mb, params.weights.clone()),
            params,
            book: OpeningBook::new(),
            checker: ForbiddenChecker::new(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn tt_stats(&self) -> TTStats {
        self.searcher.tt_stats()
    }

    /// Best move for `color`, or `None` when no move applies.
    #[must_use]
    pub fn best_move(&mut self, board: &Board, color: Stone, difficulty: Difficulty) -> Option<Pos> {
        self.evaluate_move(&EvaluateRequest::new(board.clone(), color, difficulty))
            .position
    }

    /// Evaluate one position. Never fails: errors are logged and answered
    /// with a safe default move.
    pub fn evaluate_move(&mut self, req: &EvaluateRequest) -> EvaluateResponse {
        let start = Instant::now();
        match self.try_evaluate(req) {
            Ok(response) => response,
            Err(EngineError::InvalidSide) => {
                warn!(side = ?req.side_to_move, "evaluate request without a side to move");
                EvaluateResponse::fallback(None, elapsed_ms(start))
            }
            Err(err) => {
                let pos = self.fallback_move(&req.board, req.side_to_move);
                warn!(%err, fallback = ?pos, "evaluation failed, playing safe default");
                EvaluateResponse::fallback(pos, elapsed_ms(start))
            }
        }
    }

    /// The priority ladder, with errors surfaced.
    pub fn try_evaluate(&mut self, req: &EvaluateRequest) -> Result<EvaluateResponse> {
        let start = Instant::now();
        let color = req.side_to_move;
        if color == Stone::Empty {
            return Err(EngineError::InvalidSide);
        }
        if req.board.is_full() {
            return Err(EngineError::NoLegalMove);
        }

        let params = req.params.as_ref().unwrap_or(&self.params).clone();
        if self.searcher.weights() != &params.weights {
            self.searcher.set_weights(params.weights.clone());
        }
        let search_limits = params.search_limits(req.difficulty);
        let threat_limits = params.threat_limits(req.difficulty);
        let board = &req.board;
        let opponent = color.opponent();

        // 0. Opening book, only when the request agrees with the stone count
        if params.use_book && board.side_to_move() == color {
            let randomize = search_limits.randomization > 0.0;
            if let Some(pos) = self.book.book_move(board, &mut self.rng, randomize) {
                if self.is_legal(board, pos, color) {
                    debug!(%pos, stones = board.stone_count(), "book move");
                    return Ok(EvaluateResponse::book(pos, elapsed_ms(start)));
                }
            }
        }

        // 1. Complete a five
        if let Some(&pos) = five_points(board, color).first() {
            debug!(%pos, ?color, "immediate win");
            return Ok(EvaluateResponse::immediate_win(pos, elapsed_ms(start)));
        }

        // 2. The opponent threatens five: block if possible, otherwise the
        // tree search scores the loss
        let opponent_fives = five_points(board, opponent);
        if !opponent_fives.is_empty() {
            let blocks: Vec<Pos> = opponent_fives
                .iter()
                .copied()
                .filter(|&p| self.is_legal(board, p, color))
                .collect();
            if let Some(&pos) = blocks.first() {
                if opponent_fives.len() > 1 {
                    debug!(threats = opponent_fives.len(), "multiple five points, blocking one");
                }
                let score = self.score_after(board, pos, color, &params.weights);
                return Ok(EvaluateResponse::block(pos, score, elapsed_ms(start)));
            }
            debug!(?color, "opponent five cannot be blocked legally");
            let result = self
                .searcher
                .search_with_rng(board, color, &search_limits, &mut self.rng);
            return self.finish_alphabeta(result, start);
        }

        // 3. Own VCF
        let mut threats = ThreatSearcher::new(threat_limits);
        if let Some(win) = threats.search_vcf(board, color) {
            return Ok(EvaluateResponse::forced(
                win,
                SearchType::Vcf,
                threat_stats(&threats),
                elapsed_ms(start),
            ));
        }

        // 4. Opponent VCF
        if let Some((pos, threat)) = self.defend_vcf(board, color, &threat_limits) {
            let score = self.score_after(board, pos, color, &params.weights);
            debug!(%pos, attack = %threat.first_move, "defending against VCF");
            return Ok(EvaluateResponse::defense(
                pos,
                score,
                threat,
                threat_stats(&threats),
                elapsed_ms(start),
            ));
        }

        // 5. VCT
        if threat_limits.enable_vct {
            if let Some(win) = threats.search_vct(board, color) {
                return Ok(EvaluateResponse::forced(
                    win,
                    SearchType::Vct,
                    threat_stats(&threats),
                    elapsed_ms(start),
                ));
            }
        }

        // 6. Mise-VCF
        if threat_limits.enable_mise {
            if let Some(win) = threats.search_mise_vcf(board, color) {
                return Ok(EvaluateResponse::forced(
                    win,
                    SearchType::MiseVcf,
                    threat_stats(&threats),
                    elapsed_ms(start),
                ));
            }
        }

        // 7. Alpha-beta
        let result = self
            .searcher
            .search_with_rng(board, color, &search_limits, &mut self.rng);
        self.finish_alphabeta(result, start)
    }

    fn finish_alphabeta(&self, result: SearchResult, start: Instant) -> Result<EvaluateResponse> {
        if result.best_move.is_none() {
            return Err(EngineError::NoLegalMove);
        }
        if result.interrupted {
            debug!(depth = result.depth, nodes = result.stats.nodes, "search budget exhausted");
        }
        Ok(EvaluateResponse::from_alphabeta(result, elapsed_ms(start)))
    }

    /// Find a move after which the opponent has no VCF.
    ///
    /// Candidates are the cells of the opponent's winning line. When none of
    /// them refutes it, the attacker's first move is occupied anyway. Returns
    /// the chosen cell and the refuted line.
    fn defend_vcf(
        &mut self,
        board: &Board,
        color: Stone,
        limits: &ThreatLimits,
    ) -> Option<(Pos, ForcedWin)> {
        let opponent = color.opponent();
        // Each refutation check gets a quarter of the budget
        let check_limits = ThreatLimits {
            time_limit_ms: limits.time_limit_ms / 4,
            node_limit: limits.node_limit / 4,
            ..*limits
        };
        let mut searcher = ThreatSearcher::new(*limits);
        let threat = searcher.search_vcf(board, opponent)?;
        searcher = ThreatSearcher::new(check_limits);

        let mut candidates: Vec<Pos> = Vec::new();
        for p in threat.sequence.iter().copied() {
            if !candidates.contains(&p) {
                candidates.push(p);
            }
        }
        candidates.truncate(MAX_DEFENSE_CANDIDATES);

        let mut work = board.clone();
        for d in candidates {
            if !self.checker.is_legal(&mut work, d, color) {
                continue;
            }
            work.place_stone(d, color);
            let refuted = searcher.search_vcf(&work, opponent).is_none() && !searcher.interrupted();
            work.remove_stone(d);
            if refuted {
                return Some((d, threat));
            }
        }

        let first = threat.first_move;
        if self.checker.is_legal(&mut work, first, color) {
            debug!(%first, "no refutation found, occupying the first attack");
            Some((first, threat))
        } else {
            None
        }
    }

    fn is_legal(&mut self, board: &Board, pos: Pos, color: Stone) -> bool {
        let mut work = board.clone();
        self.checker.is_legal(&mut work, pos, color)
    }

    /// Static score of `board` after `color` plays `pos`.
    fn score_after(&mut self, board: &Board, pos: Pos, color: Stone, weights: &PatternWeights) -> i32 {
        let mut work = board.clone();
        work.place_stone(pos, color);
        evaluate_with(&work, color, weights, &mut self.checker)
    }

    /// Center if legal, else the first legal cell near the stones, else any
    /// legal cell.
    fn fallback_move(&mut self, board: &Board, color: Stone) -> Option<Pos> {
        let color = match color {
            Stone::Empty => board.side_to_move(),
            c => c,
        };
        let near = board.candidate_moves(1);
        let all = (0..BOARD_SIZE as u8).flat_map(|r| (0..BOARD_SIZE as u8).map(move |c| Pos::new(r, c)));
        let mut work = board.clone();
        std::iter::once(Pos::CENTER)
            .chain(near)
            .chain(all)
            .find(|&p| self.checker.is_legal(&mut work, p, color))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineParams::default(), 0)
    }
}

/// One-shot evaluation with a fresh engine seeded with zero.
pub fn evaluate_move(req: &EvaluateRequest) -> EvaluateResponse {
    let params = req.params.clone().unwrap_or_default();
    Engine::new(params, 0).evaluate_move(req)
}

fn threat_stats(searcher: &ThreatSearcher) -> SearchStats {
    let checker = searcher.checker_stats();
    SearchStats {
        nodes: searcher.nodes(),
        forbidden_checks: checker.checks,
        board_copies: checker.board_copies,
        ..SearchStats::default()
    }
}

#[inline]
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
