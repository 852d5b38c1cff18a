//! VCF/VCT/Mise-VCF threat search for forced wins
//!
//! This module implements specialized threat-space search algorithms:
//! - VCF (Victory by Continuous Fours): every attacking move is a four, so the
//!   defender's reply is forced
//! - VCT (Victory by Continuous Threats): threes are allowed too, and every
//!   defence against them must be beaten
//! - Mise-VCF: a quiet move after which the attacker holds a VCF that no
//!   defender reply can break
//!
//! These find forced wins much faster than alpha-beta by only considering
//! forcing moves. A forced block that is forbidden for Black counts as a win
//! for White (forbidden-move trap).
//!
//! Budgets make the search incomplete. Depth ceilings, node and time limits,
//! and the per-node caps on VCT branches and Mise candidates all mark the
//! search as cut: a `None` result with [`ThreatSearcher::interrupted`] set
//! means "no win found", not "no win exists". Without it, every generated
//! attacking move was refuted.
//!
//! A Mise-VCF is only reported after a VCF is proven against every legal
//! defender reply on the board.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::board::{Board, Pos, Stone, DIRECTIONS, TOTAL_CELLS};
use crate::config::ThreatLimits;
use crate::rules::{
    five_points, makes_four, makes_three, scan_all, scan_line, ForbiddenChecker, ForbiddenStats,
    Shape,
};

use super::zobrist::ZOBRIST;

/// Three-making moves tried per VCT node.
const MAX_VCT_BRANCH: usize = 10;

/// Which search proved the win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedWinKind {
    Vcf,
    Vct,
    MiseVcf,
}

/// One attacking move and the defender replies it was proven against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatNode {
    pub attack: Pos,
    /// Empty when no reply saves the defender
    pub replies: Vec<ThreatReply>,
}

/// A defender reply and the attacker's continuation after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatReply {
    pub defense: Pos,
    /// `None` when the reply ends the line (the game is already decided)
    pub next: Option<ThreatNode>,
}

impl ThreatNode {
    /// Linear tree from alternating attacker/defender moves.
    pub fn from_line(line: &[Pos]) -> Option<ThreatNode> {
        let (&attack, rest) = line.split_first()?;
        let replies = match rest.split_first() {
            Some((&defense, tail)) => vec![ThreatReply {
                defense,
                next: ThreatNode::from_line(tail),
            }],
            None => Vec::new(),
        };
        Some(ThreatNode { attack, replies })
    }

    /// Moves along the first reply at every level.
    pub fn principal_line(&self) -> Vec<Pos> {
        let mut line = Vec::new();
        let mut node = Some(self);
        while let Some(n) = node {
            line.push(n.attack);
            node = match n.replies.first() {
                Some(reply) => {
                    line.push(reply.defense);
                    reply.next.as_ref()
                }
                None => None,
            };
        }
        line
    }

    /// Number of attacking moves in the tree.
    pub fn size(&self) -> usize {
        1 + self
            .replies
            .iter()
            .filter_map(|r| r.next.as_ref())
            .map(ThreatNode::size)
            .sum::<usize>()
    }
}

/// A proven forced win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedWin {
    pub kind: ForcedWinKind,
    pub first_move: Pos,
    /// Alternating attacker and defender moves along the principal line
    pub sequence: Vec<Pos>,
    /// Some forced reply on the way was forbidden for Black
    pub via_forbidden_trap: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<ThreatNode>,
}

impl ForcedWin {
    fn from_line(kind: ForcedWinKind, line: Vec<Pos>, via_forbidden_trap: bool) -> Option<Self> {
        let first_move = *line.first()?;
        let tree = ThreatNode::from_line(&line);
        Some(Self {
            kind,
            first_move,
            sequence: line,
            via_forbidden_trap,
            tree,
        })
    }

    fn from_tree(kind: ForcedWinKind, tree: ThreatNode, via_forbidden_trap: bool) -> Self {
        Self {
            kind,
            first_move: tree.attack,
            sequence: tree.principal_line(),
            via_forbidden_trap,
            tree: Some(tree),
        }
    }
}

/// Threat searcher for VCF/VCT/Mise-VCF.
pub struct ThreatSearcher {
    limits: ThreatLimits,
    checker: ForbiddenChecker,
    /// Positions (attacker to move) proven to have no VCF
    failed: HashSet<u64>,
    nodes: u64,
    /// Depth ceilings hit
    cuts: u64,
    interrupted: bool,
    deadline: Option<Instant>,
}

impl ThreatSearcher {
    pub fn new(limits: ThreatLimits) -> Self {
        Self {
            limits,
            checker: ForbiddenChecker::new(),
            failed: HashSet::new(),
            nodes: 0,
            cuts: 0,
            interrupted: false,
            deadline: None,
        }
    }

    /// Create a threat searcher with custom depth limits
    pub fn with_depths(vcf_depth: u8, vct_depth: u8) -> Self {
        Self::new(ThreatLimits {
            vcf_depth,
            vct_depth,
            ..ThreatLimits::default()
        })
    }

    pub fn limits(&self) -> &ThreatLimits {
        &self.limits
    }

    /// Nodes visited by the last search.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Whether the last search hit a depth, node or time budget.
    pub fn interrupted(&self) -> bool {
        self.interrupted || self.cuts > 0
    }

    pub fn checker_stats(&self) -> ForbiddenStats {
        self.checker.stats()
    }

    fn begin(&mut self) {
        self.nodes = 0;
        self.cuts = 0;
        self.interrupted = false;
        self.failed.clear();
        self.deadline = (self.limits.time_limit_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(self.limits.time_limit_ms));
    }

    fn out_of_budget(&mut self) -> bool {
        if self.interrupted {
            return true;
        }
        if self.limits.node_limit > 0 && self.nodes >= self.limits.node_limit {
            self.interrupted = true;
        } else if self.nodes & 127 == 0 {
            if let Some(deadline) = self.deadline {
                self.interrupted = Instant::now() >= deadline;
            }
        }
        if self.interrupted {
            trace!(nodes = self.nodes, "threat search budget exhausted");
        }
        self.interrupted
    }

    // =========================================================================
    // VCF
    // =========================================================================

    /// Search for a win by continuous fours for `attacker`, who is to move.
    ///
    /// The returned sequence ends with a five or with a forced reply that is
    /// forbidden for Black.
    pub fn search_vcf(&mut self, board: &Board, attacker: Stone) -> Option<ForcedWin> {
        self.begin();
        let mut work = board.clone();
        let mut line = Vec::new();
        let trap = self.vcf(&mut work, attacker, 0, &mut line)?;
        let win = ForcedWin::from_line(ForcedWinKind::Vcf, line, trap)?;
        debug!(
            attacker = ?attacker,
            first = %win.first_move,
            len = win.sequence.len(),
            trap,
            nodes = self.nodes,
            "VCF found"
        );
        Some(win)
    }

    /// Returns `Some(via_trap)` when a VCF exists; `line` then holds it.
    fn vcf(&mut self, board: &mut Board, attacker: Stone, depth: u8, line: &mut Vec<Pos>) -> Option<bool> {
        self.nodes += 1;
        if self.out_of_budget() {
            return None;
        }
        let defender = attacker.opponent();

        if let Some(&win) = five_points(board, attacker).first() {
            line.push(win);
            return Some(false);
        }
        if depth >= self.limits.vcf_depth {
            self.cuts += 1;
            return None;
        }

        let hash = ZOBRIST.hash(board, attacker);
        if self.failed.contains(&hash) {
            return None;
        }
        let cuts_before = self.cuts;

        // A defender five point must be taken, and taking it must be a four
        let threats = five_points(board, defender);
        let candidates = match threats.len() {
            0 => self.four_moves(board, attacker),
            1 => threats,
            _ => Vec::new(),
        };

        for mv in candidates {
            if !makes_four(board, mv, attacker) || !self.checker.is_legal(board, mv, attacker) {
                continue;
            }
            let mark = line.len();
            board.place_stone(mv, attacker);
            line.push(mv);

            let blocks = five_points(board, attacker);
            let result = match blocks.as_slice() {
                [] => None,
                [block] => {
                    let block = *block;
                    line.push(block);
                    if defender == Stone::Black && self.checker.is_forbidden(board, block) {
                        Some(true)
                    } else {
                        board.place_stone(block, defender);
                        let r = self.vcf(board, attacker, depth + 1, line);
                        board.remove_stone(block);
                        r
                    }
                }
                [first, second, ..] => {
                    // Open four or double four: block one, five on the other
                    line.push(*first);
                    line.push(*second);
                    Some(false)
                }
            };
            board.remove_stone(mv);

            if result.is_some() {
                return result;
            }
            line.truncate(mark);
            if self.interrupted {
                return None;
            }
        }

        if self.cuts == cuts_before && !self.interrupted {
            self.failed.insert(hash);
        }
        None
    }

    /// Empty cells where `color` makes a four, strongest first.
    fn four_moves(&self, board: &Board, color: Stone) -> Vec<Pos> {
        let cells = line_neighbours(board, color, 2)
            .into_iter()
            .filter(|&p| makes_four(board, p, color))
            .collect();
        ranked(board, cells, color)
    }

    // =========================================================================
    // VCT
    // =========================================================================

    /// Search for a win by continuous threats (fours and threes).
    ///
    /// Disabled below `vct_min_stones` stones on the board.
    pub fn search_vct(&mut self, board: &Board, attacker: Stone) -> Option<ForcedWin> {
        if board.stone_count() < self.limits.vct_min_stones {
            return None;
        }
        self.begin();
        let mut work = board.clone();
        let (tree, trap) = self.vct(&mut work, attacker, 0)?;
        let win = ForcedWin::from_tree(ForcedWinKind::Vct, tree, trap);
        debug!(
            attacker = ?attacker,
            first = %win.first_move,
            branches = win.tree.as_ref().map_or(0, ThreatNode::size),
            nodes = self.nodes,
            "VCT found"
        );
        Some(win)
    }

    fn vct(&mut self, board: &mut Board, attacker: Stone, depth: u8) -> Option<(ThreatNode, bool)> {
        self.nodes += 1;
        if self.out_of_budget() {
            return None;
        }

        let mut line = Vec::new();
        if let Some(trap) = self.vcf(board, attacker, 0, &mut line) {
            return ThreatNode::from_line(&line).map(|node| (node, trap));
        }
        if self.interrupted {
            return None;
        }
        if depth >= self.limits.vct_depth {
            self.cuts += 1;
            return None;
        }

        let defender = attacker.opponent();
        let forced = five_points(board, defender);
        let candidates = match forced.len() {
            0 => self.three_moves(board, attacker),
            1 => forced,
            _ => return None,
        };

        for mv in candidates {
            if !makes_three(board, mv, attacker) || !self.checker.is_legal(board, mv, attacker) {
                continue;
            }
            board.place_stone(mv, attacker);
            let outcome = self.refute_all(board, mv, attacker, depth);
            board.remove_stone(mv);

            if let Some((replies, trap)) = outcome {
                return Some((ThreatNode { attack: mv, replies }, trap));
            }
            if self.interrupted {
                return None;
            }
        }
        None
    }

    /// Prove the win against every defence of the three just made at `mv`.
    fn refute_all(
        &mut self,
        board: &mut Board,
        mv: Pos,
        attacker: Stone,
        depth: u8,
    ) -> Option<(Vec<ThreatReply>, bool)> {
        let defender = attacker.opponent();
        let mut defenses = three_defenses(board, mv, attacker);
        for p in self.four_moves(board, defender) {
            if !defenses.contains(&p) {
                defenses.push(p);
            }
        }

        let mut replies = Vec::with_capacity(defenses.len());
        let mut trap = false;
        for d in defenses {
            if !self.checker.is_legal(board, d, defender) {
                trap = true;
                continue;
            }
            board.place_stone(d, defender);
            let sub = self.vct(board, attacker, depth + 1);
            board.remove_stone(d);

            let (next, sub_trap) = sub?;
            trap |= sub_trap;
            replies.push(ThreatReply {
                defense: d,
                next: Some(next),
            });
        }
        Some((replies, trap))
    }

    /// Cells where `color` makes a three but not a four, strongest first.
    ///
    /// Dropping moves beyond the branch limit counts as a cut.
    fn three_moves(&mut self, board: &Board, color: Stone) -> Vec<Pos> {
        let cells = line_neighbours(board, color, 2)
            .into_iter()
            .filter(|&p| makes_three(board, p, color) && !makes_four(board, p, color))
            .collect();
        let mut out = ranked(board, cells, color);
        if out.len() > MAX_VCT_BRANCH {
            self.cuts += 1;
            out.truncate(MAX_VCT_BRANCH);
        }
        out
    }

    // =========================================================================
    // Mise-VCF
    // =========================================================================

    /// Search for a quiet move after which every defender reply still leaves
    /// the attacker a VCF.
    pub fn search_mise_vcf(&mut self, board: &Board, attacker: Stone) -> Option<ForcedWin> {
        if board.stone_count() < self.limits.vct_min_stones {
            return None;
        }
        self.begin();
        let mut work = board.clone();
        if !five_points(&work, attacker.opponent()).is_empty() {
            return None;
        }

        for m in self.mise_candidates(&mut work, attacker) {
            work.place_stone(m, attacker);
            let found = self.mise_after(&mut work, m, attacker);
            work.remove_stone(m);

            if let Some(win) = found {
                debug!(
                    attacker = ?attacker,
                    first = %win.first_move,
                    replies = win.tree.as_ref().map_or(0, |t| t.replies.len()),
                    nodes = self.nodes,
                    "Mise-VCF found"
                );
                return Some(win);
            }
            if self.interrupted {
                break;
            }
        }
        None
    }

    /// With the quiet move `m` on the board, prove a VCF against every legal
    /// defender reply.
    ///
    /// Replies that leave the first VCF playable move for move are checked by
    /// replaying it and are not listed in the tree; every other reply gets a
    /// fresh VCF of its own.
    fn mise_after(&mut self, board: &mut Board, m: Pos, attacker: Stone) -> Option<ForcedWin> {
        let defender = attacker.opponent();
        let mut line = Vec::new();
        let line_trap = self.vcf(board, attacker, 0, &mut line)?;

        // Likely refutations first: the line itself, then counter-fours
        let mut defenses = line.clone();
        for p in self.four_moves(board, defender) {
            if !defenses.contains(&p) {
                defenses.push(p);
            }
        }
        let mut tried = [false; TOTAL_CELLS];
        for &p in &defenses {
            tried[p.to_index()] = true;
        }
        defenses.extend(
            (0..TOTAL_CELLS)
                .filter(|&i| !tried[i])
                .map(Pos::from_index)
                .filter(|&p| board.is_empty(p)),
        );

        let mut replies = Vec::new();
        let mut trap = false;
        for d in defenses {
            if !board.is_empty(d) {
                continue;
            }
            self.nodes += 1;
            if self.out_of_budget() {
                return None;
            }
            if !self.checker.is_legal(board, d, defender) {
                trap |= line.contains(&d);
                continue;
            }
            board.place_stone(d, defender);
            if self.line_holds(board, attacker, &line) {
                board.remove_stone(d);
                trap |= line_trap;
                continue;
            }
            let mut reply_line = Vec::new();
            let sub = self.vcf(board, attacker, 0, &mut reply_line);
            board.remove_stone(d);

            trap |= sub?;
            replies.push(ThreatReply {
                defense: d,
                next: ThreatNode::from_line(&reply_line),
            });
        }

        let tree = ThreatNode { attack: m, replies };
        Some(ForcedWin::from_tree(ForcedWinKind::MiseVcf, tree, trap))
    }

    /// Whether the VCF `line` still wins for `attacker` move for move.
    ///
    /// Follows the same rules as the VCF search: a defender five point must
    /// be taken by the next four, each attack must be a legal four, and the
    /// forced block must be the next cell of the line. The board is restored
    /// before returning.
    fn line_holds(&mut self, board: &mut Board, attacker: Stone, line: &[Pos]) -> bool {
        let defender = attacker.opponent();
        let mut placed = Vec::with_capacity(line.len());
        let mut rest = line;

        let holds = loop {
            if !five_points(board, attacker).is_empty() {
                break true;
            }
            let Some((&mv, tail)) = rest.split_first() else {
                break false;
            };
            let threats = five_points(board, defender);
            if threats.len() > 1 || threats.first().is_some_and(|&t| t != mv) {
                break false;
            }
            if !board.is_empty(mv)
                || !makes_four(board, mv, attacker)
                || !self.checker.is_legal(board, mv, attacker)
            {
                break false;
            }
            board.place_stone(mv, attacker);
            placed.push(mv);

            let blocks = five_points(board, attacker);
            match blocks.as_slice() {
                [] => break false,
                [block] => {
                    if tail.first() != Some(block) {
                        break false;
                    }
                    if defender == Stone::Black && self.checker.is_forbidden(board, *block) {
                        break true;
                    }
                    board.place_stone(*block, defender);
                    placed.push(*block);
                    rest = &tail[1..];
                }
                _ => break true,
            }
        };

        for &p in placed.iter().rev() {
            board.remove_stone(p);
        }
        holds
    }

    /// Quiet legal moves that build toward threats, best first.
    ///
    /// Stopping at the candidate limit with legal moves left counts as a cut.
    fn mise_candidates(&mut self, board: &mut Board, color: Stone) -> Vec<Pos> {
        let cells: Vec<Pos> = line_neighbours(board, color, 2)
            .into_iter()
            .filter(|&p| !makes_four(board, p, color))
            .collect();
        let mut out = Vec::new();
        for p in ranked(board, cells, color) {
            if !self.checker.is_legal(board, p, color) {
                continue;
            }
            if out.len() >= self.limits.mise_candidates {
                self.cuts += 1;
                break;
            }
            out.push(p);
        }
        out
    }
}

impl Default for ThreatSearcher {
    fn default() -> Self {
        Self::new(ThreatLimits::default())
    }
}

/// Empty cells within `reach` of a `color` stone along one of the four axes.
fn line_neighbours(board: &Board, color: Stone, reach: i32) -> Vec<Pos> {
    let Some(stones) = board.stones(color) else {
        return Vec::new();
    };
    let mut seen = [false; TOTAL_CELLS];
    let mut out = Vec::new();
    for s in stones.iter_ones() {
        for &(dr, dc) in &DIRECTIONS {
            for k in (-reach..=reach).filter(|&k| k != 0) {
                let Some(p) = s.offset(dr, dc, k) else {
                    continue;
                };
                if !seen[p.to_index()] && board.is_empty(p) {
                    seen[p.to_index()] = true;
                    out.push(p);
                }
            }
        }
    }
    out
}

/// Threat strength of `color` playing `pos`.
fn threat_rank(board: &Board, pos: Pos, color: Stone) -> i32 {
    scan_all(board, pos, color)
        .iter()
        .map(|s| match s.shape {
            Shape::Five => 100,
            Shape::Overline => 0,
            Shape::ClosedThree => 1,
            shape if shape.is_four() => 10 * i32::from(shape.four_count()),
            shape if shape.is_three() => 3,
            _ => 0,
        })
        .sum()
}

/// Sort by threat strength, ties by board order.
fn ranked(board: &Board, cells: Vec<Pos>, color: Stone) -> Vec<Pos> {
    let mut scored: Vec<(i32, Pos)> = cells
        .into_iter()
        .map(|p| (threat_rank(board, p, color), p))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, p)| p).collect()
}

/// Defender cells that stop the three(s) made at `mv`.
///
/// With threes on several axes a defence must stop all of them.
fn three_defenses(board: &mut Board, mv: Pos, attacker: Stone) -> Vec<Pos> {
    let defender = attacker.opponent();
    let mut result: Option<Vec<Pos>> = None;

    for shape in scan_all(board, mv, attacker).iter().filter(|s| s.shape.is_three()) {
        let (dr, dc) = DIRECTIONS[shape.dir];
        let mut axis = Vec::new();
        for k in -4..=4 {
            let Some(p) = mv.offset(dr, dc, k) else {
                continue;
            };
            if !board.is_empty(p) {
                continue;
            }
            board.place_stone(p, defender);
            let still_three = scan_line(board, mv, attacker, shape.dir).shape.is_three();
            board.remove_stone(p);
            if !still_three {
                axis.push(p);
            }
        }
        result = Some(match result {
            None => axis,
            Some(prev) => prev.into_iter().filter(|p| axis.contains(p)).collect(),
        });
    }
    result.unwrap_or_default()
}
