//! Headless games and a worker pool for playing many of them.
//!
//! Each game owns two engines, one per color, seeded from the request. The
//! pool runs whole games on `std::thread` workers fed through `mpsc`
//! channels; workers share nothing but the read-only Zobrist table.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::{Board, Pos, Stone, TOTAL_CELLS};
use crate::config::{Difficulty, EngineParams};
use crate::engine::{Engine, EvaluateRequest, SearchType};
use crate::error::{EngineError, Result};
use crate::rules::{has_five_at_pos, ForbiddenChecker};
use crate::search::{ForcedWinKind, SearchStats};

/// Mixed into the seed of White's engine so the two sides draw differently.
const WHITE_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

fn default_max_moves() -> usize {
    TOTAL_CELLS
}

/// One side's engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub difficulty: Difficulty,
    pub params: EngineParams,
}

impl PlayerConfig {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            params: EngineParams::default(),
        }
    }
}

/// Play-one-game request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRequest {
    #[serde(default)]
    pub black: PlayerConfig,
    #[serde(default)]
    pub white: PlayerConfig,
    /// Stop with `move_limit` after this many plies
    #[serde(default = "default_max_moves")]
    pub max_moves: usize,
    #[serde(default)]
    pub seed: u64,
    /// Pad every move to at least this long
    #[serde(default)]
    pub min_think_ms: u64,
}

impl Default for GameRequest {
    fn default() -> Self {
        Self {
            black: PlayerConfig::default(),
            white: PlayerConfig::default(),
            max_moves: default_max_moves(),
            seed: 0,
            min_think_ms: 0,
        }
    }
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The winner completed a five
    Five,
    /// Black played a forbidden (or otherwise illegal) move and lost
    Forbidden,
    /// Full board, or the side to move had no legal move
    Draw,
    /// `max_moves` plies were played without a result
    MoveLimit,
}

/// One played move with its search metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub ply: usize,
    pub color: Stone,
    pub position: Pos,
    pub score: i32,
    pub depth: u8,
    pub search_type: SearchType,
    /// Wall time including any minimum-think padding
    pub time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<SearchStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_win: Option<ForcedWinKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pv: Vec<Pos>,
}

/// A finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub seed: u64,
    pub moves: Vec<MoveRecord>,
    pub winner: Option<Stone>,
    pub termination: Termination,
    pub board: Board,
}

/// Play one game to completion. Never fails; engine failures are absorbed
/// by the engines themselves.
pub fn play_game(req: &GameRequest) -> GameRecord {
    let mut engines = [
        Engine::new(req.black.params.clone(), req.seed),
        Engine::new(req.white.params.clone(), req.seed ^ WHITE_SEED_SALT),
    ];
    let mut checker = ForbiddenChecker::new();
    let mut board = Board::new();
    let mut moves: Vec<MoveRecord> = Vec::new();
    let mut color = Stone::Black;
    let min_think = Duration::from_millis(req.min_think_ms);

    let (winner, termination) = loop {
        if board.is_full() {
            break (None, Termination::Draw);
        }
        if moves.len() >= req.max_moves {
            break (None, Termination::MoveLimit);
        }

        let player = match color {
            Stone::Black => &req.black,
            _ => &req.white,
        };
        let engine = &mut engines[color.index()];
        let started = Instant::now();
        let response = engine.evaluate_move(&EvaluateRequest::new(
            board.clone(),
            color,
            player.difficulty,
        ));
        if let Some(rest) = min_think.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }

        let Some(pos) = response.position else {
            debug!(?color, ply = moves.len(), "no legal move");
            break (None, Termination::Draw);
        };
        if color == Stone::Black && checker.is_forbidden(&mut board, pos) {
            warn!(%pos, "black played a forbidden move");
            break (Some(Stone::White), Termination::Forbidden);
        }
        if let Err(err) = board.play(pos, color) {
            warn!(%err, ?color, "illegal move from engine");
            break (Some(color.opponent()), Termination::Forbidden);
        }

        moves.push(MoveRecord {
            ply: moves.len(),
            color,
            position: pos,
            score: response.score,
            depth: response.depth,
            search_type: response.search_type,
            time_ms: started.elapsed().as_millis() as u64,
            stats: response.stats,
            forced_win: response.forced_win.as_ref().map(|w| w.kind),
            pv: response.pv,
        });

        if has_five_at_pos(&board, pos, color) {
            break (Some(color), Termination::Five);
        }
        color = color.opponent();
    };

    info!(
        seed = req.seed,
        ?winner,
        ?termination,
        plies = moves.len(),
        "game finished"
    );
    GameRecord {
        seed: req.seed,
        moves,
        winner,
        termination,
        board,
    }
}

/// Result of one game in a pool run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Position of the request in the submitted batch
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<GameRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GameOutcome {
    fn new(index: usize, result: Result<GameRecord>) -> Self {
        match result {
            Ok(record) => Self {
                index,
                record: Some(record),
                error: None,
            },
            Err(err) => Self {
                index,
                record: None,
                error: Some(err.to_string()),
            },
        }
    }
}

type Job = (usize, GameRequest);

/// Play `requests` on `workers` threads. Outcomes come back in request
/// order; a crashed game yields an outcome with an error instead of a
/// record, and the remaining games still run.
pub fn run_pool(requests: Vec<GameRequest>, workers: usize) -> Vec<GameOutcome> {
    let total = requests.len();
    let workers = workers.clamp(1, total.max(1));
    let (job_tx, job_rx) = channel::<Job>();
    let (result_tx, result_rx) = channel::<(usize, Result<GameRecord>)>();
    let job_rx = Arc::new(Mutex::new(job_rx));

    for job in requests.into_iter().enumerate() {
        if job_tx.send(job).is_err() {
            break;
        }
    }
    // Workers stop once the queue drains
    drop(job_tx);

    let handles: Vec<_> = (0..workers)
        .map(|id| {
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            thread::spawn(move || worker_loop(id, &jobs, &results))
        })
        .collect();
    drop(result_tx);

    let mut slots: Vec<Option<Result<GameRecord>>> = (0..total).map(|_| None).collect();
    for (index, result) in result_rx {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(result);
        }
    }
    for (id, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() {
            warn!(worker = id, "worker thread panicked");
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            let result = slot.unwrap_or_else(|| {
                Err(EngineError::Worker(format!("game {index} produced no result")))
            });
            GameOutcome::new(index, result)
        })
        .collect()
}

fn worker_loop(
    id: usize,
    jobs: &Mutex<Receiver<Job>>,
    results: &Sender<(usize, Result<GameRecord>)>,
) {
    loop {
        let next = match jobs.lock() {
            Ok(queue) => queue.recv(),
            Err(_) => {
                warn!(worker = id, "job queue poisoned");
                return;
            }
        };
        let Ok((index, request)) = next else {
            return;
        };
        debug!(worker = id, game = index, "starting game");
        let result = panic::catch_unwind(AssertUnwindSafe(|| play_game(&request)))
            .map_err(|payload| EngineError::Worker(panic_message(payload.as_ref())));
        if let Err(err) = &result {
            warn!(worker = id, game = index, %err, "game aborted");
        }
        if results.send((index, result)).is_err() {
            return;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SearchLimits, ThreatLimits};

    fn fast_player() -> PlayerConfig {
        PlayerConfig {
            difficulty: Difficulty::Beginner,
            params: EngineParams {
                search: Some(SearchLimits {
                    search_depth: 1,
                    time_limit_ms: 0,
                    node_limit: 2_000,
                    randomization: 0.3,
                }),
                threats: Some(ThreatLimits {
                    time_limit_ms: 0,
                    node_limit: 2_000,
                    enable_vct: false,
                    enable_mise: false,
                    ..ThreatLimits::default()
                }),
                tt_size_mb: 1,
                ..EngineParams::default()
            },
        }
    }

    fn fast_game(max_moves: usize, seed: u64) -> GameRequest {
        GameRequest {
            black: fast_player(),
            white: fast_player(),
            max_moves,
            seed,
            min_think_ms: 0,
        }
    }

    #[test]
    fn test_move_limit() {
        let record = play_game(&fast_game(6, 1));
        assert_eq!(record.termination, Termination::MoveLimit);
        assert_eq!(record.winner, None);
        assert_eq!(record.moves.len(), 6);
        assert_eq!(record.moves[0].position, Pos::CENTER);
        assert_eq!(record.board.stone_count(), 6);
        for (i, m) in record.moves.iter().enumerate() {
            let expected = if i % 2 == 0 { Stone::Black } else { Stone::White };
            assert_eq!(m.color, expected, "ply {i}");
            assert_eq!(m.ply, i);
        }
    }

    #[test]
    fn test_same_seed_same_game() {
        let a = play_game(&fast_game(12, 99));
        let b = play_game(&fast_game(12, 99));
        let pa: Vec<Pos> = a.moves.iter().map(|m| m.position).collect();
        let pb: Vec<Pos> = b.moves.iter().map(|m| m.position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_min_think_time() {
        let mut req = fast_game(2, 0);
        req.min_think_ms = 30;
        let record = play_game(&req);
        assert!(record.moves.iter().all(|m| m.time_ms >= 30));
    }

    #[test]
    fn test_zero_move_limit() {
        let record = play_game(&fast_game(0, 0));
        assert_eq!(record.termination, Termination::MoveLimit);
        assert!(record.moves.is_empty());
    }

    #[test]
    fn test_termination_names() {
        assert_eq!(
            serde_json::to_string(&Termination::MoveLimit).unwrap(),
            "\"move_limit\""
        );
        assert_eq!(serde_json::to_string(&Termination::Five).unwrap(), "\"five\"");
        let req: GameRequest = serde_json::from_str(r#"{"seed": 5}"#).unwrap();
        assert_eq!(req.max_moves, TOTAL_CELLS);
        assert_eq!(req.black.difficulty, Difficulty::Normal);
    }

    #[test]
    fn test_pool_keeps_request_order() {
        let requests: Vec<GameRequest> = (0..3).map(|i| fast_game(4, i)).collect();
        let outcomes = run_pool(requests, 2);
        assert_eq!(outcomes.len(), 3);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.index, i);
            assert!(outcome.error.is_none(), "{:?}", outcome.error);
            let record = outcome.record.as_ref().unwrap();
            assert_eq!(record.seed, i as u64);
            assert_eq!(record.moves.len(), 4);
        }
    }

    #[test]
    fn test_pool_empty_and_zero_workers() {
        assert!(run_pool(Vec::new(), 4).is_empty());
        let outcomes = run_pool(vec![fast_game(2, 0)], 0);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].record.is_some());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
