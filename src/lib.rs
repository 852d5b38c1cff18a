//! Renju rule-and-search engine
//!
//! A 15x15 Renju engine for Black-first play with forbidden moves:
//! - Black wins only with exactly five; White wins with five or more
//! - Double-three, double-four and overline are forbidden for Black
//! - Completing a five overrides every prohibition
//!
//! # Architecture
//!
//! - [`board`]: bitboard position, coordinates and text format
//! - [`rules`]: line patterns, recursive forbidden-move checker, win detection
//! - [`eval`]: static evaluation with swappable [`PatternWeights`]
//! - [`search`]: VCF/VCT/Mise-VCF threat search and alpha-beta with a TT
//! - [`book`]: opening book and the 26 named openings
//! - [`engine`]: evaluate-one-position boundary
//! - [`game`]: headless games and a worker pool
//! - [`config`]: difficulty presets and per-call parameters
//!
//! # Quick Start
//!
//! ```
//! use renju::{Board, Difficulty, Engine, EngineParams, EvaluateRequest, Pos, Stone};
//!
//! let mut board = Board::new();
//! board.place_stone(Pos::CENTER, Stone::Black);
//!
//! let mut engine = Engine::new(EngineParams::default(), 0);
//! let response = engine.evaluate_move(&EvaluateRequest::new(
//!     board.clone(),
//!     Stone::White,
//!     Difficulty::Beginner,
//! ));
//! if let Some(pos) = response.position {
//!     board.place_stone(pos, Stone::White);
//!     println!("White plays {pos} ({:?})", response.search_type);
//! }
//! ```
//!
//! # Search Priority
//!
//! 1. Opening book
//! 2. Immediate five, then blocking the opponent's five
//! 3. VCF, then refuting the opponent's VCF
//! 4. VCT and Mise-VCF
//! 5. Alpha-beta search with transposition table

pub mod board;
pub mod book;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod game;
pub mod rules;
pub mod search;

// Re-export commonly used types for convenience
pub use board::{Board, Pos, Stone, BOARD_SIZE};
pub use book::{classify_opening, Jushu, OpeningBook};
pub use config::{Difficulty, EngineParams, SearchLimits, ThreatLimits};
pub use engine::{evaluate_move, Engine, EvaluateRequest, EvaluateResponse, SearchType};
pub use error::{EngineError, Result};
pub use eval::{evaluate, PatternWeights};
pub use game::{
    play_game, run_pool, GameOutcome, GameRecord, GameRequest, MoveRecord, PlayerConfig,
    Termination,
};
pub use rules::{check_winner, classify, is_legal_move, ForbiddenChecker, ForbiddenKind};
pub use search::{ForcedWin, ForcedWinKind, SearchStats};
