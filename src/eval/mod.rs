//! Position evaluation for Renju
//!
//! - [`patterns`]: tunable weights and score constants
//! - [`heuristic`]: the static evaluator

pub mod heuristic;
pub mod patterns;

pub use heuristic::{evaluate, evaluate_with, opening_bonus};
pub use patterns::{PatternWeights, FIVE_SCORE, WIN_THRESHOLD};
