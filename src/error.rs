//! Error taxonomy for the engine.
//!
//! Inside the crate these travel as `Result<_, EngineError>`; the public
//! evaluate/play entry points absorb them into documented fallbacks.

use thiserror::Error;

use crate::board::Pos;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid position notation: {0:?}")]
    InvalidPosition(String),

    #[error("cell {0} is already occupied")]
    Occupied(Pos),

    #[error("no legal move available")]
    NoLegalMove,

    #[error("side to move must be black or white")]
    InvalidSide,

    #[error("malformed board: {0}")]
    BoardFormat(String),

    #[error("worker failure: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
