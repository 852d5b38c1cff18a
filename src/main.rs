//! Command-line front end for the Renju engine.
//!
//! `best` evaluates one position, `selfplay` plays headless games on a
//! worker pool. Results are printed as JSON on stdout; logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use renju::{
    run_pool, Board, Difficulty, Engine, EngineParams, EvaluateRequest, GameRequest,
    PlayerConfig, Pos, Stone,
};

#[derive(Parser, Debug)]
#[command(name = "renju", version, about = "Renju rule-and-search engine")]
struct Cli {
    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// JSON file with engine parameters (weights and budget overrides)
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Best move for one position
    Best {
        /// Board file: 15 text rows (`.`, `X`, `O`) or a JSON array of rows
        #[arg(long, conflicts_with = "moves")]
        board: Option<PathBuf>,

        /// Comma-separated moves from an empty board, Black first (e.g. h8,h9)
        #[arg(long)]
        moves: Option<String>,

        /// Side to move; inferred from the stone count when omitted
        #[arg(long, value_enum)]
        side: Option<Side>,

        #[arg(long, value_enum, default_value_t = Difficulty::Normal)]
        difficulty: Difficulty,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Play engine-vs-engine games
    Selfplay {
        #[arg(long, default_value_t = 1)]
        games: usize,

        #[arg(long, default_value_t = 1)]
        workers: usize,

        /// Seed of the first game; game `i` uses `seed + i`
        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, default_value_t = 225)]
        max_moves: usize,

        #[arg(long, value_enum, default_value_t = Difficulty::Normal)]
        black: Difficulty,

        #[arg(long, value_enum, default_value_t = Difficulty::Normal)]
        white: Difficulty,

        /// Minimum time per move in milliseconds
        #[arg(long, default_value_t = 0)]
        min_think_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    Black,
    White,
}

impl From<Side> for Stone {
    fn from(side: Side) -> Self {
        match side {
            Side::Black => Stone::Black,
            Side::White => Stone::White,
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log filter {level:?}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn load_params(path: Option<&Path>) -> Result<EngineParams> {
    let Some(path) = path else {
        return Ok(EngineParams::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read parameter file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse parameter file {}", path.display()))
}

fn load_board(path: &Path) -> Result<Board> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read board file {}", path.display()))?;
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(&text)
            .with_context(|| format!("failed to parse board JSON {}", path.display()));
    }
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    Board::from_rows(&rows).with_context(|| format!("malformed board {}", path.display()))
}

fn board_from_moves(moves: &str) -> Result<Board> {
    let mut board = Board::new();
    let mut color = Stone::Black;
    for token in moves.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let pos: Pos = token
            .parse()
            .with_context(|| format!("bad move {token:?}"))?;
        board
            .play(pos, color)
            .with_context(|| format!("cannot play {token}"))?;
        color = color.opponent();
    }
    Ok(board)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    println!("{out}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;
    let params = load_params(cli.params.as_deref())?;

    match cli.command {
        Command::Best {
            board,
            moves,
            side,
            difficulty,
            seed,
        } => {
            let board = match (board, moves) {
                (Some(path), _) => load_board(&path)?,
                (None, Some(moves)) => board_from_moves(&moves)?,
                (None, None) => Board::new(),
            };
            if board.is_full() {
                bail!("board is full");
            }
            let side = side.map(Stone::from).unwrap_or_else(|| board.side_to_move());
            let mut engine = Engine::new(params, seed);
            let response = engine.evaluate_move(&EvaluateRequest::new(board, side, difficulty));
            info!(
                position = ?response.position,
                search_type = ?response.search_type,
                time_ms = response.time_ms,
                "evaluated"
            );
            print_json(&response)
        }
        Command::Selfplay {
            games,
            workers,
            seed,
            max_moves,
            black,
            white,
            min_think_ms,
        } => {
            let requests: Vec<GameRequest> = (0..games)
                .map(|i| GameRequest {
                    black: PlayerConfig {
                        difficulty: black,
                        params: params.clone(),
                    },
                    white: PlayerConfig {
                        difficulty: white,
                        params: params.clone(),
                    },
                    max_moves,
                    seed: seed.wrapping_add(i as u64),
                    min_think_ms,
                })
                .collect();
            info!(games, workers, "starting self-play");
            let outcomes = run_pool(requests, workers);
            print_json(&outcomes)
        }
    }
}
