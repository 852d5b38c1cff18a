//! Engine configuration: difficulty presets and per-call parameters.
//!
//! Everything here is plain data. Overrides are expressed by building a new
//! value (`EngineParams { weights, ..Default::default() }`), never by
//! mutating shared state.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::eval::PatternWeights;

/// Difficulty preset. Higher levels search deeper and randomize less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Beginner,
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Alpha-beta budget for this level.
    pub fn search_limits(self) -> SearchLimits {
        let (search_depth, time_limit_ms, node_limit, randomization) = match self {
            Difficulty::Beginner => (2, 200, 20_000, 0.6),
            Difficulty::Easy => (3, 500, 80_000, 0.3),
            Difficulty::Normal => (4, 1_500, 300_000, 0.1),
            Difficulty::Hard => (6, 3_000, 1_500_000, 0.03),
            Difficulty::Expert => (8, 5_000, 5_000_000, 0.0),
        };
        SearchLimits {
            search_depth,
            time_limit_ms,
            node_limit,
            randomization,
        }
    }

    /// Forced-win search budget for this level.
    pub fn threat_limits(self) -> ThreatLimits {
        let base = ThreatLimits::default();
        match self {
            Difficulty::Beginner => ThreatLimits {
                vcf_depth: 6,
                node_limit: 5_000,
                time_limit_ms: 50,
                enable_vct: false,
                enable_mise: false,
                ..base
            },
            Difficulty::Easy => ThreatLimits {
                vcf_depth: 10,
                node_limit: 20_000,
                time_limit_ms: 150,
                enable_vct: false,
                enable_mise: false,
                ..base
            },
            Difficulty::Normal => base,
            Difficulty::Hard => ThreatLimits {
                vcf_depth: 20,
                vct_depth: 6,
                node_limit: 400_000,
                time_limit_ms: 800,
                ..base
            },
            Difficulty::Expert => ThreatLimits {
                vcf_depth: 24,
                vct_depth: 8,
                node_limit: 1_000_000,
                time_limit_ms: 1_500,
                mise_candidates: 12,
                ..base
            },
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        };
        f.write_str(name)
    }
}

/// Iterative-deepening budget. Zero time or node limit means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub search_depth: u8,
    pub time_limit_ms: u64,
    pub node_limit: u64,
    /// 0.0 always plays the best move; 1.0 samples widely among near-best
    pub randomization: f64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Difficulty::Normal.search_limits()
    }
}

/// Budgets for VCF/VCT/Mise-VCF. Zero time or node limit means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatLimits {
    /// Attacking fours per VCF line
    pub vcf_depth: u8,
    /// Attacking threes per VCT line
    pub vct_depth: u8,
    pub time_limit_ms: u64,
    pub node_limit: u64,
    /// VCT and Mise-VCF stay off until the board holds this many stones
    pub vct_min_stones: u32,
    /// Quiet moves tried by Mise-VCF
    pub mise_candidates: usize,
    pub enable_vct: bool,
    pub enable_mise: bool,
}

impl Default for ThreatLimits {
    fn default() -> Self {
        Self {
            vcf_depth: 16,
            vct_depth: 4,
            time_limit_ms: 400,
            node_limit: 150_000,
            vct_min_stones: 8,
            mise_candidates: 8,
            enable_vct: true,
            enable_mise: true,
        }
    }
}

/// Per-call engine parameters: evaluation weights plus optional budget
/// overrides on top of the difficulty preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub weights: PatternWeights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchLimits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threats: Option<ThreatLimits>,
    /// Use the opening book for the first three stones
    pub use_book: bool,
    pub tt_size_mb: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            weights: PatternWeights::default(),
            search: None,
            threats: None,
            use_book: true,
            tt_size_mb: 16,
        }
    }
}

impl EngineParams {
    /// Effective alpha-beta budget for `difficulty`.
    pub fn search_limits(&self, difficulty: Difficulty) -> SearchLimits {
        self.search.unwrap_or_else(|| difficulty.search_limits())
    }

    /// Effective forced-win budget for `difficulty`.
    pub fn threat_limits(&self, difficulty: Difficulty) -> ThreatLimits {
        self.threats.unwrap_or_else(|| difficulty.threat_limits())
    }

    /// Derived parameters with other weights.
    pub fn with_weights(&self, weights: PatternWeights) -> Self {
        Self {
            weights,
            ..self.clone()
        }
    }
}
