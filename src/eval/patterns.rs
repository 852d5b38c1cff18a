//! Pattern weights for Renju evaluation
//!
//! Weights are plain configuration passed into every evaluation call. A tuner
//! overrides them by building a derived `PatternWeights`, never by mutating
//! shared state.

use serde::{Deserialize, Serialize};

use crate::book::{Jushu, JUSHU_COUNT};

/// Score of a won position. Search bounds are derived from it.
pub const FIVE_SCORE: i32 = 1_000_000;

/// Scores at least this large mean a forced result.
pub const WIN_THRESHOLD: i32 = FIVE_SCORE - 1_000;

/// Tunable evaluation weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternWeights {
    /// Straight four `_XXXX_`
    pub open_four: i32,
    /// Four with a single five point
    pub four: i32,
    /// Three that can become a straight four
    pub open_three: i32,
    /// Three that can only become a closed four
    pub closed_three: i32,
    pub open_two: i32,
    pub closed_two: i32,
    /// Bonus when a side holds two strong threats at once
    pub double_threat: i32,
    /// Per empty cell where one move would create two threats
    pub mise_point: i32,
    /// Penalty for an open three while the opponent holds four resources
    pub counter_four: i32,
    /// Penalty per Black key point that is forbidden for Black
    pub forbidden_point: i32,
    /// Per unit of centrality
    pub position: i32,
    /// Per named opening, Black's perspective
    pub opening_bonus: Vec<i32>,
}

/// Opening preferences from Black's point of view: strong openings positive,
/// balanced ones near zero, openings favouring White negative.
const DEFAULT_OPENING_BONUS: [i32; JUSHU_COUNT] = [
    -150, // Kansei
    250,  // Keigetsu
    -50,  // Sosei
    400,  // Kagetsu
    200,  // Zangetsu
    250,  // Ugetsu
    100,  // Kinsei
    150,  // Shogetsu
    100,  // Kyugetsu
    150,  // Shingetsu
    -100, // Zuisei
    0,    // Sangetsu
    -200, // Yusei
    50,   // Chosei
    150,  // Kyogetsu
    200,  // Kosei
    250,  // Suigetsu
    -200, // Ryusei
    300,  // Ungetsu
    400,  // Hogetsu
    100,  // Rangetsu
    150,  // Gingetsu
    0,    // Myojo
    100,  // Shagetsu
    50,   // Meigetsu
    -150, // Suisei
];

impl Default for PatternWeights {
    fn default() -> Self {
        Self {
            open_four: 100_000,
            four: 12_000,
            open_three: 10_000,
            closed_three: 1_500,
            open_two: 1_000,
            closed_two: 200,
            double_threat: 60_000,
            mise_point: 2_500,
            counter_four: 4_000,
            forbidden_point: 6_000,
            position: 3,
            opening_bonus: DEFAULT_OPENING_BONUS.to_vec(),
        }
    }
}

impl PatternWeights {
    /// Configured bonus for one opening; missing entries count as zero.
    pub fn opening(&self, jushu: Jushu) -> i32 {
        self.opening_bonus.get(jushu.index()).copied().unwrap_or(0)
    }

    /// Derived weights with one opening bonus replaced.
    pub fn with_opening(&self, jushu: Jushu, value: i32) -> Self {
        let mut out = self.clone();
        if out.opening_bonus.len() < JUSHU_COUNT {
            out.opening_bonus.resize(JUSHU_COUNT, 0);
        }
        out.opening_bonus[jushu.index()] = value;
        out
    }
}
