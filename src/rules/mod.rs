//! Game rules for Renju
//!
//! This module implements the rule set:
//! - Line pattern scanning (threes, fours, fives, overlines)
//! - Forbidden moves for Black (double-three, double-four, overline)
//! - Win conditions (exact five for Black, five or more for White)

pub mod forbidden;
pub mod patterns;
pub mod win;

// Re-exports for convenient access
pub use forbidden::{
    classify, is_forbidden, is_legal_move, ForbiddenChecker, ForbiddenKind, ForbiddenMoveResult,
    ForbiddenStats, LegalityCache,
};
pub use patterns::{
    count_fours, makes_five, makes_four, makes_overline, makes_three, scan_all, scan_line,
    LineShape, Points, Shape,
};
pub use win::{
    check_winner, find_five_positions, five_points, has_five_at_pos, has_five_in_row,
    winning_line_at,
};
