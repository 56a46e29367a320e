//! Bracket engine error types.

use thiserror::Error;

use super::models::{MatchStatus, PlayerId, RoundRef};

/// Bracket engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// Fewer than two players supplied
    #[error("Need at least 2 players, got {0}")]
    NotEnoughPlayers(usize),

    /// The same player appears twice in the seeding list
    #[error("Player {0} is seeded more than once")]
    DuplicatePlayer(PlayerId),

    /// No match with this number
    #[error("Match not found: {0}")]
    MatchNotFound(u32),

    /// Operation not allowed in the match's current status
    #[error("Match {match_number} in wrong state: expected {expected}, got {actual}")]
    InvalidMatchState {
        match_number: u32,
        expected: MatchStatus,
        actual: MatchStatus,
    },

    /// Player does not take part in the match
    #[error("Player {player} is not part of match {match_number}")]
    NotAParticipant { match_number: u32, player: PlayerId },

    /// Player already reported a score for this match
    #[error("Player {player} already submitted a score for match {match_number}")]
    AlreadySubmitted { match_number: u32, player: PlayerId },

    /// Advancement found nowhere to put a player in a round that should have room
    #[error("No open slot in {target} for match {match_number}")]
    NoOpenSlot { match_number: u32, target: RoundRef },

    /// Completed match without a winner recorded
    #[error("Match {0} is completed but has no winner")]
    MissingWinner(u32),
}

impl BracketError {
    /// Whether the error points at a broken bracket rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            BracketError::NoOpenSlot { .. } | BracketError::MissingWinner(_)
        )
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
