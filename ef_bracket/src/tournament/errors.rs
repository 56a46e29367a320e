//! Tournament error types.

use thiserror::Error;

use super::models::{TournamentId, TournamentState};
use crate::bracket::BracketError;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Tournament not in correct state: expected {expected}, got {actual}")]
    InvalidState {
        expected: TournamentState,
        actual: TournamentState,
    },

    #[error("Bracket error: {0}")]
    Bracket(#[from] BracketError),

    /// Concurrent writers kept changing the same matches
    #[error("Tournament {0} is being updated concurrently, try again")]
    Conflict(TournamentId),

    /// Stored row could not be turned back into a model
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TournamentError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) | TournamentError::CorruptRecord(_) => {
                "Internal server error".to_string()
            }
            TournamentError::Serialization(_) => "Internal server error".to_string(),
            TournamentError::Bracket(e) if e.is_internal() => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
