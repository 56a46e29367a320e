//! Tournament data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bracket::{BracketFormat, PlayerId};

/// Tournament ID type
pub type TournamentId = uuid::Uuid;

/// Tournament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentState {
    /// Bracket generated, matches being played
    Active,
    /// Champion decided
    Finished,
    /// Called off before a champion was decided
    Cancelled,
}

impl fmt::Display for TournamentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentState::Active => write!(f, "active"),
            TournamentState::Finished => write!(f, "finished"),
            TournamentState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for TournamentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TournamentState::Active),
            "finished" => Ok(TournamentState::Finished),
            "cancelled" => Ok(TournamentState::Cancelled),
            other => Err(format!("unknown tournament state: {other}")),
        }
    }
}

/// Where a registered player stands in the bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Still unbeaten
    Active,
    /// Lost once in a double-elimination bracket
    LoserBracket,
    Eliminated,
    Champion,
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationStatus::Active => write!(f, "active"),
            RegistrationStatus::LoserBracket => write!(f, "loser_bracket"),
            RegistrationStatus::Eliminated => write!(f, "eliminated"),
            RegistrationStatus::Champion => write!(f, "champion"),
        }
    }
}

impl std::str::FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RegistrationStatus::Active),
            "loser_bracket" => Ok(RegistrationStatus::LoserBracket),
            "eliminated" => Ok(RegistrationStatus::Eliminated),
            "champion" => Ok(RegistrationStatus::Champion),
            other => Err(format!("unknown registration status: {other}")),
        }
    }
}

/// Tournament registration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub player_id: PlayerId,
    /// Position in the seeding list (0 = top seed)
    pub seed: usize,
    pub status: RegistrationStatus,
}

/// Stored tournament header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub id: TournamentId,
    pub name: String,
    pub format: BracketFormat,
    pub player_count: usize,
    /// Prize pool in minor currency units
    pub prize_pool: i64,
    pub state: TournamentState,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}
