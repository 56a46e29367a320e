//! Bracket data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring::ScoreReport;

/// Opaque player identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Create a player id from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random player id
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Elimination format of a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketFormat {
    SingleElimination,
    DoubleElimination,
}

impl fmt::Display for BracketFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketFormat::SingleElimination => write!(f, "single_elimination"),
            BracketFormat::DoubleElimination => write!(f, "double_elimination"),
        }
    }
}

impl std::str::FromStr for BracketFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "single_elimination" => Ok(BracketFormat::SingleElimination),
            "double" | "double_elimination" => Ok(BracketFormat::DoubleElimination),
            other => Err(format!("unknown bracket format: {other}")),
        }
    }
}

/// Which tree of a bracket a match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketType {
    Winner,
    Loser,
}

impl fmt::Display for BracketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketType::Winner => write!(f, "winner"),
            BracketType::Loser => write!(f, "loser"),
        }
    }
}

impl std::str::FromStr for BracketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "winner" => Ok(BracketType::Winner),
            "loser" => Ok(BracketType::Loser),
            other => Err(format!("unknown bracket type: {other}")),
        }
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Waiting for one or both players
    Pending,
    /// Both players known, results being played/submitted
    Ongoing,
    /// Winner decided
    Completed,
    /// Conflicting reports, waiting for an admin decision
    Disputed,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Ongoing => write!(f, "ongoing"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Disputed => write!(f, "disputed"),
        }
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "ongoing" => Ok(MatchStatus::Ongoing),
            "completed" => Ok(MatchStatus::Completed),
            "disputed" => Ok(MatchStatus::Disputed),
            other => Err(format!("unknown match status: {other}")),
        }
    }
}

/// A round inside one tree of the bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundRef {
    pub bracket: BracketType,
    pub round: u32,
}

impl RoundRef {
    pub fn winner(round: u32) -> Self {
        Self {
            bracket: BracketType::Winner,
            round,
        }
    }

    pub fn loser(round: u32) -> Self {
        Self {
            bracket: BracketType::Loser,
            round,
        }
    }
}

impl fmt::Display for RoundRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} round {}", self.bracket, self.round)
    }
}

/// Player position within a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    Player1,
    Player2,
}

/// A single head-to-head encounter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Ordering key, unique within a tournament
    pub match_number: u32,
    /// 1-based round within its bracket tree
    pub round: u32,
    pub bracket_type: BracketType,
    pub player1_id: Option<PlayerId>,
    pub player2_id: Option<PlayerId>,
    pub status: MatchStatus,
    /// Set only once the match is completed
    pub winner_id: Option<PlayerId>,
    /// Final recorded score for player 1
    pub player1_score: Option<u32>,
    /// Final recorded score for player 2
    pub player2_score: Option<u32>,
    pub player1_report: Option<ScoreReport>,
    pub player2_report: Option<ScoreReport>,
    /// Result submission deadline, set when the match goes ongoing
    pub deadline: Option<DateTime<Utc>>,
    /// Round the winner enters next (None for the deciding match)
    pub winner_to: Option<RoundRef>,
    /// Round the loser drops into (None when a loss eliminates)
    pub loser_to: Option<RoundRef>,
    /// Bumped on every mutation, used for compare-and-set persistence
    pub version: u32,
}

impl Match {
    /// Create an empty placeholder match
    pub fn placeholder(match_number: u32, round: u32, bracket_type: BracketType) -> Self {
        Self {
            match_number,
            round,
            bracket_type,
            player1_id: None,
            player2_id: None,
            status: MatchStatus::Pending,
            winner_id: None,
            player1_score: None,
            player2_score: None,
            player1_report: None,
            player2_report: None,
            deadline: None,
            winner_to: None,
            loser_to: None,
            version: 0,
        }
    }

    pub fn round_ref(&self) -> RoundRef {
        RoundRef {
            bracket: self.bracket_type,
            round: self.round,
        }
    }

    /// First empty slot, player 1 preferred
    pub fn open_slot(&self) -> Option<Slot> {
        if self.player1_id.is_none() {
            Some(Slot::Player1)
        } else if self.player2_id.is_none() {
            Some(Slot::Player2)
        } else {
            None
        }
    }

    pub fn is_full(&self) -> bool {
        self.player1_id.is_some() && self.player2_id.is_some()
    }

    pub fn has_player(&self, player: &PlayerId) -> bool {
        self.player1_id.as_ref() == Some(player) || self.player2_id.as_ref() == Some(player)
    }

    /// Slot held by the given player
    pub fn slot_of(&self, player: &PlayerId) -> Option<Slot> {
        if self.player1_id.as_ref() == Some(player) {
            Some(Slot::Player1)
        } else if self.player2_id.as_ref() == Some(player) {
            Some(Slot::Player2)
        } else {
            None
        }
    }

    pub fn player(&self, slot: Slot) -> Option<&PlayerId> {
        match slot {
            Slot::Player1 => self.player1_id.as_ref(),
            Slot::Player2 => self.player2_id.as_ref(),
        }
    }

    /// The participant who did not win (only meaningful once completed)
    pub fn loser_id(&self) -> Option<&PlayerId> {
        let winner = self.winner_id.as_ref()?;
        match self.slot_of(winner)? {
            Slot::Player1 => self.player2_id.as_ref(),
            Slot::Player2 => self.player1_id.as_ref(),
        }
    }

    /// Fill a slot. Never overwrites an occupied slot.
    pub(crate) fn fill(&mut self, slot: Slot, player: PlayerId) -> bool {
        let target = match slot {
            Slot::Player1 => &mut self.player1_id,
            Slot::Player2 => &mut self.player2_id,
        };
        if target.is_some() {
            return false;
        }
        *target = Some(player);
        self.touch();
        true
    }

    pub(crate) fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}
