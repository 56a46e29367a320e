//! Bracket engine for single- and double-elimination tournaments.
//!
//! This module provides:
//! - Bracket construction from a seeded player list, with byes for fields
//!   that are not a power of two
//! - Loser-bracket construction and a grand final for double elimination
//! - Result advancement of winners and losers into downstream slots
//! - Score submission, draw replays and dispute settlement
//!
//! Everything here is a synchronous transformation of an in-memory
//! [`Bracket`]; persisting the changed matches is the caller's job.
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use ef_bracket::bracket::{self, BracketFormat, PlayerId};
//! use ef_bracket::config::EngineConfig;
//!
//! let players: Vec<PlayerId> = ["A", "B", "C", "D"].into_iter().map(PlayerId::from).collect();
//! let mut bracket = bracket::generate(BracketFormat::SingleElimination, &players).unwrap();
//! let config = EngineConfig::default();
//! bracket.start(Utc::now(), &config);
//!
//! bracket.complete_match(1, &PlayerId::from("A")).unwrap();
//! let advancement = bracket.advance(1, Utc::now(), &config).unwrap();
//! assert_eq!(advancement.winner_placed.unwrap().match_number, 3);
//! ```

pub mod engine;
pub mod errors;
pub mod generator;
pub mod models;

pub use engine::{Advancement, Bracket, Placement, SubmissionOutcome};
pub use errors::{BracketError, BracketResult};
pub use generator::{
    RoundPlan, double_elimination, generate, heuristic_loser_round_sizes, perfect_bracket_size,
    single_elimination, total_rounds, winner_round_plan,
};
pub use models::{BracketFormat, BracketType, Match, MatchStatus, PlayerId, RoundRef, Slot};
