//! # eFootball Bracket
//!
//! Bracket engine for eFootball tournaments: single- and double-elimination
//! bracket construction, result advancement, self-reported score
//! reconciliation, and final standings with prize and point awards.
//!
//! ## Core Modules
//!
//! - [`bracket`]: Bracket generation, match models and the advancement engine
//! - [`scoring`]: Reconciling the two players' score reports
//! - [`standings`]: Final placings, prize pool split and ranking points
//! - [`config`]: Engine configuration loaded from the environment
//! - [`db`]: Repository seam with PostgreSQL and in-memory implementations
//! - [`tournament`]: Tournament lifecycle with optimistic concurrency
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use ef_bracket::{BracketFormat, EngineConfig, PlayerId, ScoreReport, SubmissionOutcome};
//!
//! let players: Vec<PlayerId> = ["A", "B", "C"].into_iter().map(PlayerId::from).collect();
//! let mut bracket = ef_bracket::generate(BracketFormat::SingleElimination, &players).unwrap();
//! let config = EngineConfig::default();
//! let now = Utc::now();
//! bracket.start(now, &config);
//!
//! // Match 1 is B vs C, A holds the bye in round 2
//! bracket.submit_report(1, &"B".into(), ScoreReport::new(2, 0), now, &config).unwrap();
//! let outcome = bracket.submit_report(1, &"C".into(), ScoreReport::new(0, 2), now, &config).unwrap();
//! assert!(matches!(outcome, SubmissionOutcome::Completed(_)));
//! ```

/// Bracket generation and advancement.
pub mod bracket;
pub use bracket::{
    Advancement, Bracket, BracketError, BracketFormat, BracketResult, BracketType, Match,
    MatchStatus, PlayerId, RoundRef, Slot, SubmissionOutcome, generate,
};

/// Engine configuration.
pub mod config;
pub use config::{ConfigError, EngineConfig, PointAwards, PrizeSplit};

/// Persistence.
pub mod db;

/// Score reports and reconciliation.
pub mod scoring;
pub use scoring::{ScoreReport, Verdict};

/// Standings, prizes and points.
pub mod standings;
pub use standings::{Award, PrizeDistribution, Standings};

/// Tournament lifecycle.
pub mod tournament;
pub use tournament::{TournamentError, TournamentManager, TournamentResult};
