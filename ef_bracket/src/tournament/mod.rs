//! Tournament lifecycle on top of the bracket engine.
//!
//! This module provides:
//! - Starting a tournament from confirmed players (bracket generation and persistence)
//! - Score submission, dispute settlement and direct results
//! - Registration status tracking (active, loser bracket, eliminated, champion)
//! - Standings and prize awards once a champion is decided
//!
//! Concurrent writers are serialized with optimistic compare-and-set on
//! each match's `version`.
//!
//! ## Example
//!
//! ```no_run
//! use ef_bracket::bracket::{BracketFormat, PlayerId};
//! use ef_bracket::config::EngineConfig;
//! use ef_bracket::db::{Database, DatabaseConfig};
//! use ef_bracket::scoring::ScoreReport;
//! use ef_bracket::tournament::TournamentManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()?).await?;
//!     let manager = TournamentManager::new(Arc::new(db.match_repository()), EngineConfig::from_env()?);
//!
//!     let players: Vec<PlayerId> = ["ana", "ben", "cai", "dev"].into_iter().map(PlayerId::from).collect();
//!     let id = manager
//!         .start_tournament("Friday Cup", BracketFormat::SingleElimination, &players, 10_000)
//!         .await?;
//!
//!     manager.submit_report(id, 1, &players[0], ScoreReport::new(3, 1)).await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    Registration, RegistrationStatus, TournamentId, TournamentRecord, TournamentState,
};
