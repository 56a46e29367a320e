//! Tournament manager tying the bracket engine to a repository.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::errors::{TournamentError, TournamentResult};
use super::models::{
    Registration, RegistrationStatus, TournamentId, TournamentRecord, TournamentState,
};
use crate::bracket::{
    Advancement, Bracket, BracketFormat, BracketResult, Match, PlayerId, SubmissionOutcome,
    generate,
};
use crate::config::EngineConfig;
use crate::db::{MatchCommit, MatchRepository, MatchUpdate};
use crate::scoring::ScoreReport;
use crate::standings::{Award, Standings, awards};

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    repo: Arc<dyn MatchRepository>,
    config: EngineConfig,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(repo: Arc<dyn MatchRepository>, config: EngineConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate the bracket for the confirmed players, start the first
    /// matches and persist everything.
    ///
    /// Players are seeded in the order given.
    pub async fn start_tournament(
        &self,
        name: &str,
        format: BracketFormat,
        players: &[PlayerId],
        prize_pool: i64,
    ) -> TournamentResult<TournamentId> {
        let now = Utc::now();
        let mut bracket = generate(format, players)?;
        let started = bracket.start(now, &self.config);

        let record = TournamentRecord {
            id: uuid::Uuid::new_v4(),
            name: name.to_string(),
            format,
            player_count: players.len(),
            prize_pool,
            state: TournamentState::Active,
            created_at: now,
            finished_at: None,
        };

        let registrations: Vec<Registration> = players
            .iter()
            .enumerate()
            .map(|(seed, player_id)| Registration {
                player_id: player_id.clone(),
                seed,
                status: RegistrationStatus::Active,
            })
            .collect();

        self.repo
            .create_tournament(&record, &bracket.matches, &registrations)
            .await?;

        log::info!(
            "Started tournament {} '{}' ({}, {} players, {} matches, {} ongoing)",
            record.id,
            record.name,
            format,
            players.len(),
            bracket.matches.len(),
            started.len()
        );

        Ok(record.id)
    }

    /// Get tournament header
    pub async fn tournament(&self, id: TournamentId) -> TournamentResult<TournamentRecord> {
        self.repo
            .find_tournament(id)
            .await?
            .ok_or(TournamentError::NotFound(id))
    }

    /// Current bracket as stored
    pub async fn bracket(&self, id: TournamentId) -> TournamentResult<Bracket> {
        let record = self.tournament(id).await?;
        self.load_bracket(&record).await
    }

    pub async fn registrations(&self, id: TournamentId) -> TournamentResult<Vec<Registration>> {
        self.tournament(id).await?;
        self.repo.registrations(id).await
    }

    /// Record a player's score report for an ongoing match
    pub async fn submit_report(
        &self,
        id: TournamentId,
        match_number: u32,
        player: &PlayerId,
        report: ScoreReport,
    ) -> TournamentResult<SubmissionOutcome> {
        self.mutate(id, |bracket, now, config| {
            bracket.submit_report(match_number, player, report.clone(), now, config)
        })
        .await
    }

    /// Settle a disputed match with the admin's chosen winner
    pub async fn resolve_dispute(
        &self,
        id: TournamentId,
        match_number: u32,
        winner: &PlayerId,
    ) -> TournamentResult<Advancement> {
        let advancement = self
            .mutate(id, |bracket, now, config| {
                bracket.resolve_dispute(match_number, winner, now, config)
            })
            .await?;

        log::info!(
            "Dispute on match {} of tournament {} settled for {}",
            match_number,
            id,
            winner
        );
        Ok(advancement)
    }

    /// Set the result of an ongoing or disputed match directly, e.g. a
    /// forfeit after the deadline ran out.
    pub async fn record_result(
        &self,
        id: TournamentId,
        match_number: u32,
        winner: &PlayerId,
    ) -> TournamentResult<Advancement> {
        self.mutate(id, |bracket, now, config| {
            bracket.complete_match(match_number, winner)?;
            bracket.advance(match_number, now, config)
        })
        .await
    }

    /// Ongoing matches past their deadline
    pub async fn overdue_matches(&self, id: TournamentId) -> TournamentResult<Vec<Match>> {
        let bracket = self.bracket(id).await?;
        let now = Utc::now();
        let overdue = bracket.overdue(now);

        Ok(bracket
            .matches
            .into_iter()
            .filter(|m| overdue.contains(&m.match_number))
            .collect())
    }

    /// Final standings, once a champion is decided
    pub async fn standings(&self, id: TournamentId) -> TournamentResult<Option<Standings>> {
        let bracket = self.bracket(id).await?;
        Ok(Standings::from_bracket(&bracket))
    }

    /// Prize and point awards, once a champion is decided
    pub async fn awards(&self, id: TournamentId) -> TournamentResult<Option<Vec<Award>>> {
        let record = self.tournament(id).await?;
        let bracket = self.load_bracket(&record).await?;

        Ok(Standings::from_bracket(&bracket)
            .map(|standings| awards(&standings, record.prize_pool, &self.config)))
    }

    /// Call off an active tournament
    pub async fn cancel_tournament(&self, id: TournamentId) -> TournamentResult<()> {
        let record = self.active_tournament(id).await?;
        self.repo
            .transition_state(id, TournamentState::Active, TournamentState::Cancelled)
            .await?;
        log::info!("Cancelled tournament {} '{}'", id, record.name);
        Ok(())
    }

    async fn active_tournament(&self, id: TournamentId) -> TournamentResult<TournamentRecord> {
        let record = self.tournament(id).await?;
        if record.state != TournamentState::Active {
            return Err(TournamentError::InvalidState {
                expected: TournamentState::Active,
                actual: record.state,
            });
        }
        Ok(record)
    }

    async fn load_bracket(&self, record: &TournamentRecord) -> TournamentResult<Bracket> {
        let matches = self.repo.load_matches(record.id).await?;
        Ok(Bracket::from_matches(
            record.format,
            record.player_count,
            matches,
        ))
    }

    /// Apply an engine operation and persist the matches it changed,
    /// together with the registration and tournament state it implies.
    ///
    /// Writes are conditioned on the versions read; on conflict the
    /// bracket is reloaded and the operation applied again.
    async fn mutate<T, F>(&self, id: TournamentId, mut op: F) -> TournamentResult<T>
    where
        T: Settles,
        F: FnMut(&mut Bracket, DateTime<Utc>, &EngineConfig) -> BracketResult<T>,
    {
        let record = self.active_tournament(id).await?;

        for attempt in 0..=self.config.max_write_retries {
            let loaded = self.load_bracket(&record).await?;
            let mut bracket = loaded.clone();
            let result = op(&mut bracket, Utc::now(), &self.config)?;

            let mut commit = MatchCommit {
                updates: bracket
                    .matches
                    .iter()
                    .zip(&loaded.matches)
                    .filter(|(after, before)| after != before)
                    .map(|(after, before)| MatchUpdate {
                        expected_version: before.version,
                        record: after.clone(),
                    })
                    .collect(),
                ..MatchCommit::default()
            };
            if let Some(advancement) = result.advancement() {
                commit.record(advancement);
            }

            if commit.is_empty() || self.repo.save_matches(id, &commit).await? {
                if let Some(champion) = result.advancement().and_then(|a| a.champion.as_ref()) {
                    log::info!(
                        "Tournament {} finished after {} matches, champion {}",
                        id,
                        bracket.matches.len(),
                        champion
                    );
                }
                return Ok(result);
            }

            log::warn!(
                "Write conflict on tournament {} (attempt {}/{}), reloading",
                id,
                attempt + 1,
                self.config.max_write_retries + 1
            );
        }

        Err(TournamentError::Conflict(id))
    }
}

/// Engine results that may carry a completed match
trait Settles {
    fn advancement(&self) -> Option<&Advancement>;
}

impl Settles for Advancement {
    fn advancement(&self) -> Option<&Advancement> {
        Some(self)
    }
}

impl Settles for SubmissionOutcome {
    fn advancement(&self) -> Option<&Advancement> {
        match self {
            SubmissionOutcome::Completed(advancement) => Some(advancement),
            _ => None,
        }
    }
}
