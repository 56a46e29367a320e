//! In-memory `MatchRepository` for tests and the simulator.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::repository::{MatchCommit, MatchRepository};
use crate::bracket::Match;
use crate::tournament::{
    Registration, TournamentError, TournamentId, TournamentRecord, TournamentResult,
    TournamentState,
};

#[derive(Debug, Clone)]
struct StoredTournament {
    record: TournamentRecord,
    matches: Vec<Match>,
    registrations: Vec<Registration>,
}

/// Repository keeping everything behind one lock
#[derive(Debug, Default)]
pub struct InMemoryMatchRepository {
    tournaments: RwLock<HashMap<TournamentId, StoredTournament>>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn create_tournament(
        &self,
        record: &TournamentRecord,
        matches: &[Match],
        registrations: &[Registration],
    ) -> TournamentResult<()> {
        let mut tournaments = self.tournaments.write().await;
        tournaments.insert(
            record.id,
            StoredTournament {
                record: record.clone(),
                matches: matches.to_vec(),
                registrations: registrations.to_vec(),
            },
        );
        Ok(())
    }

    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<TournamentRecord>> {
        let tournaments = self.tournaments.read().await;
        Ok(tournaments.get(&id).map(|t| t.record.clone()))
    }

    async fn load_matches(&self, id: TournamentId) -> TournamentResult<Vec<Match>> {
        let tournaments = self.tournaments.read().await;
        let mut matches = tournaments
            .get(&id)
            .map(|t| t.matches.clone())
            .unwrap_or_default();
        matches.sort_by_key(|m| m.match_number);
        Ok(matches)
    }

    async fn save_matches(&self, id: TournamentId, commit: &MatchCommit) -> TournamentResult<bool> {
        let mut tournaments = self.tournaments.write().await;
        let stored = tournaments
            .get_mut(&id)
            .ok_or(TournamentError::NotFound(id))?;

        if stored.record.state != TournamentState::Active {
            return Err(TournamentError::InvalidState {
                expected: TournamentState::Active,
                actual: stored.record.state,
            });
        }

        // Check every version before writing anything
        let current_version = |number: u32| {
            stored
                .matches
                .iter()
                .find(|m| m.match_number == number)
                .map(|m| m.version)
        };
        let stale = commit
            .updates
            .iter()
            .any(|u| current_version(u.record.match_number) != Some(u.expected_version));
        if stale {
            return Ok(false);
        }

        for update in &commit.updates {
            if let Some(m) = stored
                .matches
                .iter_mut()
                .find(|m| m.match_number == update.record.match_number)
            {
                *m = update.record.clone();
            }
        }

        for (player, status) in &commit.statuses {
            if let Some(registration) = stored
                .registrations
                .iter_mut()
                .find(|r| &r.player_id == player)
            {
                registration.status = *status;
            }
        }

        if commit.finished {
            stored.record.state = TournamentState::Finished;
            stored.record.finished_at = Some(Utc::now());
        }
        Ok(true)
    }

    async fn transition_state(
        &self,
        id: TournamentId,
        from: TournamentState,
        to: TournamentState,
    ) -> TournamentResult<()> {
        let mut tournaments = self.tournaments.write().await;
        let stored = tournaments
            .get_mut(&id)
            .ok_or(TournamentError::NotFound(id))?;

        if stored.record.state != from {
            return Err(TournamentError::InvalidState {
                expected: from,
                actual: stored.record.state,
            });
        }

        stored.record.state = to;
        if matches!(to, TournamentState::Finished | TournamentState::Cancelled) {
            stored.record.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn registrations(&self, id: TournamentId) -> TournamentResult<Vec<Registration>> {
        let tournaments = self.tournaments.read().await;
        let mut registrations = tournaments
            .get(&id)
            .map(|t| t.registrations.clone())
            .unwrap_or_default();
        registrations.sort_by_key(|r| r.seed);
        Ok(registrations)
    }
}
