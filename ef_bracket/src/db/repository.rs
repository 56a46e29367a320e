//! Repository trait for tournament persistence, with the PostgreSQL implementation.
//!
//! Match writes are compare-and-set on the `version` column: a batch of
//! updates is applied in one transaction and only if every row still has
//! the version the caller read. Registration statuses and the finished
//! state that the updates imply go into the same transaction.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::bracket::{Advancement, BracketType, Match, PlayerId, RoundRef};
use crate::scoring::ScoreReport;
use crate::tournament::{
    Registration, RegistrationStatus, TournamentError, TournamentId, TournamentRecord,
    TournamentResult, TournamentState,
};

/// A match to write back, conditioned on the version it was read at
#[derive(Debug, Clone)]
pub struct MatchUpdate {
    pub expected_version: u32,
    pub record: Match,
}

/// One engine operation's writes, applied all together or not at all
#[derive(Debug, Clone, Default)]
pub struct MatchCommit {
    pub updates: Vec<MatchUpdate>,
    pub statuses: Vec<(PlayerId, RegistrationStatus)>,
    /// The operation decided the tournament
    pub finished: bool,
}

impl MatchCommit {
    /// Add the registration changes of a completed match
    pub fn record(&mut self, advancement: &Advancement) {
        if let Some(eliminated) = &advancement.eliminated {
            self.statuses
                .push((eliminated.clone(), RegistrationStatus::Eliminated));
        }
        if let Some(dropped) = &advancement.loser_placed {
            self.statuses
                .push((dropped.player.clone(), RegistrationStatus::LoserBracket));
        }
        if let Some(champion) = &advancement.champion {
            self.statuses
                .push((champion.clone(), RegistrationStatus::Champion));
            self.finished = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.statuses.is_empty() && !self.finished
    }
}

/// Trait for tournament/match repository operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Store a new tournament with its generated matches and registrations
    async fn create_tournament(
        &self,
        record: &TournamentRecord,
        matches: &[Match],
        registrations: &[Registration],
    ) -> TournamentResult<()>;

    /// Find tournament header by ID
    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<TournamentRecord>>;

    /// All matches of a tournament, ordered by match number
    async fn load_matches(&self, id: TournamentId) -> TournamentResult<Vec<Match>>;

    /// Apply a commit atomically while the tournament is active.
    ///
    /// Returns false (and writes nothing) if any match changed since it
    /// was read, and `InvalidState` if the tournament left `Active`.
    async fn save_matches(&self, id: TournamentId, commit: &MatchCommit) -> TournamentResult<bool>;

    /// Move the tournament from `from` to `to`, failing with `InvalidState`
    /// if it is no longer in `from`
    async fn transition_state(
        &self,
        id: TournamentId,
        from: TournamentState,
        to: TournamentState,
    ) -> TournamentResult<()>;

    /// Registrations in seed order
    async fn registrations(&self, id: TournamentId) -> TournamentResult<Vec<Registration>>;
}

/// Default PostgreSQL implementation of `MatchRepository`
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MATCH_COLUMNS: &str = "match_number, round, bracket_type, player1_id, player2_id, status, \
     winner_id, player1_score, player2_score, player1_report, player2_report, deadline, \
     winner_to_bracket, winner_to_round, loser_to_bracket, loser_to_round, version";

fn corrupt(what: impl std::fmt::Display) -> TournamentError {
    TournamentError::CorruptRecord(what.to_string())
}

fn round_ref_parts(target: Option<RoundRef>) -> (Option<String>, Option<i32>) {
    match target {
        Some(target) => (Some(target.bracket.to_string()), Some(target.round as i32)),
        None => (None, None),
    }
}

fn round_ref_from(bracket: Option<String>, round: Option<i32>) -> TournamentResult<Option<RoundRef>> {
    match (bracket, round) {
        (Some(bracket), Some(round)) => Ok(Some(RoundRef {
            bracket: bracket.parse::<BracketType>().map_err(corrupt)?,
            round: round as u32,
        })),
        (None, None) => Ok(None),
        _ => Err(corrupt("half-set round reference")),
    }
}

fn report_to_json(report: &Option<ScoreReport>) -> TournamentResult<Option<serde_json::Value>> {
    report
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(TournamentError::from)
}

fn report_from_json(value: Option<serde_json::Value>) -> TournamentResult<Option<ScoreReport>> {
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(TournamentError::from)
}

fn match_from_row(row: &PgRow) -> TournamentResult<Match> {
    let bracket_type: String = row.get("bracket_type");
    let status: String = row.get("status");

    Ok(Match {
        match_number: row.get::<i32, _>("match_number") as u32,
        round: row.get::<i32, _>("round") as u32,
        bracket_type: bracket_type.parse().map_err(corrupt)?,
        player1_id: row.get::<Option<String>, _>("player1_id").map(PlayerId),
        player2_id: row.get::<Option<String>, _>("player2_id").map(PlayerId),
        status: status.parse().map_err(corrupt)?,
        winner_id: row.get::<Option<String>, _>("winner_id").map(PlayerId),
        player1_score: row.get::<Option<i32>, _>("player1_score").map(|s| s as u32),
        player2_score: row.get::<Option<i32>, _>("player2_score").map(|s| s as u32),
        player1_report: report_from_json(row.get("player1_report"))?,
        player2_report: report_from_json(row.get("player2_report"))?,
        deadline: row.get("deadline"),
        winner_to: round_ref_from(row.get("winner_to_bracket"), row.get("winner_to_round"))?,
        loser_to: round_ref_from(row.get("loser_to_bracket"), row.get("loser_to_round"))?,
        version: row.get::<i32, _>("version") as u32,
    })
}

fn tournament_from_row(row: &PgRow) -> TournamentResult<TournamentRecord> {
    let format: String = row.get("format");
    let state: String = row.get("state");

    Ok(TournamentRecord {
        id: row.get("id"),
        name: row.get("name"),
        format: format.parse().map_err(corrupt)?,
        player_count: row.get::<i32, _>("player_count") as usize,
        prize_pool: row.get("prize_pool"),
        state: state.parse().map_err(corrupt)?,
        created_at: row.get("created_at"),
        finished_at: row.get("finished_at"),
    })
}

#[async_trait]
impl MatchRepository for PgMatchRepository {
    async fn create_tournament(
        &self,
        record: &TournamentRecord,
        matches: &[Match],
        registrations: &[Registration],
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tournaments (id, name, format, player_count, prize_pool, state, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(record.format.to_string())
        .bind(record.player_count as i32)
        .bind(record.prize_pool)
        .bind(record.state.to_string())
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        for registration in registrations {
            sqlx::query(
                r#"
                INSERT INTO tournament_registrations (tournament_id, player_id, seed, status)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(record.id)
            .bind(registration.player_id.as_str())
            .bind(registration.seed as i32)
            .bind(registration.status.to_string())
            .execute(&mut *tx)
            .await?;
        }

        for m in matches {
            let (winner_to_bracket, winner_to_round) = round_ref_parts(m.winner_to);
            let (loser_to_bracket, loser_to_round) = round_ref_parts(m.loser_to);

            sqlx::query(&format!(
                "INSERT INTO matches (tournament_id, {MATCH_COLUMNS}) VALUES \
                 ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)"
            ))
            .bind(record.id)
            .bind(m.match_number as i32)
            .bind(m.round as i32)
            .bind(m.bracket_type.to_string())
            .bind(m.player1_id.as_ref().map(PlayerId::as_str))
            .bind(m.player2_id.as_ref().map(PlayerId::as_str))
            .bind(m.status.to_string())
            .bind(m.winner_id.as_ref().map(PlayerId::as_str))
            .bind(m.player1_score.map(|s| s as i32))
            .bind(m.player2_score.map(|s| s as i32))
            .bind(report_to_json(&m.player1_report)?)
            .bind(report_to_json(&m.player2_report)?)
            .bind(m.deadline)
            .bind(winner_to_bracket)
            .bind(winner_to_round)
            .bind(loser_to_bracket)
            .bind(loser_to_round)
            .bind(m.version as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<TournamentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, format, player_count, prize_pool, state, created_at, finished_at
            FROM tournaments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn load_matches(&self, id: TournamentId) -> TournamentResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE tournament_id = $1 ORDER BY match_number"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn save_matches(&self, id: TournamentId, commit: &MatchCommit) -> TournamentResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Lock the header so a cancel cannot slip in before the commit
        let state: Option<String> =
            sqlx::query_scalar("SELECT state FROM tournaments WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let state: TournamentState = state
            .ok_or(TournamentError::NotFound(id))?
            .parse()
            .map_err(corrupt)?;
        if state != TournamentState::Active {
            tx.rollback().await?;
            return Err(TournamentError::InvalidState {
                expected: TournamentState::Active,
                actual: state,
            });
        }

        for update in &commit.updates {
            let m = &update.record;
            let result = sqlx::query(
                r#"
                UPDATE matches
                SET player1_id = $1, player2_id = $2, status = $3, winner_id = $4,
                    player1_score = $5, player2_score = $6, player1_report = $7,
                    player2_report = $8, deadline = $9, version = $10
                WHERE tournament_id = $11 AND match_number = $12 AND version = $13
                "#,
            )
            .bind(m.player1_id.as_ref().map(PlayerId::as_str))
            .bind(m.player2_id.as_ref().map(PlayerId::as_str))
            .bind(m.status.to_string())
            .bind(m.winner_id.as_ref().map(PlayerId::as_str))
            .bind(m.player1_score.map(|s| s as i32))
            .bind(m.player2_score.map(|s| s as i32))
            .bind(report_to_json(&m.player1_report)?)
            .bind(report_to_json(&m.player2_report)?)
            .bind(m.deadline)
            .bind(m.version as i32)
            .bind(id)
            .bind(m.match_number as i32)
            .bind(update.expected_version as i32)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(false);
            }
        }

        for (player, status) in &commit.statuses {
            sqlx::query(
                "UPDATE tournament_registrations SET status = $1 WHERE tournament_id = $2 AND player_id = $3",
            )
            .bind(status.to_string())
            .bind(id)
            .bind(player.as_str())
            .execute(&mut *tx)
            .await?;
        }

        if commit.finished {
            sqlx::query("UPDATE tournaments SET state = $1, finished_at = NOW() WHERE id = $2")
                .bind(TournamentState::Finished.to_string())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn transition_state(
        &self,
        id: TournamentId,
        from: TournamentState,
        to: TournamentState,
    ) -> TournamentResult<()> {
        let finished = matches!(to, TournamentState::Finished | TournamentState::Cancelled);
        let result = sqlx::query(
            r#"
            UPDATE tournaments
            SET state = $1, finished_at = CASE WHEN $2 THEN NOW() ELSE finished_at END
            WHERE id = $3 AND state = $4
            "#,
        )
        .bind(to.to_string())
        .bind(finished)
        .bind(id)
        .bind(from.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.find_tournament(id).await? {
                Some(record) => Err(TournamentError::InvalidState {
                    expected: from,
                    actual: record.state,
                }),
                None => Err(TournamentError::NotFound(id)),
            };
        }
        Ok(())
    }

    async fn registrations(&self, id: TournamentId) -> TournamentResult<Vec<Registration>> {
        let rows = sqlx::query(
            r#"
            SELECT player_id, seed, status
            FROM tournament_registrations
            WHERE tournament_id = $1
            ORDER BY seed
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status: String = row.get("status");
                Ok(Registration {
                    player_id: PlayerId(row.get("player_id")),
                    seed: row.get::<i32, _>("seed") as usize,
                    status: status.parse().map_err(corrupt)?,
                })
            })
            .collect()
    }
}
