//! In-memory bracket and result advancement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{BracketError, BracketResult};
use super::generator::total_rounds;
use super::models::{BracketFormat, BracketType, Match, MatchStatus, PlayerId, RoundRef, Slot};
use crate::config::EngineConfig;
use crate::scoring::{ScoreReport, Verdict, reconcile};

/// Player assigned to a downstream slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub match_number: u32,
    pub slot: Slot,
    pub player: PlayerId,
    /// The placement filled the match and started it
    pub activated: bool,
}

/// Everything a completed match set in motion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advancement {
    pub match_number: u32,
    pub winner: PlayerId,
    pub loser: PlayerId,
    /// Where the winner went (None if champion or already placed)
    pub winner_placed: Option<Placement>,
    /// Where the loser dropped (None if eliminated or already placed)
    pub loser_placed: Option<Placement>,
    /// Set when the loss knocked the player out
    pub eliminated: Option<PlayerId>,
    /// Set when this match decided the tournament
    pub champion: Option<PlayerId>,
}

/// Result of recording one score report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionOutcome {
    /// Waiting for the opponent's report
    AwaitingOpponent,
    /// Level score: reports cleared, deadline extended
    Replay { deadline: DateTime<Utc> },
    /// Reports contradict, admin decision required
    Disputed,
    /// Match completed and advanced
    Completed(Advancement),
}

/// A tournament's full match list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub format: BracketFormat,
    pub player_count: usize,
    /// Ordered by match number
    pub matches: Vec<Match>,
}

impl Bracket {
    /// Rebuild a bracket from stored matches
    pub fn from_matches(format: BracketFormat, player_count: usize, mut matches: Vec<Match>) -> Self {
        matches.sort_by_key(|m| m.match_number);
        Self {
            format,
            player_count,
            matches,
        }
    }

    /// Number of winner-bracket rounds (the grand final not included)
    pub fn winner_rounds(&self) -> u32 {
        total_rounds(self.player_count)
    }

    pub fn get(&self, match_number: u32) -> BracketResult<&Match> {
        self.matches
            .iter()
            .find(|m| m.match_number == match_number)
            .ok_or(BracketError::MatchNotFound(match_number))
    }

    fn get_mut(&mut self, match_number: u32) -> BracketResult<&mut Match> {
        self.matches
            .iter_mut()
            .find(|m| m.match_number == match_number)
            .ok_or(BracketError::MatchNotFound(match_number))
    }

    /// Matches of one round, in match-number order
    pub fn round(&self, target: RoundRef) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.round_ref() == target)
    }

    /// The match whose winner takes the tournament
    pub fn deciding_match(&self) -> Option<&Match> {
        self.matches
            .iter()
            .rev()
            .find(|m| m.bracket_type == BracketType::Winner && m.winner_to.is_none())
    }

    pub fn champion(&self) -> Option<&PlayerId> {
        self.deciding_match()
            .filter(|m| m.status == MatchStatus::Completed)
            .and_then(|m| m.winner_id.as_ref())
    }

    pub fn is_complete(&self) -> bool {
        self.champion().is_some()
    }

    /// Ongoing matches whose deadline has passed
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<u32> {
        self.matches
            .iter()
            .filter(|m| m.status == MatchStatus::Ongoing)
            .filter(|m| m.deadline.is_some_and(|deadline| deadline < now))
            .map(|m| m.match_number)
            .collect()
    }

    /// Start every pending match that already has both players.
    ///
    /// Returns the numbers of the matches that went ongoing.
    pub fn start(&mut self, now: DateTime<Utc>, config: &EngineConfig) -> Vec<u32> {
        let deadline = now + config.match_window();
        self.matches
            .iter_mut()
            .filter(|m| m.status == MatchStatus::Pending && m.is_full())
            .map(|m| {
                activate(m, deadline);
                m.match_number
            })
            .collect()
    }

    /// Mark a match completed with the given winner.
    ///
    /// Allowed from `Ongoing`, and from `Disputed` for admin decisions.
    pub fn complete_match(&mut self, match_number: u32, winner: &PlayerId) -> BracketResult<()> {
        let m = self.get_mut(match_number)?;

        if !matches!(m.status, MatchStatus::Ongoing | MatchStatus::Disputed) {
            return Err(BracketError::InvalidMatchState {
                match_number,
                expected: MatchStatus::Ongoing,
                actual: m.status,
            });
        }

        if !m.has_player(winner) {
            return Err(BracketError::NotAParticipant {
                match_number,
                player: winner.clone(),
            });
        }

        m.status = MatchStatus::Completed;
        m.winner_id = Some(winner.clone());
        m.touch();
        Ok(())
    }

    /// Push the outcome of a completed match into the downstream rounds.
    ///
    /// Running it twice for the same match is a no-op the second time.
    /// On error the bracket is left as it was.
    pub fn advance(
        &mut self,
        match_number: u32,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> BracketResult<Advancement> {
        self.transact(|bracket| bracket.advance_in_place(match_number, now, config))
    }

    /// Run `op` against a copy and keep the copy only if `op` succeeds
    fn transact<T>(&mut self, op: impl FnOnce(&mut Self) -> BracketResult<T>) -> BracketResult<T> {
        let mut scratch = self.clone();
        let result = op(&mut scratch)?;
        *self = scratch;
        Ok(result)
    }

    fn advance_in_place(
        &mut self,
        match_number: u32,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> BracketResult<Advancement> {
        let m = self.get(match_number)?;

        if m.status != MatchStatus::Completed {
            return Err(BracketError::InvalidMatchState {
                match_number,
                expected: MatchStatus::Completed,
                actual: m.status,
            });
        }

        let winner = m
            .winner_id
            .clone()
            .ok_or(BracketError::MissingWinner(match_number))?;
        let loser = m
            .loser_id()
            .cloned()
            .ok_or(BracketError::MissingWinner(match_number))?;
        let (winner_to, loser_to) = (m.winner_to, m.loser_to);

        let mut advancement = Advancement {
            match_number,
            winner: winner.clone(),
            loser: loser.clone(),
            winner_placed: None,
            loser_placed: None,
            eliminated: None,
            champion: None,
        };

        match winner_to {
            Some(target) => {
                advancement.winner_placed = self.place(match_number, target, &winner, now, config)?;
            }
            None => {
                log::info!("Match {} decided the tournament: {} is champion", match_number, winner);
                advancement.champion = Some(winner);
            }
        }

        match loser_to {
            Some(target) => {
                advancement.loser_placed = self.place(match_number, target, &loser, now, config)?;
            }
            None => advancement.eliminated = Some(loser),
        }

        Ok(advancement)
    }

    /// Put a player into the first open slot of the target round.
    fn place(
        &mut self,
        from: u32,
        target: RoundRef,
        player: &PlayerId,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> BracketResult<Option<Placement>> {
        if self.round(target).any(|m| m.has_player(player)) {
            log::debug!("{} already placed in {}, skipping", player, target);
            return Ok(None);
        }

        let deadline = now + config.match_window();
        let open = self
            .matches
            .iter_mut()
            .filter(|m| m.round_ref() == target)
            .find_map(|m| {
                let slot = m.open_slot()?;
                Some((m, slot))
            });

        let Some((m, slot)) = open else {
            return Err(BracketError::NoOpenSlot {
                match_number: from,
                target,
            });
        };

        m.fill(slot, player.clone());
        let activated = m.status == MatchStatus::Pending && m.is_full();
        if activated {
            activate(m, deadline);
        }

        log::debug!(
            "Placed {} into match {} ({:?}) from match {}",
            player,
            m.match_number,
            slot,
            from
        );

        Ok(Some(Placement {
            match_number: m.match_number,
            slot,
            player: player.clone(),
            activated,
        }))
    }

    /// Record one participant's score report and reconcile once both are in.
    ///
    /// On error the bracket is left as it was.
    pub fn submit_report(
        &mut self,
        match_number: u32,
        player: &PlayerId,
        report: ScoreReport,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> BracketResult<SubmissionOutcome> {
        self.transact(|bracket| bracket.record_report(match_number, player, report, now, config))
    }

    fn record_report(
        &mut self,
        match_number: u32,
        player: &PlayerId,
        report: ScoreReport,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> BracketResult<SubmissionOutcome> {
        let m = self.get_mut(match_number)?;

        if m.status != MatchStatus::Ongoing {
            return Err(BracketError::InvalidMatchState {
                match_number,
                expected: MatchStatus::Ongoing,
                actual: m.status,
            });
        }

        let slot = m.slot_of(player).ok_or_else(|| BracketError::NotAParticipant {
            match_number,
            player: player.clone(),
        })?;

        let existing = match slot {
            Slot::Player1 => &mut m.player1_report,
            Slot::Player2 => &mut m.player2_report,
        };
        if existing.is_some() {
            return Err(BracketError::AlreadySubmitted {
                match_number,
                player: player.clone(),
            });
        }
        *existing = Some(report);
        m.touch();

        let (Some(player1), Some(player2)) = (&m.player1_report, &m.player2_report) else {
            return Ok(SubmissionOutcome::AwaitingOpponent);
        };

        match reconcile(player1, player2) {
            Verdict::Draw => {
                m.player1_report = None;
                m.player2_report = None;
                m.player1_score = None;
                m.player2_score = None;
                let deadline = m.deadline.unwrap_or(now) + config.draw_extension();
                m.deadline = Some(deadline);
                m.touch();
                log::debug!("Match {} drawn, replay due by {}", match_number, deadline);
                Ok(SubmissionOutcome::Replay { deadline })
            }
            Verdict::Disputed => {
                m.status = MatchStatus::Disputed;
                m.touch();
                log::warn!("Match {} disputed, waiting for admin decision", match_number);
                Ok(SubmissionOutcome::Disputed)
            }
            Verdict::Winner {
                slot,
                player1_score,
                player2_score,
            } => {
                let winner = m
                    .player(slot)
                    .cloned()
                    .ok_or(BracketError::MissingWinner(match_number))?;
                m.player1_score = Some(player1_score);
                m.player2_score = Some(player2_score);
                self.complete_match(match_number, &winner)?;
                let advancement = self.advance_in_place(match_number, now, config)?;
                Ok(SubmissionOutcome::Completed(advancement))
            }
        }
    }

    /// Settle a disputed match with an admin-chosen winner and advance it.
    pub fn resolve_dispute(
        &mut self,
        match_number: u32,
        winner: &PlayerId,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> BracketResult<Advancement> {
        let status = self.get(match_number)?.status;
        if status != MatchStatus::Disputed {
            return Err(BracketError::InvalidMatchState {
                match_number,
                expected: MatchStatus::Disputed,
                actual: status,
            });
        }

        self.transact(|bracket| {
            bracket.complete_match(match_number, winner)?;
            bracket.advance_in_place(match_number, now, config)
        })
    }
}

fn activate(m: &mut Match, deadline: DateTime<Utc>) {
    m.status = MatchStatus::Ongoing;
    m.deadline = Some(deadline);
    m.touch();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::generator::{double_elimination, single_elimination};
    use chrono::Duration;

    fn seeded(names: &[&str]) -> Vec<PlayerId> {
        names.iter().map(|n| PlayerId::from(*n)).collect()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn win(bracket: &mut Bracket, match_number: u32, winner: &str) -> Advancement {
        let config = EngineConfig::default();
        bracket
            .complete_match(match_number, &PlayerId::from(winner))
            .unwrap();
        bracket.advance(match_number, now(), &config).unwrap()
    }

    #[test]
    fn test_start_activates_full_matches_only() {
        let mut bracket = single_elimination(&seeded(&["A", "B", "C"])).unwrap();
        let started = bracket.start(now(), &EngineConfig::default());

        assert_eq!(started, vec![1]);
        assert_eq!(bracket.matches[0].status, MatchStatus::Ongoing);
        assert_eq!(bracket.matches[0].deadline, Some(now() + Duration::minutes(30)));
        // The bye holder waits alone
        assert_eq!(bracket.matches[1].status, MatchStatus::Pending);
    }

    #[test]
    fn test_winner_fills_first_open_slot() {
        let mut bracket = single_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(now(), &EngineConfig::default());

        let adv = win(&mut bracket, 1, "A");
        let placed = adv.winner_placed.unwrap();
        assert_eq!(placed.match_number, 3);
        assert_eq!(placed.slot, Slot::Player1);
        assert!(!placed.activated);
        assert_eq!(adv.eliminated, Some(PlayerId::from("B")));

        let adv = win(&mut bracket, 2, "C");
        let placed = adv.winner_placed.unwrap();
        assert_eq!(placed.slot, Slot::Player2);
        assert!(placed.activated);
        assert_eq!(bracket.matches[2].status, MatchStatus::Ongoing);
    }

    #[test]
    fn test_advance_twice_is_noop() {
        let mut bracket = single_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(now(), &EngineConfig::default());
        win(&mut bracket, 1, "A");

        let again = bracket.advance(1, now(), &EngineConfig::default()).unwrap();
        assert_eq!(again.winner_placed, None);
        assert_eq!(bracket.matches[2].player1_id, Some("A".into()));
        assert_eq!(bracket.matches[2].player2_id, None);
    }

    #[test]
    fn test_advance_requires_completed_match() {
        let mut bracket = single_elimination(&seeded(&["A", "B"])).unwrap();
        let err = bracket.advance(1, now(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BracketError::InvalidMatchState { .. }));
    }

    #[test]
    fn test_complete_rejects_outsider() {
        let mut bracket = single_elimination(&seeded(&["A", "B"])).unwrap();
        bracket.start(now(), &EngineConfig::default());
        let err = bracket.complete_match(1, &PlayerId::from("Z")).unwrap_err();
        assert!(matches!(err, BracketError::NotAParticipant { .. }));
    }

    #[test]
    fn test_final_reports_champion() {
        let mut bracket = single_elimination(&seeded(&["A", "B"])).unwrap();
        bracket.start(now(), &EngineConfig::default());

        let adv = win(&mut bracket, 1, "B");
        assert_eq!(adv.champion, Some(PlayerId::from("B")));
        assert!(bracket.is_complete());
        assert_eq!(bracket.champion(), Some(&PlayerId::from("B")));
    }

    #[test]
    fn test_no_open_slot_is_an_internal_error() {
        let mut bracket = single_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(now(), &EngineConfig::default());
        // Corrupt the final so nothing can enter it
        bracket.matches[2].player1_id = Some("X".into());
        bracket.matches[2].player2_id = Some("Y".into());

        bracket.complete_match(1, &PlayerId::from("A")).unwrap();
        let err = bracket.advance(1, now(), &EngineConfig::default()).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_failed_advance_leaves_bracket_untouched() {
        let mut bracket = double_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(now(), &EngineConfig::default());
        // Loser round 1 is already full, so B has nowhere to drop
        bracket.matches[3].player1_id = Some("X".into());
        bracket.matches[3].player2_id = Some("Y".into());

        bracket
            .submit_report(1, &"A".into(), ScoreReport::new(2, 0), now(), &EngineConfig::default())
            .unwrap();
        let before = bracket.clone();

        let err = bracket
            .submit_report(1, &"B".into(), ScoreReport::new(0, 2), now(), &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, BracketError::NoOpenSlot { match_number: 1, .. }));
        assert_eq!(bracket, before);
        assert_eq!(bracket.get(1).unwrap().status, MatchStatus::Ongoing);
        assert_eq!(bracket.get(3).unwrap().player1_id, None);
    }

    #[test]
    fn test_double_elimination_loser_drops() {
        let mut bracket = double_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(now(), &EngineConfig::default());

        let adv = win(&mut bracket, 1, "A");
        let dropped = adv.loser_placed.unwrap();
        assert_eq!(bracket.get(dropped.match_number).unwrap().bracket_type, BracketType::Loser);
        assert_eq!(adv.eliminated, None);
    }

    #[test]
    fn test_overdue_matches() {
        let mut bracket = single_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(now(), &EngineConfig::default());

        assert!(bracket.overdue(now()).is_empty());
        assert_eq!(bracket.overdue(now() + Duration::minutes(31)), vec![1, 2]);
    }

    #[test]
    fn test_draw_resets_and_extends() {
        let config = EngineConfig::default();
        let mut bracket = single_elimination(&seeded(&["A", "B"])).unwrap();
        bracket.start(now(), &config);

        let first = bracket
            .submit_report(1, &"A".into(), ScoreReport::new(2, 2), now(), &config)
            .unwrap();
        assert_eq!(first, SubmissionOutcome::AwaitingOpponent);

        let second = bracket
            .submit_report(1, &"B".into(), ScoreReport::new(2, 2), now(), &config)
            .unwrap();
        let expected = now() + Duration::minutes(40);
        assert_eq!(second, SubmissionOutcome::Replay { deadline: expected });

        let m = &bracket.matches[0];
        assert_eq!(m.status, MatchStatus::Ongoing);
        assert!(m.player1_report.is_none() && m.player2_report.is_none());
        assert!(m.player1_score.is_none() && m.player2_score.is_none());
        assert_eq!(m.winner_id, None);
    }

    #[test]
    fn test_duplicate_report_rejected() {
        let config = EngineConfig::default();
        let mut bracket = single_elimination(&seeded(&["A", "B"])).unwrap();
        bracket.start(now(), &config);

        bracket
            .submit_report(1, &"A".into(), ScoreReport::new(1, 0), now(), &config)
            .unwrap();
        let err = bracket
            .submit_report(1, &"A".into(), ScoreReport::new(5, 0), now(), &config)
            .unwrap_err();
        assert!(matches!(err, BracketError::AlreadySubmitted { .. }));
    }

    #[test]
    fn test_dispute_then_resolution() {
        let config = EngineConfig::default();
        let mut bracket = single_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(now(), &config);

        bracket
            .submit_report(1, &"A".into(), ScoreReport::new(3, 1), now(), &config)
            .unwrap();
        let outcome = bracket
            .submit_report(1, &"B".into(), ScoreReport::new(2, 1), now(), &config)
            .unwrap();
        assert_eq!(outcome, SubmissionOutcome::Disputed);
        assert_eq!(bracket.matches[0].status, MatchStatus::Disputed);
        assert_eq!(bracket.matches[0].winner_id, None);
        assert_eq!(bracket.matches[2].player1_id, None);

        let adv = bracket
            .resolve_dispute(1, &"B".into(), now(), &config)
            .unwrap();
        assert_eq!(adv.winner, PlayerId::from("B"));
        assert_eq!(bracket.matches[2].player1_id, Some("B".into()));
    }

    #[test]
    fn test_resolve_requires_dispute() {
        let config = EngineConfig::default();
        let mut bracket = single_elimination(&seeded(&["A", "B"])).unwrap();
        bracket.start(now(), &config);
        let err = bracket
            .resolve_dispute(1, &"A".into(), now(), &config)
            .unwrap_err();
        assert!(matches!(err, BracketError::InvalidMatchState { .. }));
    }
}
