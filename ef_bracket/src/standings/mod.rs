//! Final standings and prize/points distribution.
//!
//! Standings are read off a finished bracket by walking back from the
//! deciding match. Prize money is split by basis points of the pool in
//! integer minor units; whatever is not paid out stays as platform fee.

pub mod prizes;

pub use prizes::{Award, PrizeDistribution, awards};

use serde::{Deserialize, Serialize};

use crate::bracket::{Bracket, BracketFormat, BracketType, MatchStatus, PlayerId};

/// Final placings of a finished tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standings {
    pub first: PlayerId,
    pub second: PlayerId,
    /// None when the field was too small to produce a third place
    pub third: Option<PlayerId>,
    /// Everybody else, latest elimination first
    pub participants: Vec<PlayerId>,
}

impl Standings {
    /// Derive standings from a bracket whose deciding match is completed.
    ///
    /// Returns None while the tournament is still running.
    pub fn from_bracket(bracket: &Bracket) -> Option<Self> {
        let deciding = bracket.deciding_match()?;
        if deciding.status != MatchStatus::Completed {
            return None;
        }

        let first = deciding.winner_id.clone()?;
        let second = deciding.loser_id()?.clone();
        let final_round = deciding.round_ref();

        let third = match bracket.format {
            // Loser of the loser-bracket final
            BracketFormat::DoubleElimination => bracket
                .matches
                .iter()
                .filter(|m| m.bracket_type == BracketType::Loser)
                .find(|m| m.winner_to == Some(final_round))
                .and_then(|m| m.loser_id())
                .cloned(),
            // Semi-final loser on the champion's side, or on the runner-up's
            // side when the champion skipped the semi-final round with a bye
            BracketFormat::SingleElimination => {
                let semi_finals: Vec<_> = bracket
                    .matches
                    .iter()
                    .filter(|m| m.winner_to == Some(final_round))
                    .filter(|m| m.round + 1 == final_round.round)
                    .filter(|m| m.status == MatchStatus::Completed)
                    .collect();
                [&first, &second]
                    .into_iter()
                    .find_map(|finalist| {
                        semi_finals
                            .iter()
                            .find(|m| m.winner_id.as_ref() == Some(finalist))
                    })
                    .and_then(|m| m.loser_id())
                    .cloned()
            }
        };

        let mut participants: Vec<PlayerId> = Vec::new();
        for m in bracket.matches.iter().rev() {
            if m.status != MatchStatus::Completed {
                continue;
            }
            let Some(loser) = m.loser_id() else { continue };
            let placed = *loser == first
                || *loser == second
                || third.as_ref() == Some(loser)
                || participants.contains(loser);
            if !placed {
                participants.push(loser.clone());
            }
        }

        Some(Self {
            first,
            second,
            third,
            participants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{double_elimination, single_elimination};
    use crate::config::EngineConfig;
    use chrono::Utc;

    fn play(bracket: &mut Bracket, match_number: u32, winner: &str) {
        let config = EngineConfig::default();
        bracket
            .complete_match(match_number, &PlayerId::from(winner))
            .unwrap();
        bracket.advance(match_number, Utc::now(), &config).unwrap();
    }

    fn seeded(names: &[&str]) -> Vec<PlayerId> {
        names.iter().map(|n| PlayerId::from(*n)).collect()
    }

    #[test]
    fn test_unfinished_bracket_has_no_standings() {
        let mut bracket = single_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(Utc::now(), &EngineConfig::default());
        play(&mut bracket, 1, "A");
        assert!(Standings::from_bracket(&bracket).is_none());
    }

    #[test]
    fn test_single_elimination_standings() {
        let mut bracket = single_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(Utc::now(), &EngineConfig::default());
        play(&mut bracket, 1, "A");
        play(&mut bracket, 2, "C");
        play(&mut bracket, 3, "A");

        let standings = Standings::from_bracket(&bracket).unwrap();
        assert_eq!(standings.first, PlayerId::from("A"));
        assert_eq!(standings.second, PlayerId::from("C"));
        assert_eq!(standings.third, Some(PlayerId::from("B")));
        assert_eq!(standings.participants, vec![PlayerId::from("D")]);
    }

    #[test]
    fn test_bye_champion_takes_third_from_runner_up() {
        // A has the bye, B beats C, A beats B in the final.
        let mut bracket = single_elimination(&seeded(&["A", "B", "C"])).unwrap();
        bracket.start(Utc::now(), &EngineConfig::default());
        play(&mut bracket, 1, "B");
        play(&mut bracket, 2, "A");

        let standings = Standings::from_bracket(&bracket).unwrap();
        assert_eq!(standings.first, PlayerId::from("A"));
        assert_eq!(standings.second, PlayerId::from("B"));
        assert_eq!(standings.third, Some(PlayerId::from("C")));
        assert!(standings.participants.is_empty());
    }

    #[test]
    fn test_third_skips_round_one_loser_of_bye_champion() {
        // p0 has the round-1 bye; p3 wins match 2 and skips round 2.
        let mut bracket = single_elimination(&seeded(&["p0", "p1", "p2", "p3", "p4"])).unwrap();
        bracket.start(Utc::now(), &EngineConfig::default());
        play(&mut bracket, 1, "p1");
        play(&mut bracket, 2, "p3");
        play(&mut bracket, 3, "p0");
        play(&mut bracket, 4, "p3");

        let standings = Standings::from_bracket(&bracket).unwrap();
        assert_eq!(standings.first, PlayerId::from("p3"));
        assert_eq!(standings.second, PlayerId::from("p0"));
        assert_eq!(standings.third, Some(PlayerId::from("p1")));
        assert_eq!(standings.participants, seeded(&["p4", "p2"]));
    }

    #[test]
    fn test_double_elimination_third_is_loser_final_loser() {
        let mut bracket = double_elimination(&seeded(&["A", "B", "C", "D"])).unwrap();
        bracket.start(Utc::now(), &EngineConfig::default());
        // Winner bracket: 1 (A-B), 2 (C-D), 3 final
        play(&mut bracket, 1, "A");
        play(&mut bracket, 2, "C");
        play(&mut bracket, 3, "A");
        // Loser bracket: 4 (B-D), 5 (C vs winner of 4)
        play(&mut bracket, 4, "B");
        play(&mut bracket, 5, "B");
        // Grand final
        play(&mut bracket, 6, "A");

        let standings = Standings::from_bracket(&bracket).unwrap();
        assert_eq!(standings.first, PlayerId::from("A"));
        assert_eq!(standings.second, PlayerId::from("B"));
        assert_eq!(standings.third, Some(PlayerId::from("C")));
        assert_eq!(standings.participants, vec![PlayerId::from("D")]);
    }

    #[test]
    fn test_two_player_field_has_no_third() {
        let mut bracket = single_elimination(&seeded(&["A", "B"])).unwrap();
        bracket.start(Utc::now(), &EngineConfig::default());
        play(&mut bracket, 1, "B");

        let standings = Standings::from_bracket(&bracket).unwrap();
        assert_eq!(standings.first, PlayerId::from("B"));
        assert_eq!(standings.third, None);
    }
}
