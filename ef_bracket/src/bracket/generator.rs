//! Bracket construction for single and double elimination.
//!
//! Byes roll from round to round: whenever a round has an odd number of
//! entrants, exactly one of them skips it. In round 1 that is the top seed,
//! who is placed into round 2 right away. In later rounds it is the winner of
//! the previous round's last match, whose `winner_to` points two rounds ahead.
//! The loser bracket is built the same way from the losers dropping out of
//! the winner bracket, so every round receives exactly as many players as it
//! has slots.

use std::collections::HashSet;

use super::engine::Bracket;
use super::errors::{BracketError, BracketResult};
use super::models::{BracketFormat, BracketType, Match, PlayerId, RoundRef};

/// Shape of one winner-bracket round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPlan {
    pub round: u32,
    /// Players entering the round (including the one receiving a bye)
    pub entrants: usize,
    pub matches: usize,
    pub has_bye: bool,
}

/// Number of winner-bracket rounds for `player_count` players: `ceil(log2(n))`
pub fn total_rounds(player_count: usize) -> u32 {
    player_count.max(1).next_power_of_two().trailing_zeros()
}

/// Smallest power of two holding every player
pub fn perfect_bracket_size(player_count: usize) -> usize {
    1usize << total_rounds(player_count)
}

/// Round-by-round shape of the winner bracket
pub fn winner_round_plan(player_count: usize) -> Vec<RoundPlan> {
    let mut plans = Vec::new();
    let mut entrants = player_count;
    let mut round = 1;
    while entrants > 1 {
        let matches = entrants / 2;
        let has_bye = entrants % 2 == 1;
        plans.push(RoundPlan {
            round,
            entrants,
            matches,
            has_bye,
        });
        entrants = matches + usize::from(has_bye);
        round += 1;
    }
    plans
}

/// Loser-bracket round sizes from the fixed approximation
/// `ceil((n / 2^ceil(round/2)) / 2)` over `2R - 1` rounds.
///
/// Not used for construction; generation simulates actual drops instead.
pub fn heuristic_loser_round_sizes(player_count: usize) -> Vec<usize> {
    let rounds = total_rounds(player_count);
    if rounds == 0 {
        return Vec::new();
    }
    (1..=2 * rounds - 1)
        .map(|round| {
            let divisor = 2f64.powi(round.div_ceil(2) as i32);
            ((player_count as f64 / divisor) / 2.0).ceil() as usize
        })
        .collect()
}

/// Loser round that receives the losers of winner round `winner_round`
fn drop_round(winner_round: u32) -> u32 {
    if winner_round <= 1 {
        1
    } else {
        2 * (winner_round - 1)
    }
}

/// Generate a bracket in the given format.
///
/// `players` is in seeding order (index 0 is the top seed).
pub fn generate(format: BracketFormat, players: &[PlayerId]) -> BracketResult<Bracket> {
    match format {
        BracketFormat::SingleElimination => single_elimination(players),
        BracketFormat::DoubleElimination => double_elimination(players),
    }
}

/// Build a single-elimination bracket
pub fn single_elimination(players: &[PlayerId]) -> BracketResult<Bracket> {
    validate_players(players)?;

    let mut builder = Builder::new(players);
    builder.winner_bracket();

    Ok(builder.finish(BracketFormat::SingleElimination))
}

/// Build a double-elimination bracket: winner bracket, loser bracket, grand final
pub fn double_elimination(players: &[PlayerId]) -> BracketResult<Bracket> {
    validate_players(players)?;

    let mut builder = Builder::new(players);
    let (champion, drops) = builder.winner_bracket();
    let loser_champion = builder.loser_bracket(drops);

    let grand_final = RoundRef::winner(total_rounds(players.len()) + 1);
    let number = builder.next_number();
    builder
        .matches
        .push(Match::placeholder(number, grand_final.round, BracketType::Winner));
    builder.route(champion, grand_final);
    if let Some(source) = loser_champion {
        builder.route(source, grand_final);
    }

    Ok(builder.finish(BracketFormat::DoubleElimination))
}

fn validate_players(players: &[PlayerId]) -> BracketResult<()> {
    if players.len() < 2 {
        return Err(BracketError::NotEnoughPlayers(players.len()));
    }

    let mut seen = HashSet::with_capacity(players.len());
    for player in players {
        if !seen.insert(player) {
            return Err(BracketError::DuplicatePlayer(player.clone()));
        }
    }

    Ok(())
}

/// Where a round entrant comes from
#[derive(Debug, Clone, Copy)]
enum Source {
    /// Seeded player, placed at generation time
    Seed(usize),
    /// Winner of the match at this index
    WinnerOf(usize),
    /// Loser of the match at this index
    LoserOf(usize),
}

struct Builder<'a> {
    players: &'a [PlayerId],
    matches: Vec<Match>,
}

impl<'a> Builder<'a> {
    fn new(players: &'a [PlayerId]) -> Self {
        Self {
            players,
            matches: Vec::new(),
        }
    }

    fn next_number(&self) -> u32 {
        self.matches.len() as u32 + 1
    }

    /// Build the winner bracket. Returns the champion's source and the
    /// losers of every winner round, keyed by loser-bracket drop round.
    fn winner_bracket(&mut self) -> (Source, Vec<(u32, Vec<Source>)>) {
        let count = self.players.len();

        // Odd fields hand the round-1 bye to the top seed: keep it last.
        let mut sources: Vec<Source> = if count % 2 == 1 {
            (1..count).chain(std::iter::once(0)).map(Source::Seed).collect()
        } else {
            (0..count).map(Source::Seed).collect()
        };

        let mut drops = Vec::new();
        let mut round = 1;
        while sources.len() > 1 {
            let first = self.matches.len();
            sources = self.play_round(RoundRef::winner(round), sources);
            let losers = (first..self.matches.len()).map(Source::LoserOf).collect();
            drops.push((drop_round(round), losers));
            round += 1;
        }

        (sources[0], drops)
    }

    /// Build the loser bracket from the scheduled drops. Returns the source
    /// of the loser-bracket champion.
    fn loser_bracket(&mut self, drops: Vec<(u32, Vec<Source>)>) -> Option<Source> {
        let last_drop = drops.iter().map(|(round, _)| *round).max().unwrap_or(0);
        let mut survivors: Vec<Source> = Vec::new();
        let mut round = 1;

        loop {
            let mut entrants: Vec<Source> = drops
                .iter()
                .filter(|(target, _)| *target == round)
                .flat_map(|(_, losers)| losers.iter().copied())
                .collect();
            entrants.append(&mut survivors);

            if round > last_drop && entrants.len() <= 1 {
                return entrants.pop();
            }

            survivors = self.play_round(RoundRef::loser(round), entrants);
            round += 1;
        }
    }

    /// Create the matches of one round and route its entrants into it.
    ///
    /// The last entrant of an odd field gets the bye. Returns the entrants
    /// of the following round: the bye recipient first, then the winners.
    fn play_round(&mut self, target: RoundRef, mut entrants: Vec<Source>) -> Vec<Source> {
        let bye = if entrants.len() % 2 == 1 {
            entrants.pop()
        } else {
            None
        };

        let first = self.matches.len();
        for _ in 0..entrants.len() / 2 {
            let number = self.next_number();
            self.matches
                .push(Match::placeholder(number, target.round, target.bracket));
        }

        for source in entrants {
            self.route(source, target);
        }

        bye.into_iter()
            .chain((first..self.matches.len()).map(Source::WinnerOf))
            .collect()
    }

    fn route(&mut self, source: Source, target: RoundRef) {
        match source {
            Source::Seed(index) => {
                let player = self.players[index].clone();
                let open = self
                    .matches
                    .iter_mut()
                    .filter(|m| m.round_ref() == target)
                    .find_map(|m| {
                        let slot = m.open_slot()?;
                        Some((m, slot))
                    });
                if let Some((m, slot)) = open {
                    m.fill(slot, player);
                }
            }
            Source::WinnerOf(index) => self.matches[index].winner_to = Some(target),
            Source::LoserOf(index) => self.matches[index].loser_to = Some(target),
        }
    }

    fn finish(mut self, format: BracketFormat) -> Bracket {
        for m in &mut self.matches {
            m.version = 0;
        }

        log::debug!(
            "Generated {} bracket: {} players, {} matches",
            format,
            self.players.len(),
            self.matches.len()
        );

        Bracket {
            format,
            player_count: self.players.len(),
            matches: self.matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::MatchStatus;

    fn players(count: usize) -> Vec<PlayerId> {
        (0..count).map(|i| PlayerId::new(format!("p{i}"))).collect()
    }

    fn round_one(bracket: &Bracket) -> Vec<&Match> {
        bracket
            .matches
            .iter()
            .filter(|m| m.round_ref() == RoundRef::winner(1))
            .collect()
    }

    #[test]
    fn test_total_rounds() {
        assert_eq!(total_rounds(2), 1);
        assert_eq!(total_rounds(3), 2);
        assert_eq!(total_rounds(4), 2);
        assert_eq!(total_rounds(5), 3);
        assert_eq!(total_rounds(8), 3);
        assert_eq!(total_rounds(9), 4);
        assert_eq!(total_rounds(64), 6);
    }

    #[test]
    fn test_perfect_bracket_size() {
        assert_eq!(perfect_bracket_size(3), 4);
        assert_eq!(perfect_bracket_size(4), 4);
        assert_eq!(perfect_bracket_size(13), 16);
    }

    #[test]
    fn test_rejects_fewer_than_two_players() {
        assert_eq!(
            single_elimination(&players(1)).unwrap_err(),
            BracketError::NotEnoughPlayers(1)
        );
        assert_eq!(
            double_elimination(&[]).unwrap_err(),
            BracketError::NotEnoughPlayers(0)
        );
    }

    #[test]
    fn test_rejects_duplicate_players() {
        let seeded = vec![PlayerId::from("A"), PlayerId::from("B"), PlayerId::from("A")];
        assert_eq!(
            single_elimination(&seeded).unwrap_err(),
            BracketError::DuplicatePlayer(PlayerId::from("A"))
        );
    }

    #[test]
    fn test_four_players_pairs_in_seed_order() {
        let seeded: Vec<PlayerId> = ["A", "B", "C", "D"].into_iter().map(PlayerId::from).collect();
        let bracket = single_elimination(&seeded).unwrap();

        assert_eq!(bracket.matches.len(), 3);
        let first = &bracket.matches[0];
        assert_eq!(first.player1_id, Some("A".into()));
        assert_eq!(first.player2_id, Some("B".into()));
        let second = &bracket.matches[1];
        assert_eq!(second.player1_id, Some("C".into()));
        assert_eq!(second.player2_id, Some("D".into()));

        let last = &bracket.matches[2];
        assert_eq!(last.round, 2);
        assert!(last.player1_id.is_none() && last.player2_id.is_none());
        assert_eq!(last.winner_to, None);
        assert!(bracket.matches.iter().all(|m| m.status == MatchStatus::Pending));
    }

    #[test]
    fn test_three_players_top_seed_gets_bye() {
        let seeded: Vec<PlayerId> = ["A", "B", "C"].into_iter().map(PlayerId::from).collect();
        let bracket = single_elimination(&seeded).unwrap();

        assert_eq!(bracket.matches.len(), 2);
        assert_eq!(bracket.matches[0].player1_id, Some("B".into()));
        assert_eq!(bracket.matches[0].player2_id, Some("C".into()));

        let final_match = &bracket.matches[1];
        assert_eq!(final_match.round, 2);
        assert_eq!(final_match.player1_id, Some("A".into()));
        assert_eq!(final_match.player2_id, None);
    }

    #[test]
    fn test_round_one_count_is_half_the_field() {
        for count in 2..=40 {
            let bracket = single_elimination(&players(count)).unwrap();
            assert_eq!(round_one(&bracket).len(), count / 2, "n = {count}");
            let rounds = bracket.matches.iter().map(|m| m.round).max().unwrap();
            assert_eq!(rounds, total_rounds(count), "n = {count}");
        }
    }

    #[test]
    fn test_match_numbers_sequential() {
        let bracket = double_elimination(&players(11)).unwrap();
        for (index, m) in bracket.matches.iter().enumerate() {
            assert_eq!(m.match_number as usize, index + 1);
        }
    }

    #[test]
    fn test_later_bye_routes_last_winner_two_rounds_ahead() {
        // 6 players: 3 matches, then 3 entrants in round 2 (1 match + bye).
        let bracket = single_elimination(&players(6)).unwrap();
        let plan = winner_round_plan(6);
        assert!(plan[1].has_bye);

        assert_eq!(bracket.matches[0].winner_to, Some(RoundRef::winner(2)));
        assert_eq!(bracket.matches[1].winner_to, Some(RoundRef::winner(2)));
        assert_eq!(bracket.matches[2].winner_to, Some(RoundRef::winner(3)));
    }

    #[test]
    fn test_single_elimination_has_no_loser_routes() {
        let bracket = single_elimination(&players(9)).unwrap();
        assert!(bracket.matches.iter().all(|m| m.loser_to.is_none()));
        assert!(
            bracket
                .matches
                .iter()
                .all(|m| m.bracket_type == BracketType::Winner)
        );
    }

    #[test]
    fn test_double_elimination_eight_players() {
        let bracket = double_elimination(&players(8)).unwrap();

        let winner_matches = bracket
            .matches
            .iter()
            .filter(|m| m.bracket_type == BracketType::Winner)
            .count();
        let loser_matches = bracket
            .matches
            .iter()
            .filter(|m| m.bracket_type == BracketType::Loser)
            .count();

        // 7 winner-bracket matches + grand final, 6 loser-bracket matches
        assert_eq!(winner_matches, 8);
        assert_eq!(loser_matches, 6);

        let grand_final = bracket.matches.last().unwrap();
        assert_eq!(grand_final.round, 4);
        assert_eq!(grand_final.bracket_type, BracketType::Winner);
        assert_eq!(grand_final.winner_to, None);

        // Winner-bracket losers drop into loser rounds 1, 2, 4
        assert_eq!(bracket.matches[0].loser_to, Some(RoundRef::loser(1)));
        assert_eq!(bracket.matches[4].loser_to, Some(RoundRef::loser(2)));
        assert_eq!(bracket.matches[6].loser_to, Some(RoundRef::loser(4)));
    }

    #[test]
    fn test_double_elimination_two_players_is_a_rematch() {
        let bracket = double_elimination(&players(2)).unwrap();
        assert_eq!(bracket.matches.len(), 2);
        assert_eq!(bracket.matches[0].winner_to, Some(RoundRef::winner(2)));
        assert_eq!(bracket.matches[0].loser_to, Some(RoundRef::winner(2)));
    }

    #[test]
    fn test_slot_counts_match_arrivals() {
        for count in 2..=33 {
            for format in [
                BracketFormat::SingleElimination,
                BracketFormat::DoubleElimination,
            ] {
                let bracket = generate(format, &players(count)).unwrap();
                for m in &bracket.matches {
                    let arrivals = bracket
                        .matches
                        .iter()
                        .map(|src| {
                            usize::from(src.winner_to == Some(m.round_ref()))
                                + usize::from(src.loser_to == Some(m.round_ref()))
                        })
                        .sum::<usize>();
                    let slots = bracket
                        .matches
                        .iter()
                        .filter(|other| other.round_ref() == m.round_ref())
                        .map(|other| 2 - usize::from(other.player1_id.is_some()) - usize::from(other.player2_id.is_some()))
                        .sum::<usize>();
                    assert_eq!(arrivals, slots, "{format} n = {count}, {}", m.round_ref());
                }
            }
        }
    }

    #[test]
    fn test_heuristic_loser_round_sizes() {
        assert_eq!(heuristic_loser_round_sizes(8), vec![2, 2, 1, 1, 1]);
        assert_eq!(heuristic_loser_round_sizes(4).len(), 3);
    }
}
