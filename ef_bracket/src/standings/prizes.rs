//! Prize pool split and ranking points.

use serde::{Deserialize, Serialize};

use super::Standings;
use crate::bracket::PlayerId;
use crate::config::{BPS_DENOMINATOR, EngineConfig, PrizeSplit};

/// Prize pool split into the three paid places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeDistribution {
    /// Total prize pool in minor currency units
    pub total_pool: i64,
    pub first: i64,
    pub second: i64,
    pub third: i64,
    /// Remainder retained by the platform
    pub platform_fee: i64,
}

impl PrizeDistribution {
    /// Split a pool by the configured basis points.
    ///
    /// Shares round down, so the paid places never exceed the pool.
    /// A non-positive pool pays nothing.
    pub fn calculate(total_pool: i64, split: &PrizeSplit) -> Self {
        if total_pool <= 0 {
            return Self {
                total_pool,
                first: 0,
                second: 0,
                third: 0,
                platform_fee: 0,
            };
        }

        let share = |bps: u32| -> i64 {
            let amount = i128::from(total_pool) * i128::from(bps) / i128::from(BPS_DENOMINATOR);
            amount as i64
        };

        let first = share(split.first_bps);
        let second = share(split.second_bps);
        let third = share(split.third_bps);

        Self {
            total_pool,
            first,
            second,
            third,
            platform_fee: total_pool - first - second - third,
        }
    }

    /// Pool built from entry fees
    pub fn from_entry_fees(player_count: usize, entry_fee: i64, split: &PrizeSplit) -> Self {
        Self::calculate(entry_fee.saturating_mul(player_count as i64), split)
    }

    /// Payout for a finishing position (1-indexed)
    pub fn payout_for_position(&self, position: usize) -> Option<i64> {
        match position {
            1 => Some(self.first),
            2 => Some(self.second),
            3 => Some(self.third),
            _ => None,
        }
    }

    pub fn paid_out(&self) -> i64 {
        self.first + self.second + self.third
    }
}

/// What one player earns at the end of a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub player: PlayerId,
    /// 1, 2, 3, or None for everybody else
    pub position: Option<usize>,
    pub prize: i64,
    pub points: u32,
}

/// Turn standings into prize and point awards.
///
/// An unclaimed third place (two-player field) leaves its share with the platform.
pub fn awards(standings: &Standings, total_pool: i64, config: &EngineConfig) -> Vec<Award> {
    let distribution = PrizeDistribution::calculate(total_pool, &config.prize_split);
    let points = config.points;

    let mut awards = vec![
        Award {
            player: standings.first.clone(),
            position: Some(1),
            prize: distribution.first,
            points: points.first,
        },
        Award {
            player: standings.second.clone(),
            position: Some(2),
            prize: distribution.second,
            points: points.second,
        },
    ];

    if let Some(third) = &standings.third {
        awards.push(Award {
            player: third.clone(),
            position: Some(3),
            prize: distribution.third,
            points: points.third,
        });
    }

    awards.extend(standings.participants.iter().map(|player| Award {
        player: player.clone(),
        position: None,
        prize: 0,
        points: points.participant,
    }));

    awards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_split() {
        let prize = PrizeDistribution::calculate(10_000, &PrizeSplit::default());
        assert_eq!(prize.first, 4500);
        assert_eq!(prize.second, 2250);
        assert_eq!(prize.third, 750);
        assert_eq!(prize.platform_fee, 2500);
    }

    #[test]
    fn test_rounding_stays_within_pool() {
        let prize = PrizeDistribution::calculate(333, &PrizeSplit::default());
        assert_eq!(prize.first, 149); // 149.85
        assert_eq!(prize.second, 74); // 74.925
        assert_eq!(prize.third, 24); // 24.975
        assert_eq!(prize.paid_out() + prize.platform_fee, 333);
    }

    #[test]
    fn test_non_positive_pool_pays_nothing() {
        let prize = PrizeDistribution::calculate(0, &PrizeSplit::default());
        assert_eq!(prize.paid_out(), 0);
        let prize = PrizeDistribution::calculate(-50, &PrizeSplit::default());
        assert_eq!(prize.paid_out(), 0);
    }

    #[test]
    fn test_from_entry_fees() {
        let prize = PrizeDistribution::from_entry_fees(8, 500, &PrizeSplit::default());
        assert_eq!(prize.total_pool, 4000);
        assert_eq!(prize.first, 1800);
    }

    #[test]
    fn test_payout_for_position() {
        let prize = PrizeDistribution::calculate(1000, &PrizeSplit::default());
        assert_eq!(prize.payout_for_position(1), Some(450));
        assert_eq!(prize.payout_for_position(2), Some(225));
        assert_eq!(prize.payout_for_position(3), Some(75));
        assert_eq!(prize.payout_for_position(4), None);
        assert_eq!(prize.payout_for_position(0), None);
    }

    #[test]
    fn test_awards_points() {
        let standings = Standings {
            first: "A".into(),
            second: "B".into(),
            third: None,
            participants: vec!["C".into()],
        };
        let awards = awards(&standings, 1000, &EngineConfig::default());

        assert_eq!(awards.len(), 3);
        assert_eq!(awards[0].points, 1000);
        assert_eq!(awards[1].prize, 225);
        assert_eq!(awards[2].position, None);
        assert_eq!(awards[2].points, 100);
        assert_eq!(awards[2].prize, 0);
    }
}
