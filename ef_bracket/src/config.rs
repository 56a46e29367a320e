//! Engine configuration.
//!
//! Consolidates the tunables of match timing, prize split and point awards,
//! loaded from environment variables with validated defaults.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Basis points in 100%
pub const BPS_DENOMINATOR: i64 = 10_000;

/// Share of the prize pool paid to the top three, in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeSplit {
    pub first_bps: u32,
    pub second_bps: u32,
    pub third_bps: u32,
}

impl PrizeSplit {
    /// Total share paid out; the rest stays with the platform
    pub fn total_bps(&self) -> u32 {
        self.first_bps + self.second_bps + self.third_bps
    }
}

impl Default for PrizeSplit {
    /// 45% / 22.5% / 7.5%
    fn default() -> Self {
        Self {
            first_bps: 4500,
            second_bps: 2250,
            third_bps: 750,
        }
    }
}

/// Ranking points handed out when a tournament finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointAwards {
    pub first: u32,
    pub second: u32,
    pub third: u32,
    pub participant: u32,
}

impl Default for PointAwards {
    fn default() -> Self {
        Self {
            first: 1000,
            second: 500,
            third: 250,
            participant: 100,
        }
    }
}

/// Bracket engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minutes players get to play and report once a match goes ongoing
    pub match_window_mins: u32,
    /// Minutes added to the deadline after a draw
    pub draw_extension_mins: u32,
    pub prize_split: PrizeSplit,
    pub points: PointAwards,
    /// Optimistic write attempts before giving up on a contended match
    pub max_write_retries: u32,
}

impl EngineConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - `MATCH_WINDOW_MINS` (default: 30)
    /// - `DRAW_EXTENSION_MINS` (default: 10)
    /// - `PRIZE_FIRST_BPS`, `PRIZE_SECOND_BPS`, `PRIZE_THIRD_BPS` (default: 4500/2250/750)
    /// - `POINTS_FIRST`, `POINTS_SECOND`, `POINTS_THIRD`, `POINTS_PARTICIPANT` (default: 1000/500/250/100)
    /// - `MAX_WRITE_RETRIES` (default: 3)
    ///
    /// # Errors
    ///
    /// Returns error if the loaded values fail [`EngineConfig::validate`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            match_window_mins: parse_env_or("MATCH_WINDOW_MINS", defaults.match_window_mins),
            draw_extension_mins: parse_env_or("DRAW_EXTENSION_MINS", defaults.draw_extension_mins),
            prize_split: PrizeSplit {
                first_bps: parse_env_or("PRIZE_FIRST_BPS", defaults.prize_split.first_bps),
                second_bps: parse_env_or("PRIZE_SECOND_BPS", defaults.prize_split.second_bps),
                third_bps: parse_env_or("PRIZE_THIRD_BPS", defaults.prize_split.third_bps),
            },
            points: PointAwards {
                first: parse_env_or("POINTS_FIRST", defaults.points.first),
                second: parse_env_or("POINTS_SECOND", defaults.points.second),
                third: parse_env_or("POINTS_THIRD", defaults.points.third),
                participant: parse_env_or("POINTS_PARTICIPANT", defaults.points.participant),
            },
            max_write_retries: parse_env_or("MAX_WRITE_RETRIES", defaults.max_write_retries),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.match_window_mins == 0 {
            return Err(ConfigError::Invalid {
                var: "MATCH_WINDOW_MINS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.draw_extension_mins == 0 {
            return Err(ConfigError::Invalid {
                var: "DRAW_EXTENSION_MINS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if i64::from(self.prize_split.total_bps()) > BPS_DENOMINATOR {
            return Err(ConfigError::Invalid {
                var: "PRIZE_FIRST_BPS".to_string(),
                reason: format!(
                    "Prize shares add up to {} bps, more than the whole pool",
                    self.prize_split.total_bps()
                ),
            });
        }

        let split = self.prize_split;
        if split.first_bps < split.second_bps || split.second_bps < split.third_bps {
            return Err(ConfigError::Invalid {
                var: "PRIZE_SECOND_BPS".to_string(),
                reason: "Lower places cannot earn more than higher places".to_string(),
            });
        }

        if self.max_write_retries == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_WRITE_RETRIES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn match_window(&self) -> Duration {
        Duration::minutes(i64::from(self.match_window_mins))
    }

    pub fn draw_extension(&self) -> Duration {
        Duration::minutes(i64::from(self.draw_extension_mins))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_window_mins: 30,
            draw_extension_mins: 10,
            prize_split: PrizeSplit::default(),
            points: PointAwards::default(),
            max_write_retries: 3,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
pub(crate) fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
