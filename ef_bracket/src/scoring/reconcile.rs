//! Reconciliation of the two self-reported scores of a match.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::bracket::Slot;

/// Score as reported by one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Goals the reporting player scored
    pub own_goals: u32,
    /// Goals the reporting player says the opponent scored
    pub opponent_goals: u32,
    /// Reference to the uploaded screenshot, if any
    pub screenshot: Option<String>,
}

impl ScoreReport {
    pub fn new(own_goals: u32, opponent_goals: u32) -> Self {
        Self {
            own_goals,
            opponent_goals,
            screenshot: None,
        }
    }

    /// Attach screenshot evidence
    pub fn with_screenshot(mut self, screenshot: impl Into<String>) -> Self {
        self.screenshot = Some(screenshot.into());
        self
    }

    /// Outcome from the reporter's point of view
    fn claim(&self) -> Ordering {
        self.own_goals.cmp(&self.opponent_goals)
    }
}

/// Result of comparing both reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Level score agreed by both sides: replay required
    Draw,
    /// Reports contradict each other: admin decision required
    Disputed,
    /// Exactly one winner implied by agreeing reports
    Winner {
        slot: Slot,
        player1_score: u32,
        player2_score: u32,
    },
}

/// Compare both reports.
///
/// The recorded score trusts each player for their own goals. The reports
/// must agree on who won (player 1 claiming a win requires player 2 to
/// claim a loss, and so on), and the recorded score must tell the same
/// story; anything else is a dispute. Screenshots are not inspected.
pub fn reconcile(player1: &ScoreReport, player2: &ScoreReport) -> Verdict {
    let player1_claim = player1.claim();
    let player2_claim = player2.claim();

    // Player 2's view is mirrored, so agreement means opposite orderings.
    if player1_claim != player2_claim.reverse() {
        return Verdict::Disputed;
    }

    let recorded = player1.own_goals.cmp(&player2.own_goals);
    if recorded != player1_claim {
        return Verdict::Disputed;
    }

    match recorded {
        Ordering::Equal => Verdict::Draw,
        Ordering::Greater => Verdict::Winner {
            slot: Slot::Player1,
            player1_score: player1.own_goals,
            player2_score: player2.own_goals,
        },
        Ordering::Less => Verdict::Winner {
            slot: Slot::Player2,
            player1_score: player1.own_goals,
            player2_score: player2.own_goals,
        },
    }
}
