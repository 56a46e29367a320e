//! Self-reported match scores.
//!
//! Both participants of an ongoing match report the scoreline with optional
//! screenshot evidence. Once both reports are in they are reconciled into a
//! [`Verdict`]:
//! - **Draw**: level score, the match is replayed after a short extension
//! - **Disputed**: the reports contradict, an admin picks the winner
//! - **Winner**: the match completes and the bracket advances
//!
//! ## Example
//!
//! ```
//! use ef_bracket::scoring::{reconcile, ScoreReport, Verdict};
//!
//! let verdict = reconcile(&ScoreReport::new(2, 2), &ScoreReport::new(2, 2));
//! assert_eq!(verdict, Verdict::Draw);
//! ```

pub mod reconcile;

pub use reconcile::{ScoreReport, Verdict, reconcile};
