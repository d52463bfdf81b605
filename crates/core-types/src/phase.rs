// In crates/core-types/src/phase.rs

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Where a trading loop is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum LoopPhase {
    /// Evaluated once, before any order.
    AwaitingEntry,
    /// Monitoring for the exit signal. `position` is the quantity bought at
    /// entry, `None` when monitoring began without a buy.
    Holding { position: Option<Decimal> },
    /// Terminal.
    Exited { reason: ExitReason },
}

impl LoopPhase {
    pub fn is_exited(&self) -> bool {
        matches!(self, LoopPhase::Exited { .. })
    }
}

/// Why a loop stopped. A loop never finishes "successfully".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExitReason {
    /// Market data was empty or could not be fetched.
    DataUnavailable(String),
    /// The operator answered "no".
    Declined,
    /// The operator answered "yes" but the entry rule did not allow a buy.
    NotEligible,
    /// The operator's answer was not a recognised token.
    InvalidConfirmation(String),
    /// Stopped from outside.
    Cancelled,
    /// The loop's task died before it could report.
    Aborted(String),
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::DataUnavailable(detail) => write!(f, "data unavailable: {detail}"),
            ExitReason::Declined => f.write_str("declined by operator"),
            ExitReason::NotEligible => f.write_str("entry not eligible"),
            ExitReason::InvalidConfirmation(token) => write!(f, "invalid confirmation '{token}'"),
            ExitReason::Cancelled => f.write_str("cancelled"),
            ExitReason::Aborted(detail) => write!(f, "aborted: {detail}"),
        }
    }
}
