// In crates/engine/src/gate.rs

use crate::Error;
use core_types::{Signal, Symbol};
use rust_decimal::Decimal;
use std::str::FromStr;
use strategies::MarketSnapshot;

/// What the operator is shown before the one-time entry decision.
#[derive(Debug, Clone, Copy)]
pub struct EntryPrompt<'a> {
    pub strategy_id: &'a str,
    pub symbol: &'a Symbol,
    pub capital: Decimal,
    pub snapshot: &'a MarketSnapshot,
    /// The entry rule's verdict before confirmation.
    pub signal: Signal,
}

/// The source of the entry confirmation.
///
/// Called once per loop, before monitoring starts. Returns the raw answer;
/// the loop parses it.
pub trait OperatorGate {
    fn confirm(&mut self, prompt: &EntryPrompt<'_>) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Buy if the entry rule allows it.
    Yes,
    /// Stop without trading.
    No,
    /// Skip the buy and go straight to monitoring.
    Continue,
}

impl FromStr for Confirmation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Confirmation::Yes),
            "no" => Ok(Confirmation::No),
            "continue" => Ok(Confirmation::Continue),
            _ => Err(Error::InvalidConfirmation(s.trim().to_string())),
        }
    }
}

/// Answers every prompt with the same pre-set token.
#[derive(Debug, Clone)]
pub struct FixedGate {
    answer: String,
}

impl FixedGate {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

impl OperatorGate for FixedGate {
    fn confirm(&mut self, prompt: &EntryPrompt<'_>) -> String {
        tracing::info!(
            id = %prompt.strategy_id,
            answer = %self.answer,
            "Using pre-set entry confirmation."
        );
        self.answer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("yes".parse(), Ok(Confirmation::Yes));
        assert_eq!(" YES \n".parse(), Ok(Confirmation::Yes));
        assert_eq!("No".parse(), Ok(Confirmation::No));
        assert_eq!("Continue".parse(), Ok(Confirmation::Continue));
    }

    #[test]
    fn rejects_anything_else() {
        assert_eq!(
            "y".parse::<Confirmation>(),
            Err(Error::InvalidConfirmation("y".to_string()))
        );
        assert!("".parse::<Confirmation>().is_err());
    }
}
