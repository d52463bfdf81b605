// In crates/engine/src/error.rs

use core_types::ExitReason;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid confirmation '{0}': expected yes, no or continue")]
    InvalidConfirmation(String),

    #[error("Cannot build the history window: {0}")]
    Period(#[from] core_types::Error),
}

impl Error {
    /// How a loop that hit this error reports its end.
    pub fn exit_reason(self) -> ExitReason {
        match self {
            Error::DataUnavailable(detail) => ExitReason::DataUnavailable(detail),
            Error::InvalidConfirmation(token) => ExitReason::InvalidConfirmation(token),
            e @ Error::Period(_) => ExitReason::DataUnavailable(e.to_string()),
        }
    }
}

impl From<market_data::Error> for Error {
    fn from(e: market_data::Error) -> Self {
        Error::DataUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
