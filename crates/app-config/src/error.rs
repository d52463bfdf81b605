// In crates/app-config/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid period for strategy '{symbol}': {source}")]
    InvalidPeriod {
        symbol: String,
        #[source]
        source: core_types::Error,
    },

    #[error("Invalid settings for strategy '{symbol}': {reason}")]
    InvalidStrategy { symbol: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
