// In crates/core-types/src/lib.rs

pub mod error;
pub mod period;
pub mod phase;
pub mod strategy;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use period::{PeriodSpec, PeriodUnit};
pub use phase::{ExitReason, LoopPhase};
pub use strategy::{ExitAction, MaLeg, StrategyConfig, Variant};
pub use types::{
    OrderHandle, OrderSize, PricePoint, PriceSeries, Resolution, Side, Signal, Symbol,
};
