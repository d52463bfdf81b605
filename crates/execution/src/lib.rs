// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::{OrderHandle, OrderSize, Symbol};
use rust_decimal::Decimal;

pub mod error;
pub mod paper;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use paper::PaperBroker;
pub use types::{PaperSettings, Portfolio};

/// The universal interface for a brokerage account.
///
/// Orders are fire-and-forget: a returned `OrderHandle` means the order was
/// accepted, not that the caller should wait for it. Loops share one broker,
/// so every method takes `&self`.
#[async_trait]
pub trait Broker: Send + Sync {
    /// The name of the broker (e.g., "PaperBroker").
    fn name(&self) -> &'static str;

    /// Submits a market buy sized either by notional or by quantity.
    async fn submit_market_buy(&self, symbol: &Symbol, size: OrderSize) -> Result<OrderHandle>;

    /// Submits a market sell of `quantity` units.
    async fn submit_market_sell(&self, symbol: &Symbol, quantity: Decimal) -> Result<OrderHandle>;

    /// Liquidates every open position in `symbol`. Succeeds when already flat.
    async fn close_all_positions(&self, symbol: &Symbol) -> Result<()>;

    /// Cash currently available for new positions.
    async fn buying_power(&self) -> Result<Decimal>;
}
