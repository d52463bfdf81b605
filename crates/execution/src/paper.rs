// In crates/execution/src/paper.rs

use crate::types::{PaperSettings, Portfolio};
use crate::{Broker, Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{OrderHandle, OrderSize, Side, Symbol};
use market_data::MarketDataSource;
use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Fractional digits kept on simulated fill quantities.
const QUANTITY_DP: u32 = 8;

/// A simulated account that fills market orders at the latest observed price.
///
/// Fills pay slippage against the trader and a taker fee. Cash and holdings
/// live behind one async mutex so concurrent loops see a consistent account.
pub struct PaperBroker {
    prices: Arc<dyn MarketDataSource>,
    slippage: Decimal,
    taker_fee: Decimal,
    portfolio: Mutex<Portfolio>,
    next_order: AtomicU64,
}

fn rate(name: &str, value: f64) -> Result<Decimal> {
    Decimal::from_f64(value)
        .filter(|r| *r >= Decimal::ZERO)
        .ok_or_else(|| Error::ExecutionFailed {
            reason: format!("invalid {name}: {value}"),
        })
}

impl PaperBroker {
    pub fn new(settings: &PaperSettings, prices: Arc<dyn MarketDataSource>) -> Result<Self> {
        let initial_cash = rate("initial cash", settings.initial_cash)?;
        Ok(Self {
            prices,
            slippage: rate("slippage", settings.slippage_percent)?,
            taker_fee: rate("taker fee", settings.taker_fee)?,
            portfolio: Mutex::new(Portfolio::new(initial_cash)),
            next_order: AtomicU64::new(1),
        })
    }

    /// A copy of the current account state.
    pub async fn portfolio(&self) -> Portfolio {
        self.portfolio.lock().await.clone()
    }

    async fn market_price(&self, symbol: &Symbol) -> Result<Decimal> {
        let price = self.prices.latest_price(symbol).await?;
        Decimal::from_f64(price)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| Error::InvalidPrice {
                symbol: symbol.to_string(),
                price,
            })
    }

    fn handle(&self, symbol: &Symbol, side: Side, size: OrderSize, filled: Decimal) -> OrderHandle {
        let n = self.next_order.fetch_add(1, Ordering::Relaxed);
        OrderHandle {
            id: format!("paper-{n}"),
            symbol: symbol.clone(),
            side,
            size,
            filled_quantity: Some(filled),
            submitted_at: Utc::now(),
        }
    }

    /// Sells `quantity` from an already locked portfolio.
    fn fill_sell(
        &self,
        portfolio: &mut Portfolio,
        symbol: &Symbol,
        quantity: Decimal,
        market_price: Decimal,
    ) -> Result<Decimal> {
        let held = portfolio.quantity(symbol);
        if quantity <= Decimal::ZERO || quantity > held {
            return Err(Error::Rejected {
                reason: format!("cannot sell {quantity} {symbol}, holding {held}"),
            });
        }

        // Slippage makes a sell fill lower.
        let execution_price = market_price * (dec!(1) - self.slippage);
        let proceeds = quantity * execution_price;
        let fee = proceeds * self.taker_fee;
        portfolio.cash += proceeds - fee;

        let remaining = held - quantity;
        if remaining.is_zero() {
            portfolio.positions.remove(symbol);
        } else {
            portfolio.positions.insert(symbol.clone(), remaining);
        }

        tracing::info!(
            %symbol,
            %quantity,
            price = %execution_price,
            %fee,
            cash = %portfolio.cash,
            "Paper sell filled."
        );
        Ok(quantity)
    }
}

#[async_trait]
impl Broker for PaperBroker {
    fn name(&self) -> &'static str {
        "PaperBroker"
    }

    async fn submit_market_buy(&self, symbol: &Symbol, size: OrderSize) -> Result<OrderHandle> {
        let market_price = self.market_price(symbol).await?;
        // Slippage makes a buy fill higher.
        let execution_price = market_price * (dec!(1) + self.slippage);

        let quantity = match size {
            // The notional covers both the position and its fee.
            OrderSize::Notional(notional) => (notional
                / (execution_price * (dec!(1) + self.taker_fee)))
                .round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::ToZero),
            OrderSize::Quantity(quantity) => quantity,
        };
        if quantity <= Decimal::ZERO {
            return Err(Error::Rejected {
                reason: format!("order size {size:?} buys nothing at {execution_price}"),
            });
        }

        let cost = quantity * execution_price;
        let fee = cost * self.taker_fee;

        let mut portfolio = self.portfolio.lock().await;
        if cost + fee > portfolio.cash {
            return Err(Error::Rejected {
                reason: format!(
                    "insufficient cash: need {}, have {}",
                    cost + fee,
                    portfolio.cash
                ),
            });
        }
        portfolio.cash -= cost + fee;
        *portfolio.positions.entry(symbol.clone()).or_insert(Decimal::ZERO) += quantity;

        tracing::info!(
            %symbol,
            %quantity,
            price = %execution_price,
            %fee,
            cash = %portfolio.cash,
            "Paper buy filled."
        );
        Ok(self.handle(symbol, Side::Buy, size, quantity))
    }

    async fn submit_market_sell(&self, symbol: &Symbol, quantity: Decimal) -> Result<OrderHandle> {
        let market_price = self.market_price(symbol).await?;
        let mut portfolio = self.portfolio.lock().await;
        let filled = self.fill_sell(&mut portfolio, symbol, quantity, market_price)?;
        Ok(self.handle(symbol, Side::Sell, OrderSize::Quantity(quantity), filled))
    }

    async fn close_all_positions(&self, symbol: &Symbol) -> Result<()> {
        if self.portfolio.lock().await.quantity(symbol).is_zero() {
            tracing::debug!(%symbol, "No open position to close.");
            return Ok(());
        }

        let market_price = self.market_price(symbol).await?;
        let mut portfolio = self.portfolio.lock().await;
        // Another task may have closed it while the price was fetched.
        let held = portfolio.quantity(symbol);
        if held.is_zero() {
            return Ok(());
        }
        self.fill_sell(&mut portfolio, symbol, held, market_price)?;
        Ok(())
    }

    async fn buying_power(&self) -> Result<Decimal> {
        Ok(self.portfolio.lock().await.cash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::InMemoryFeed;

    async fn broker(cash: f64, taker_fee: f64, slippage_percent: f64) -> (Arc<InMemoryFeed>, PaperBroker) {
        let feed = Arc::new(InMemoryFeed::new());
        feed.set_latest_price(Symbol("AAPL".to_string()), 100.0).await;
        let settings = PaperSettings {
            initial_cash: cash,
            taker_fee,
            slippage_percent,
        };
        let broker = PaperBroker::new(&settings, feed.clone()).unwrap();
        (feed, broker)
    }

    fn aapl() -> Symbol {
        Symbol("AAPL".to_string())
    }

    #[tokio::test]
    async fn notional_buy_spends_capital() {
        let (_feed, broker) = broker(1000.0, 0.0, 0.0).await;
        let handle = broker
            .submit_market_buy(&aapl(), OrderSize::Notional(dec!(1000)))
            .await
            .unwrap();

        assert_eq!(handle.id, "paper-1");
        assert_eq!(handle.side, Side::Buy);
        assert_eq!(handle.filled_quantity, Some(dec!(10)));
        assert_eq!(broker.buying_power().await.unwrap(), dec!(0));
        assert_eq!(broker.portfolio().await.quantity(&aapl()), dec!(10));
    }

    #[tokio::test]
    async fn fees_and_slippage_stay_within_notional() {
        let (_feed, broker) = broker(1000.0, 0.001, 0.01).await;
        let handle = broker
            .submit_market_buy(&aapl(), OrderSize::Notional(dec!(1000)))
            .await
            .unwrap();

        let quantity = handle.filled_quantity.unwrap();
        assert!(quantity > dec!(9.8) && quantity < dec!(10));
        assert!(broker.buying_power().await.unwrap() >= Decimal::ZERO);
    }

    #[tokio::test]
    async fn sells_reduce_the_position_and_reject_oversells() {
        let (feed, broker) = broker(1000.0, 0.0, 0.0).await;
        broker
            .submit_market_buy(&aapl(), OrderSize::Quantity(dec!(5)))
            .await
            .unwrap();

        feed.set_latest_price(aapl(), 110.0).await;
        let handle = broker.submit_market_sell(&aapl(), dec!(2)).await.unwrap();
        assert_eq!(handle.id, "paper-2");
        assert_eq!(broker.buying_power().await.unwrap(), dec!(720));

        let err = broker.submit_market_sell(&aapl(), dec!(4)).await.unwrap_err();
        assert!(matches!(err, Error::Rejected { .. }));
        assert_eq!(broker.portfolio().await.quantity(&aapl()), dec!(3));
    }

    #[tokio::test]
    async fn buys_beyond_cash_are_rejected() {
        let (_feed, broker) = broker(50.0, 0.0, 0.0).await;
        let err = broker
            .submit_market_buy(&aapl(), OrderSize::Quantity(dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rejected { .. }));
        assert_eq!(broker.buying_power().await.unwrap(), dec!(50));
    }

    #[tokio::test]
    async fn close_all_liquidates_and_is_idempotent() {
        let (_feed, broker) = broker(1000.0, 0.0, 0.0).await;
        broker
            .submit_market_buy(&aapl(), OrderSize::Notional(dec!(400)))
            .await
            .unwrap();

        broker.close_all_positions(&aapl()).await.unwrap();
        assert!(broker.portfolio().await.positions.is_empty());
        assert_eq!(broker.buying_power().await.unwrap(), dec!(1000));

        broker.close_all_positions(&aapl()).await.unwrap();
        assert_eq!(broker.buying_power().await.unwrap(), dec!(1000));
    }

    #[tokio::test]
    async fn missing_price_surfaces_market_data_error() {
        let (_feed, broker) = broker(1000.0, 0.0, 0.0).await;
        let err = broker
            .submit_market_buy(&Symbol("TSLA".to_string()), OrderSize::Notional(dec!(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MarketData(_)));
    }
}
