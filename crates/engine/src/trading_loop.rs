// In crates/engine/src/trading_loop.rs

use crate::gate::{Confirmation, EntryPrompt, OperatorGate};
use crate::shutdown::StopSignal;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use core_types::{
    ExitAction, ExitReason, LoopPhase, MaLeg, OrderSize, PriceSeries, Signal, StrategyConfig,
    Variant,
};
use events::{BrokerAction, LoopEvent};
use execution::Broker;
use market_data::MarketDataSource;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use std::sync::Arc;
use strategies::{MarketSnapshot, Strategy, create_strategy, moving_average};
use tokio::sync::broadcast;

/// How a loop ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub strategy_id: String,
    pub reason: ExitReason,
    /// Monitoring ticks that reached a decision.
    pub ticks: u64,
    /// Buying power at the last refresh.
    pub capital: Decimal,
    /// Quantity bought at entry, if any.
    pub position: Option<Decimal>,
}

/// A side-effect-free look at what the loop would decide right now.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Preview {
    pub snapshot: MarketSnapshot,
    pub entry: Signal,
    pub exit: Signal,
}

/// A single poll/decide/act loop for one symbol and one strategy.
///
/// The loop evaluates once, asks the operator whether to enter, then monitors
/// for the exit signal on a fixed interval until the data dries up or it is
/// stopped. Phase and capital belong to this instance alone; the market data
/// source and the broker may be shared with other loops.
pub struct TradingLoop {
    /// A unique identifier for this loop (e.g., "AAPL_15m_single_ma").
    id: String,
    config: StrategyConfig,
    market: Arc<dyn MarketDataSource>,
    broker: Arc<dyn Broker>,
    strategy: Box<dyn Strategy + Send + Sync>,
    phase: LoopPhase,
    capital: Decimal,
    position: Option<Decimal>,
    ticks: u64,
    events: Option<broadcast::Sender<LoopEvent>>,
}

impl TradingLoop {
    pub fn new(
        config: StrategyConfig,
        market: Arc<dyn MarketDataSource>,
        broker: Arc<dyn Broker>,
    ) -> Self {
        let id = config.id();
        let strategy = create_strategy(&config);
        tracing::info!(id = %id, strategy = strategy.name(), "Creating new trading loop.");

        Self {
            id,
            capital: config.capital,
            config,
            market,
            broker,
            strategy,
            phase: LoopPhase::AwaitingEntry,
            position: None,
            ticks: 0,
            events: None,
        }
    }

    /// Broadcasts this loop's events on `tx`.
    pub fn with_events(mut self, tx: broadcast::Sender<LoopEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> &LoopPhase {
        &self.phase
    }

    pub fn capital(&self) -> Decimal {
        self.capital
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs the loop to completion. Never panics and never returns early
    /// without a reason.
    pub async fn run(
        &mut self,
        gate: &mut (dyn OperatorGate + Send),
        mut stop: StopSignal,
    ) -> RunReport {
        tracing::info!(
            id = %self.id,
            symbol = %self.config.symbol,
            interval = ?self.config.poll_interval,
            market = self.market.name(),
            broker = self.broker.name(),
            "Starting trading loop."
        );
        let reason = self.drive(gate, &mut stop).await;
        self.finish(reason)
    }

    async fn drive(
        &mut self,
        gate: &mut (dyn OperatorGate + Send),
        stop: &mut StopSignal,
    ) -> ExitReason {
        if stop.is_stopped() {
            return ExitReason::Cancelled;
        }

        let snapshot = match self.observe().await {
            Ok(snapshot) => snapshot,
            Err(e) => return e.exit_reason(),
        };
        if stop.is_stopped() {
            return ExitReason::Cancelled;
        }
        if let Err(e) = self.decide_entry(&snapshot, gate).await {
            return e.exit_reason();
        }

        loop {
            if let LoopPhase::Exited { reason } = &self.phase {
                return reason.clone();
            }
            if !stop.sleep(self.config.poll_interval).await {
                return ExitReason::Cancelled;
            }

            let snapshot = match self.observe().await {
                Ok(snapshot) => snapshot,
                Err(e) => return e.exit_reason(),
            };
            if stop.is_stopped() {
                tracing::info!(id = %self.id, "Stop requested before acting. Skipping tick.");
                return ExitReason::Cancelled;
            }
            self.act_on_exit(&snapshot).await;
        }
    }

    fn finish(&mut self, reason: ExitReason) -> RunReport {
        if !self.phase.is_exited() {
            self.set_phase(LoopPhase::Exited {
                reason: reason.clone(),
            });
        }
        tracing::info!(id = %self.id, %reason, ticks = self.ticks, "Trading loop exited.");
        self.emit(LoopEvent::Exited {
            strategy_id: self.id.clone(),
            timestamp: Utc::now(),
            reason: reason.clone(),
            ticks: self.ticks,
        });

        RunReport {
            strategy_id: self.id.clone(),
            reason,
            ticks: self.ticks,
            capital: self.capital,
            position: self.position,
        }
    }

    /// The one-time entry step: evaluate, ask the operator, maybe buy.
    ///
    /// Leaves the loop in `Holding` or `Exited`. Data and confirmation errors
    /// leave the phase untouched and are returned.
    pub async fn enter(&mut self, gate: &mut (dyn OperatorGate + Send)) -> Result<()> {
        let snapshot = self.observe().await?;
        self.decide_entry(&snapshot, gate).await
    }

    async fn decide_entry(
        &mut self,
        snapshot: &MarketSnapshot,
        gate: &mut (dyn OperatorGate + Send),
    ) -> Result<()> {
        let signal = self.strategy.assess_entry(snapshot, self.capital);
        self.emit(LoopEvent::Evaluated {
            strategy_id: self.id.clone(),
            snapshot: *snapshot,
            signal,
        });
        tracing::info!(
            id = %self.id,
            price = ?snapshot.price,
            primary = ?snapshot.averages.primary,
            secondary = ?snapshot.averages.secondary,
            capital = %self.capital,
            ?signal,
            "Initial evaluation complete."
        );

        let answer = gate.confirm(&EntryPrompt {
            strategy_id: &self.id,
            symbol: &self.config.symbol,
            capital: self.capital,
            snapshot,
            signal,
        });

        match answer.parse::<Confirmation>()? {
            Confirmation::Yes if signal == Signal::Buy => self.buy(snapshot).await,
            Confirmation::Yes => {
                tracing::warn!(id = %self.id, ?signal, "Entry confirmed but not eligible.");
                self.set_phase(LoopPhase::Exited {
                    reason: ExitReason::NotEligible,
                });
            }
            Confirmation::Continue => {
                tracing::info!(id = %self.id, "Continuing without an entry order.");
                self.set_phase(LoopPhase::Holding { position: None });
            }
            Confirmation::No => self.set_phase(LoopPhase::Exited {
                reason: ExitReason::Declined,
            }),
        }
        Ok(())
    }

    async fn buy(&mut self, snapshot: &MarketSnapshot) {
        let size = OrderSize::Notional(self.capital);
        match self.broker.submit_market_buy(&self.config.symbol, size).await {
            Ok(order) => {
                self.position = order
                    .filled_quantity
                    .or_else(|| self.quantity_at(snapshot.last_close));
                tracing::info!(
                    id = %self.id,
                    order_id = %order.id,
                    quantity = ?self.position,
                    "Entry buy submitted."
                );
                self.emit(LoopEvent::OrderSubmitted {
                    strategy_id: self.id.clone(),
                    order,
                });
            }
            Err(e) => {
                tracing::error!(id = %self.id, error = %e, "Entry buy failed. Monitoring without a position.");
                self.emit_failure(BrokerAction::EntryBuy, &e);
                self.position = None;
            }
        }
        self.set_phase(LoopPhase::Holding {
            position: self.position,
        });
    }

    /// Fractional quantity the full capital buys at `price`.
    fn quantity_at(&self, price: Option<f64>) -> Option<Decimal> {
        let price = Decimal::from_f64(price?)?;
        if price <= Decimal::ZERO {
            return None;
        }
        self.capital.checked_div(price)
    }

    /// One monitoring step without the interval wait.
    pub async fn tick(&mut self) -> Result<Signal> {
        let snapshot = self.observe().await?;
        Ok(self.act_on_exit(&snapshot).await)
    }

    async fn act_on_exit(&mut self, snapshot: &MarketSnapshot) -> Signal {
        let signal = self.strategy.assess_exit(snapshot);
        self.ticks += 1;
        self.emit(LoopEvent::Evaluated {
            strategy_id: self.id.clone(),
            snapshot: *snapshot,
            signal,
        });

        match signal {
            Signal::Sell => self.submit_exit().await,
            Signal::NoData => tracing::warn!(
                id = %self.id,
                primary = ?snapshot.averages.primary,
                secondary = ?snapshot.averages.secondary,
                "Moving averages unavailable. No action this tick."
            ),
            _ => tracing::debug!(
                id = %self.id,
                price = ?snapshot.price,
                primary = ?snapshot.averages.primary,
                secondary = ?snapshot.averages.secondary,
                "No exit signal."
            ),
        }

        self.refresh_capital().await;
        signal
    }

    async fn submit_exit(&mut self) {
        let symbol = &self.config.symbol;
        match self.config.exit_action {
            ExitAction::CloseAll => match self.broker.close_all_positions(symbol).await {
                Ok(()) => tracing::info!(id = %self.id, %symbol, "Exit signal. Closed all positions."),
                Err(e) => {
                    tracing::error!(id = %self.id, error = %e, "Failed to close positions. Retrying next tick.");
                    self.emit_failure(BrokerAction::ExitCloseAll, &e);
                }
            },
            ExitAction::MarketSell => {
                let Some(quantity) = self.position else {
                    tracing::warn!(id = %self.id, "Exit signal but no known position size. Nothing to sell.");
                    return;
                };
                match self.broker.submit_market_sell(symbol, quantity).await {
                    Ok(order) => {
                        tracing::info!(id = %self.id, order_id = %order.id, %quantity, "Exit sell submitted.");
                        self.emit(LoopEvent::OrderSubmitted {
                            strategy_id: self.id.clone(),
                            order,
                        });
                    }
                    Err(e) => {
                        tracing::error!(id = %self.id, error = %e, "Exit sell failed. Retrying next tick.");
                        self.emit_failure(BrokerAction::ExitMarketSell, &e);
                    }
                }
            }
        }
    }

    async fn refresh_capital(&mut self) {
        match self.broker.buying_power().await {
            Ok(capital) => {
                self.capital = capital;
                tracing::debug!(id = %self.id, %capital, "Buying power refreshed.");
                self.emit(LoopEvent::CapitalRefreshed {
                    strategy_id: self.id.clone(),
                    capital,
                });
            }
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "Could not refresh buying power. Keeping the previous value.");
                self.emit_failure(BrokerAction::BuyingPower, &e);
            }
        }
    }

    /// Fetches the configured series and computes the current snapshot.
    ///
    /// An empty series is an error: there is nothing to decide on.
    pub async fn observe(&self) -> Result<MarketSnapshot> {
        let now = Utc::now();
        let config = &self.config;
        let primary = &config.primary;

        let (averages, last_close) = match (config.variant, &config.secondary) {
            (Variant::DualMa, Some(secondary)) if config.shared_series => {
                let start = primary
                    .period
                    .lookback_start(now)?
                    .min(secondary.period.lookback_start(now)?);
                let series = self.fetch(primary, start, now).await?;
                let averages = moving_average::compute_pair(
                    (&series, primary.period.window()),
                    Some((&series, secondary.period.window())),
                );
                (averages, series.last_close())
            }
            (Variant::DualMa, Some(secondary)) => {
                let fast = self
                    .fetch(primary, primary.period.lookback_start(now)?, now)
                    .await?;
                let slow = self
                    .fetch(secondary, secondary.period.lookback_start(now)?, now)
                    .await?;
                let averages = moving_average::compute_pair(
                    (&fast, primary.period.window()),
                    Some((&slow, secondary.period.window())),
                );
                (averages, fast.last_close())
            }
            _ => {
                let series = self
                    .fetch(primary, primary.period.lookback_start(now)?, now)
                    .await?;
                let averages =
                    moving_average::compute_pair((&series, primary.period.window()), None);
                (averages, series.last_close())
            }
        };

        let price = match config.variant {
            Variant::SingleMa => match self.market.latest_price(&config.symbol).await {
                Ok(price) => Some(price),
                Err(e) => {
                    tracing::warn!(id = %self.id, error = %e, "Latest price unavailable.");
                    None
                }
            },
            Variant::DualMa => last_close,
        };

        Ok(MarketSnapshot {
            as_of: now,
            price,
            last_close,
            averages,
        })
    }

    /// Evaluates both rules once without touching the broker.
    pub async fn preview(&self) -> Result<Preview> {
        let snapshot = self.observe().await?;
        Ok(Preview {
            entry: self.strategy.assess_entry(&snapshot, self.capital),
            exit: self.strategy.assess_exit(&snapshot),
            snapshot,
        })
    }

    async fn fetch(
        &self,
        leg: &MaLeg,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        let series = self
            .market
            .fetch(&self.config.symbol, start, end, &leg.resolution)
            .await?;
        if series.is_empty() {
            return Err(Error::DataUnavailable(format!(
                "no {} bars for {} since {}",
                leg.resolution, self.config.symbol, start
            )));
        }
        tracing::debug!(
            id = %self.id,
            resolution = %leg.resolution,
            bars = series.len(),
            "Fetched price history."
        );
        Ok(series)
    }

    fn set_phase(&mut self, phase: LoopPhase) {
        tracing::info!(id = %self.id, ?phase, "Phase changed.");
        self.emit(LoopEvent::PhaseChanged {
            strategy_id: self.id.clone(),
            timestamp: Utc::now(),
            phase: phase.clone(),
        });
        self.phase = phase;
    }

    fn emit_failure(&self, action: BrokerAction, error: &execution::Error) {
        self.emit(LoopEvent::BrokerFailure {
            strategy_id: self.id.clone(),
            timestamp: Utc::now(),
            action,
            message: error.to_string(),
        });
    }

    fn emit(&self, event: LoopEvent) {
        if let Some(tx) = &self.events {
            // No subscribers is fine.
            let _ = tx.send(event);
        }
    }
}
