// In crates/engine/src/lib.rs

pub mod error;
pub mod gate;
pub mod shutdown;
pub mod trading_loop;

pub use error::{Error, Result};
pub use gate::{Confirmation, EntryPrompt, FixedGate, OperatorGate};
pub use shutdown::{StopHandle, StopSignal, stop_channel};
pub use trading_loop::{Preview, RunReport, TradingLoop};

use core_types::{ExitReason, StrategyConfig};
use events::LoopEvent;
use execution::Broker;
use futures::future;
use market_data::MarketDataSource;
use std::sync::Arc;
use tokio::sync::broadcast;

/// One loop to start: its configuration and where its entry answer comes from.
pub struct LoopSpec {
    pub config: StrategyConfig,
    pub gate: Box<dyn OperatorGate + Send>,
}

/// Runs independent trading loops side by side.
///
/// Loops share the market data source and the broker and nothing else.
pub struct Supervisor {
    market: Arc<dyn MarketDataSource>,
    broker: Arc<dyn Broker>,
    events: broadcast::Sender<LoopEvent>,
    stop: StopSignal,
}

impl Supervisor {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        broker: Arc<dyn Broker>,
        events: broadcast::Sender<LoopEvent>,
        stop: StopSignal,
    ) -> Self {
        Self {
            market,
            broker,
            events,
            stop,
        }
    }

    /// Spawns a task per loop and waits for every one of them to exit.
    ///
    /// Reports come back in the order the loops were given, one per loop. A
    /// loop whose task panicked is reported as `Aborted`.
    pub async fn run(&self, loops: Vec<LoopSpec>) -> Vec<RunReport> {
        tracing::info!(count = loops.len(), "Starting trading loops...");

        let mut task_handles = Vec::with_capacity(loops.len());
        let mut started = Vec::with_capacity(loops.len());
        for LoopSpec { config, mut gate } in loops {
            started.push((config.id(), config.capital));
            let mut trading_loop =
                TradingLoop::new(config, self.market.clone(), self.broker.clone())
                    .with_events(self.events.clone());
            let stop = self.stop.clone();

            let handle = tokio::spawn(async move { trading_loop.run(gate.as_mut(), stop).await });
            task_handles.push(handle);
        }

        let results = future::join_all(task_handles).await;

        let mut reports = Vec::with_capacity(results.len());
        for (result, (strategy_id, capital)) in results.into_iter().zip(started) {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!(id = %strategy_id, error = %e, "A trading loop task failed.");
                    reports.push(RunReport {
                        strategy_id,
                        reason: ExitReason::Aborted(e.to_string()),
                        ticks: 0,
                        capital,
                        position: None,
                    });
                }
            }
        }
        tracing::info!(count = reports.len(), "All trading loops have exited.");
        reports
    }
}
