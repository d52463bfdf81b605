// In app/src/main.rs

use anyhow::Result;
use app_config::{Settings, StrategySettings, VariantSetting};
use clap::{Args, Parser, Subcommand, ValueEnum};
use core_types::{ExitAction, Resolution};
use engine::{Confirmation, FixedGate, LoopSpec, OperatorGate, Supervisor, TradingLoop};
use events::LoopEvent;
use execution::PaperBroker;
use market_data::{CsvFeed, MarketDataSource};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::prelude::*;

mod operator;
use crate::operator::StdinGate;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A moving-average trading loop.")]
struct Cli {
    /// Overrides `app.log_level` (e.g., "debug" to also print loop events).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs every configured strategy until all exit or Ctrl-C.
    Run(StrategyArgs),

    /// Fetches once and reports the moving averages and signals without trading.
    Evaluate(StrategyArgs),

    /// Validates the settings and prints the resolved strategies.
    Check(StrategyArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ExitArg {
    CloseAll,
    MarketSell,
}

/// An ad-hoc strategy that replaces the configured ones.
#[derive(Args, Debug, Clone)]
struct StrategyArgs {
    /// The symbol to trade (e.g., "AAPL", "ETH-USD").
    #[arg(long, requires_all = ["capital", "primary"])]
    symbol: Option<String>,

    /// Capital committed to the entry order.
    #[arg(long)]
    capital: Option<f64>,

    /// Period token of the single (or fast) moving average (e.g., "15m", "1d").
    #[arg(long)]
    primary: Option<String>,

    /// Period token of the slow moving average. Selects the crossover strategy.
    #[arg(long)]
    secondary: Option<String>,

    /// Seconds between monitoring ticks.
    #[arg(long, default_value_t = 300)]
    interval: u64,

    #[arg(long, value_enum, default_value_t = ExitArg::CloseAll)]
    exit_action: ExitArg,

    /// Allow a crossover entry even when the fast MA is not above the slow one.
    #[arg(long)]
    lenient_entry: bool,

    /// Pre-set entry answer ("yes", "no" or "continue") instead of prompting.
    #[arg(long)]
    confirm: Option<String>,
}

impl StrategyArgs {
    fn to_settings(&self) -> Option<StrategySettings> {
        let symbol = self.symbol.clone()?;
        Some(StrategySettings {
            symbol,
            capital: self.capital.unwrap_or_default(),
            primary_period: self.primary.clone().unwrap_or_default(),
            variant: if self.secondary.is_some() {
                VariantSetting::Dual
            } else {
                VariantSetting::Single
            },
            secondary_period: self.secondary.clone(),
            poll_interval_secs: self.interval,
            exit_action: match self.exit_action {
                ExitArg::CloseAll => ExitAction::CloseAll,
                ExitArg::MarketSell => ExitAction::MarketSell,
            },
            require_entry_crossover: !self.lenient_entry,
            shared_series: false,
            primary_resolution: None,
            secondary_resolution: None,
            confirmation: self.confirm.clone(),
        })
    }

    /// The CLI strategy if one was given, otherwise the configured ones.
    fn strategies(&self, settings: &Settings) -> Vec<StrategySettings> {
        match self.to_settings() {
            Some(adhoc) => vec![adhoc],
            None => settings.strategies.clone(),
        }
    }
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings()?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&settings.app.log_level))?;

    tracing::info!(environment = %settings.app.environment, "Starting matrader");

    // Match on the parsed command and call the appropriate handler.
    match cli.command {
        Commands::Run(args) => handle_run(&settings, &args).await?,
        Commands::Evaluate(args) => handle_evaluate(&settings, &args).await?,
        Commands::Check(args) => handle_check(&settings, &args)?,
    }

    tracing::info!("matrader has finished.");

    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    let level = tracing::Level::from_str(level)
        .map_err(|_| anyhow::anyhow!("Invalid log level '{level}'"))?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_filter(tracing_subscriber::filter::Targets::new().with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();
    Ok(())
}

fn build_feed(settings: &Settings) -> Arc<dyn MarketDataSource> {
    let feed = CsvFeed::new(
        settings.feed.data_dir.clone(),
        Resolution(settings.feed.latest_resolution.clone()),
    );
    if settings.feed.replay {
        tracing::warn!(data_dir = %settings.feed.data_dir.display(), "Replaying recorded bars as live data.");
        Arc::new(feed.replaying())
    } else {
        Arc::new(feed)
    }
}

// --- "Run" Subcommand Logic ---

async fn handle_run(settings: &Settings, args: &StrategyArgs) -> Result<()> {
    let strategies = args.strategies(settings);
    if strategies.is_empty() {
        anyhow::bail!("No strategies to run. Add a [[strategies]] block or pass --symbol.");
    }

    // Only a lone loop may prompt; several loops would race for stdin.
    let interactive = strategies.len() == 1;
    let mut loops = Vec::with_capacity(strategies.len());
    for strategy in &strategies {
        let config = strategy.into_config()?;
        let gate: Box<dyn OperatorGate + Send> = match &strategy.confirmation {
            Some(answer) => Box::new(FixedGate::new(answer.clone())),
            None if interactive => Box::new(StdinGate),
            None => anyhow::bail!(
                "Strategy '{}' needs a confirmation when several strategies run.",
                config.id()
            ),
        };
        loops.push(LoopSpec { config, gate });
    }

    let market = build_feed(settings);
    let broker = Arc::new(PaperBroker::new(&settings.paper, market.clone())?);

    let (events_tx, events_rx) = broadcast::channel::<LoopEvent>(1024);
    tokio::spawn(log_events(events_rx));

    let (stop_handle, stop) = engine::stop_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received. Stopping trading loops...");
            stop_handle.stop();
        }
    });

    let supervisor = Supervisor::new(market, broker.clone(), events_tx, stop);
    let reports = supervisor.run(loops).await;

    for report in &reports {
        tracing::info!(
            id = %report.strategy_id,
            reason = %report.reason,
            ticks = report.ticks,
            capital = %report.capital,
            position = ?report.position,
            "Trading loop report."
        );
    }
    let portfolio = broker.portfolio().await;
    tracing::info!(cash = %portfolio.cash, positions = ?portfolio.positions, "Final paper account.");

    Ok(())
}

/// Renders loop events as JSON lines at debug level.
async fn log_events(mut rx: broadcast::Receiver<LoopEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => tracing::debug!(target: "matrader::events", "{json}"),
                Err(e) => tracing::warn!(error = %e, "Could not serialize loop event."),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event logger fell behind.");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

// --- "Evaluate" Subcommand Logic ---

async fn handle_evaluate(settings: &Settings, args: &StrategyArgs) -> Result<()> {
    let market = build_feed(settings);
    let broker = Arc::new(PaperBroker::new(&settings.paper, market.clone())?);

    for strategy in args.strategies(settings) {
        let config = strategy.into_config()?;
        let trading_loop = TradingLoop::new(config, market.clone(), broker.clone());
        match trading_loop.preview().await {
            Ok(preview) => tracing::info!(
                id = %trading_loop.id(),
                price = ?preview.snapshot.price,
                primary = ?preview.snapshot.averages.primary,
                secondary = ?preview.snapshot.averages.secondary,
                entry = ?preview.entry,
                exit = ?preview.exit,
                "Evaluation."
            ),
            Err(e) => tracing::warn!(id = %trading_loop.id(), error = %e, "Evaluation failed."),
        }
    }
    Ok(())
}

// --- "Check" Subcommand Logic ---

fn handle_check(settings: &Settings, args: &StrategyArgs) -> Result<()> {
    let strategies = args.strategies(settings);
    for strategy in &strategies {
        let config = strategy.into_config()?;
        if let Some(answer) = &strategy.confirmation {
            answer.parse::<Confirmation>()?;
        }
        tracing::info!(
            id = %config.id(),
            capital = %config.capital,
            primary = %config.primary.period,
            primary_resolution = %config.primary.resolution,
            secondary = ?config.secondary.as_ref().map(|leg| leg.period.to_string()),
            interval = ?config.poll_interval,
            exit_action = ?config.exit_action,
            "Strategy is valid."
        );
    }
    tracing::info!(count = strategies.len(), "Settings are valid.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_strategy_replaces_configured_ones() {
        let cli = Cli::parse_from([
            "matrader", "run", "--symbol", "ETH-USD", "--capital", "250", "--primary", "15m",
            "--secondary", "60m", "--exit-action", "market-sell", "--confirm", "continue",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected the run subcommand");
        };

        let settings = args.to_settings().unwrap();
        assert_eq!(settings.variant, VariantSetting::Dual);
        assert_eq!(settings.exit_action, ExitAction::MarketSell);
        assert!(settings.require_entry_crossover);

        let config = settings.into_config().unwrap();
        assert_eq!(config.id(), "ETH-USD_15m_60m_dual_ma");
    }

    #[test]
    fn symbol_requires_capital_and_period() {
        assert!(Cli::try_parse_from(["matrader", "run", "--symbol", "AAPL"]).is_err());
        let cli = Cli::try_parse_from(["matrader", "check"]).unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected the check subcommand");
        };
        assert!(args.to_settings().is_none());
    }
}
