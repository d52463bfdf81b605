// In crates/app-config/src/types.rs

use crate::{Error, Result};
use core_types::{ExitAction, MaLeg, PeriodSpec, Resolution, StrategyConfig, Symbol, Variant};
use execution::PaperSettings;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Where market data comes from.
    pub feed: FeedSettings,
    /// The simulated account orders are sent to.
    pub paper: PaperSettings,
    /// One entry per independent trading loop.
    #[serde(default)]
    pub strategies: Vec<StrategySettings>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FeedSettings {
    /// Directory holding `<SYMBOL>_<resolution>.csv` files.
    pub data_dir: PathBuf,
    /// Resolution whose newest bar is taken as the latest price.
    #[serde(default = "default_latest_resolution")]
    pub latest_resolution: String,
    /// Anchor each file's newest bar at the requested range end, so recorded
    /// history can be replayed.
    #[serde(default)]
    pub replay: bool,
}

fn default_latest_resolution() -> String {
    Resolution::finest().0
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VariantSetting {
    #[serde(alias = "single_ma")]
    Single,
    #[serde(alias = "dual_ma")]
    Dual,
}

impl From<VariantSetting> for Variant {
    fn from(value: VariantSetting) -> Self {
        match value {
            VariantSetting::Single => Variant::SingleMa,
            VariantSetting::Dual => Variant::DualMa,
        }
    }
}

/// A `[[strategies]]` block as written by the operator.
#[derive(Deserialize, Debug, Clone)]
pub struct StrategySettings {
    pub symbol: String,
    pub capital: f64,
    pub primary_period: String,
    #[serde(default)]
    pub secondary_period: Option<String>,
    pub variant: VariantSetting,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub exit_action: ExitAction,
    #[serde(default = "default_true")]
    pub require_entry_crossover: bool,
    #[serde(default)]
    pub shared_series: bool,
    /// Overrides the bar size implied by `primary_period`.
    #[serde(default)]
    pub primary_resolution: Option<String>,
    #[serde(default)]
    pub secondary_resolution: Option<String>,
    /// A pre-set answer to the entry prompt ("yes", "no" or "continue").
    #[serde(default)]
    pub confirmation: Option<String>,
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl StrategySettings {
    /// Validates the block and resolves it into an immutable run configuration.
    pub fn into_config(&self) -> Result<StrategyConfig> {
        let invalid = |reason: &str| Error::InvalidStrategy {
            symbol: self.symbol.clone(),
            reason: reason.to_string(),
        };

        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(invalid("symbol must not be empty"));
        }

        let capital = Decimal::from_f64(self.capital)
            .filter(|c| *c > Decimal::ZERO)
            .ok_or_else(|| invalid("capital must be a positive amount"))?;

        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs must be at least 1"));
        }

        let variant = Variant::from(self.variant);
        let primary = self.leg(&self.primary_period, self.primary_resolution.as_deref())?;
        let secondary = match (variant, &self.secondary_period) {
            (Variant::DualMa, Some(token)) => {
                Some(self.leg(token, self.secondary_resolution.as_deref())?)
            }
            (Variant::DualMa, None) => {
                return Err(invalid("dual variant requires secondary_period"));
            }
            (Variant::SingleMa, _) => None,
        };

        Ok(StrategyConfig {
            symbol: Symbol(symbol.to_string()),
            capital,
            variant,
            primary,
            secondary,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            exit_action: self.exit_action,
            require_entry_crossover: self.require_entry_crossover,
            shared_series: self.shared_series,
        })
    }

    fn leg(&self, token: &str, resolution: Option<&str>) -> Result<MaLeg> {
        let period = PeriodSpec::parse(token).map_err(|source| Error::InvalidPeriod {
            symbol: self.symbol.clone(),
            source,
        })?;
        let mut leg = MaLeg::from_period(period);
        if let Some(resolution) = resolution {
            leg.resolution = Resolution(resolution.to_string());
        }
        Ok(leg)
    }
}

impl Settings {
    /// Resolves every configured strategy, failing on the first invalid one.
    pub fn strategy_configs(&self) -> Result<Vec<StrategyConfig>> {
        self.strategies
            .iter()
            .map(StrategySettings::into_config)
            .collect()
    }
}
