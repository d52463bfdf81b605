use crate::{PeriodSpec, Resolution, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which signal rule a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// One moving average compared against the latest price.
    SingleMa,
    /// A fast moving average compared against a slow one.
    DualMa,
}

/// What the loop does when the exit signal fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitAction {
    /// Liquidate every open position for the symbol.
    #[default]
    CloseAll,
    /// Submit a market sell for the quantity bought at entry.
    MarketSell,
}

/// The fetch plan for one moving average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaLeg {
    pub period: PeriodSpec,
    pub resolution: Resolution,
}

impl MaLeg {
    /// A leg whose bars are requested at the resolution named by its own token.
    pub fn from_period(period: PeriodSpec) -> Self {
        Self {
            resolution: Resolution(period.to_string()),
            period,
        }
    }
}

/// Immutable run parameters, resolved once before the loop starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub symbol: Symbol,
    /// Buying power committed to the entry order.
    pub capital: Decimal,
    pub variant: Variant,
    /// The single MA, or the fast MA in dual mode.
    pub primary: MaLeg,
    /// The slow MA; required in dual mode and ignored otherwise.
    pub secondary: Option<MaLeg>,
    pub poll_interval: Duration,
    pub exit_action: ExitAction,
    /// Dual mode only: demand `fast > slow` before buying.
    pub require_entry_crossover: bool,
    /// Dual mode only: fetch one series (the longer lookback) and compute both
    /// averages over it instead of fetching each leg separately.
    pub shared_series: bool,
}

impl StrategyConfig {
    /// A stable identifier for logs and events (e.g., "AAPL_15m_60m_dual_ma").
    pub fn id(&self) -> String {
        match (&self.variant, &self.secondary) {
            (Variant::DualMa, Some(secondary)) => format!(
                "{}_{}_{}_dual_ma",
                self.symbol, self.primary.period, secondary.period
            ),
            _ => format!("{}_{}_single_ma", self.symbol, self.primary.period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config(variant: Variant, secondary: Option<&str>) -> StrategyConfig {
        StrategyConfig {
            symbol: Symbol("ETH-USD".to_string()),
            capital: dec!(500),
            variant,
            primary: MaLeg::from_period(PeriodSpec::parse("15min").unwrap()),
            secondary: secondary.map(|t| MaLeg::from_period(PeriodSpec::parse(t).unwrap())),
            poll_interval: Duration::from_secs(300),
            exit_action: ExitAction::default(),
            require_entry_crossover: true,
            shared_series: false,
        }
    }

    #[test]
    fn leg_resolution_follows_canonical_token() {
        let leg = MaLeg::from_period(PeriodSpec::parse("15min").unwrap());
        assert_eq!(leg.resolution, Resolution("15m".to_string()));
    }

    #[test]
    fn id_names_every_configured_period() {
        assert_eq!(config(Variant::SingleMa, None).id(), "ETH-USD_15m_single_ma");
        assert_eq!(
            config(Variant::DualMa, Some("60m")).id(),
            "ETH-USD_15m_60m_dual_ma"
        );
    }
}
