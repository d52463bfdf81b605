use crate::{Strategy, ma_crossover::MACrossover, price_vs_ma::PriceVsMa};
use core_types::{StrategyConfig, Variant};

/// Creates the strategy instance a run's configuration calls for.
pub fn create_strategy(config: &StrategyConfig) -> Box<dyn Strategy + Send + Sync> {
    match config.variant {
        Variant::SingleMa => Box::new(PriceVsMa::new()),
        Variant::DualMa => Box::new(MACrossover::new(config.require_entry_crossover)),
    }
}
