// In crates/app-config/src/lib.rs

use config::{Config, Environment, File, FileFormat};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, FeedSettings, Settings, StrategySettings, VariantSetting};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name("config/base"))
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        .add_source(environment_overrides())
        .build()?;

    let settings: Settings = settings.try_deserialize()?;

    Ok(settings)
}

/// `APP__` variables, nested with `__` (e.g. `APP__PAPER__INITIAL_CASH=5000`).
fn environment_overrides() -> Environment {
    Environment::with_prefix("APP").separator("__")
}

/// Parses settings from a single TOML document, without any other layer.
pub fn load_settings_from_str(toml: &str) -> Result<Settings> {
    let settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?;

    Ok(settings.try_deserialize()?)
}
