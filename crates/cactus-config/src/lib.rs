//! Cactus configuration system.
//!
//! TOML-based configuration for the inference session layer: engine
//! parameters, retry policy, routing defaults, remote embedding endpoint,
//! model assets and logging. All sections use sensible defaults so
//! partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cactus_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod logging;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use logging::init_logging;
pub use schema::{
    AssetsConfig, CactusConfig, EngineConfig, LogLevel, LoggingConfig, RemoteConfig, RetryConfig,
    RoutingConfig, CONFIG_SCHEMA_VERSION,
};

use cactus_common::ConfigError;

/// Load config from the platform default path and validate it.
///
/// Creates a commented default file if none exists yet.
pub fn load_config() -> Result<CactusConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &CactusConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
