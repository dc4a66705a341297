//! Full configuration validation.
//!
//! Each section has its own validator; this collects every error into a
//! single `ConfigError` so a user sees all problems at once.

mod engine;
mod helpers;
mod misc;


use crate::schema::CactusConfig;
use cactus_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &CactusConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    engine::validate_engine(&mut errors, config);
    misc::validate_retry(&mut errors, config);
    misc::validate_remote(&mut errors, config);
    misc::validate_assets(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
