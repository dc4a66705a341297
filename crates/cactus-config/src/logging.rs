//! Tracing subscriber bootstrap driven by `[logging]`.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::schema::LoggingConfig;

/// Directive applied on top of `RUST_LOG` for the given config.
pub fn directive_for(config: &LoggingConfig) -> String {
    match config.directive.as_deref() {
        Some(d) if !d.trim().is_empty() => d.trim().to_string(),
        _ => format!("cactus={}", config.level.as_str()),
    }
}

/// Install a global `fmt` subscriber.
///
/// Returns `false` if a global subscriber was already installed (for
/// example by the host application or an earlier call).
pub fn init_logging(config: &LoggingConfig) -> bool {
    let directive = directive_for(config);
    let fallback = format!("cactus={}", config.level.as_str());

    let filter = match directive.parse() {
        Ok(d) => EnvFilter::from_default_env().add_directive(d),
        Err(e) => {
            eprintln!("invalid log directive '{directive}': {e}, using '{fallback}'");
            EnvFilter::from_default_env().add_directive(
                fallback
                    .parse()
                    .unwrap_or_else(|_| LevelFilter::INFO.into()),
            )
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
