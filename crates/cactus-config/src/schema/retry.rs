//! Bring-up retry and request routing configuration types.

use cactus_common::RoutingMode;
use serde::{Deserialize, Serialize};

/// Retry policy for engine bring-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per configuration candidate (valid range: 1-10).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry
    /// (valid range: 0-60000 ms).
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Routing defaults for requests that can be served locally or remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub embedding_mode: RoutingMode,
}
