//! Configuration schema types for Cactus.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod engine;
mod remote;
mod retry;
mod system;

pub use engine::*;
pub use remote::*;
pub use retry::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for a Cactus session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CactusConfig {
    pub engine: EngineConfig,
    pub retry: RetryConfig,
    pub routing: RoutingConfig,
    pub remote: RemoteConfig,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,
}
