//! Remote embedding service and model asset configuration types.

use serde::{Deserialize, Serialize};

/// Remote embedding endpoint.
///
/// `token` may be left unset; the client then falls back to the
/// `CACTUS_TOKEN` environment variable.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub model: String,
    pub token: Option<String>,
    /// Request timeout in seconds (valid range: 1-600).
    pub timeout_secs: u32,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: "text-embedding-005".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty()
    }
}

/// Model files fetched before engine bring-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub model_url: Option<String>,
    pub mmproj_url: Option<String>,
}
