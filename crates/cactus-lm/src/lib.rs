//! Resilient session layer for on-device language-model inference.
//!
//! Sits between an application and an inference engine and provides:
//! - Engine bring-up with retry, exponential backoff and degraded fallbacks
//! - Conversation history tracking that sends only new messages and
//!   rewinds the engine when the caller's history diverges
//! - Local/remote routing for embeddings with configurable fallback
//! - Token streaming as ordered, typed events
//!
//! The engine, asset download, remote embedding service and telemetry
//! transport are collaborators reached through the traits in [`engine`],
//! [`assets`], [`remote`] and [`telemetry`].

pub mod assets;
pub mod engine;
pub mod history;
pub mod orchestrator;
pub mod remote;
pub mod router;
pub mod session;
pub mod streaming;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use cactus_common::{ConfigError, InvalidModeError};
use serde::{Deserialize, Serialize};

pub use assets::AssetFetcher;
pub use cactus_common::RoutingMode;
pub use cactus_config::EngineConfig;
pub use engine::{EngineBackend, EngineHandle, TokenCallback};
pub use history::{ConversationHistoryManager, Reconciliation};
pub use orchestrator::{InitializationFailure, InitializationOrchestrator, RetryPolicy};
pub use remote::{RemoteEmbedder, RemoteEmbeddingClient};
pub use router::{Backend, RequestRouter, RouteDecision, RoutingFailure};
pub use session::{Session, SessionStatus};
pub use streaming::{CompletionEvent, CompletionOutput, CompletionStats, EventSender};
pub use telemetry::{NoopTelemetry, TelemetryRecord, TelemetrySink, TracingTelemetry};

/// Progress reporter: fraction in `[0, 1]` and a label naming what is progressing.
pub type ProgressCallback = Arc<dyn Fn(f32, &str) + Send + Sync>;

/// A progress callback that discards every report.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_, _| {})
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MediaRef>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_attachment(mut self, media: impl Into<MediaRef>) -> Self {
        self.attachments.push(media.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Opaque reference to a media item (e.g. a local image path) attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediaRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MediaRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Sampling parameters forwarded untouched to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionParams {
    pub n_predict: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub penalty_repeat: Option<f32>,
    pub stop: Vec<String>,
}

impl CompletionParams {
    pub fn with_n_predict(mut self, n_predict: u32) -> Self {
        self.n_predict = Some(n_predict);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_stop(mut self, stop: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingParams {
    pub normalize: bool,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self { normalize: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub embedding: Vec<f32>,
}

/// Failure reported by a collaborator: the engine, the remote service or the asset fetcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("bring-up failed: {0}")]
    BringUp(String),
    #[error("engine error: {0}")]
    Engine(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("rate limited")]
    RateLimited,
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Initialization(#[from] InitializationFailure),
    #[error("session is not initialized")]
    NotInitialized,
    #[error("session is already initialized")]
    AlreadyInitialized,
    #[error(transparent)]
    Routing(#[from] RoutingFailure),
    #[error(transparent)]
    InvalidMode(#[from] InvalidModeError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("session is busy with another request")]
    Busy,
    #[error("engine failure: {0}")]
    Engine(#[source] BackendError),
    #[error("asset fetch failed: {0}")]
    Asset(#[source] BackendError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
