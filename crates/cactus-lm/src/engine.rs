//! Inference engine capability traits.
//!
//! The engine itself (weights, tokenizer, sampling) lives outside this
//! crate. It is reached through two traits: [`EngineBackend`] brings an
//! engine up from an [`EngineConfig`], and the resulting [`EngineHandle`]
//! serves completions and embeddings until it is released.

use async_trait::async_trait;
use cactus_config::EngineConfig;

use crate::{
    BackendError, CompletionParams, CompletionResult, EmbeddingParams, EmbeddingResult, Message,
    ProgressCallback,
};

/// Receives each generated token as it is produced.
pub type TokenCallback = Box<dyn Fn(String) + Send + Sync>;

/// Factory for live engine instances.
#[async_trait]
pub trait EngineBackend: Send + Sync {
    /// Name used in logs and telemetry (e.g. `"llama.cpp"`).
    fn name(&self) -> &str;

    /// Load the model described by `config`.
    ///
    /// May report load progress through `on_progress` zero or more times.
    async fn bring_up(
        &self,
        config: &EngineConfig,
        on_progress: ProgressCallback,
    ) -> Result<Box<dyn EngineHandle>, BackendError>;
}

/// One live engine instance.
///
/// The engine keeps its own incremental context: `complete` receives only
/// messages it has not seen yet, and `rewind` drops everything it has seen.
/// Only one request may be in flight at a time.
#[async_trait]
pub trait EngineHandle: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        params: &CompletionParams,
        on_token: TokenCallback,
    ) -> Result<CompletionResult, BackendError>;

    async fn embed(
        &self,
        text: &str,
        params: &EmbeddingParams,
    ) -> Result<EmbeddingResult, BackendError>;

    /// Clear the engine-side conversation context.
    async fn rewind(&self) -> Result<(), BackendError>;

    /// Free the engine. Called exactly once; the handle is dropped afterwards.
    async fn release(&self) -> Result<(), BackendError>;
}
