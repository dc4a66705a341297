//! Session struct, lifecycle and configuration.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use cactus_common::{RoutingMode, SessionId};
use cactus_config::{validation, CactusConfig, EngineConfig};
use tracing::{info, warn};

use crate::assets::{resolve_assets, AssetFetcher};
use crate::engine::EngineBackend;
use crate::history::ConversationHistoryManager;
use crate::orchestrator::{InitializationOrchestrator, RetryPolicy};
use crate::remote::{RemoteEmbedder, RemoteEmbeddingClient};
use crate::router::RequestRouter;
use crate::telemetry::TelemetrySink;
use crate::{ProgressCallback, SessionError};

use super::state::{SessionState, SessionStatus};

/// An inference session bound to at most one live engine.
pub struct Session {
    pub(super) id: SessionId,
    pub(super) state: SessionState,
    /// Messages the engine has consumed, in order.
    pub(super) history: ConversationHistoryManager,
    pub(super) orchestrator: InitializationOrchestrator,
    pub(super) router: RequestRouter,
    /// Default mode chosen by the caller; config does not override it.
    pub(super) mode_pinned: bool,
    pub(super) remote: Option<Arc<dyn RemoteEmbedder>>,
    /// Set while an embedding request is in flight.
    pub(super) busy: AtomicBool,
}

impl Session {
    pub fn new(backend: Arc<dyn EngineBackend>) -> Self {
        Self {
            id: SessionId::new(),
            state: SessionState::Uninitialized,
            history: ConversationHistoryManager::new(),
            orchestrator: InitializationOrchestrator::new(backend),
            router: RequestRouter::default(),
            mode_pinned: false,
            remote: None,
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_remote_embedder(mut self, remote: Arc<dyn RemoteEmbedder>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.orchestrator = self.orchestrator.with_telemetry(telemetry);
        self
    }

    pub fn with_default_mode(mut self, mode: RoutingMode) -> Self {
        self.router.set_default_mode(mode);
        self.mode_pinned = true;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn is_ready(&self) -> bool {
        self.status() == SessionStatus::Ready
    }

    pub fn default_mode(&self) -> RoutingMode {
        self.router.default_mode()
    }

    pub fn history(&self) -> &ConversationHistoryManager {
        &self.history
    }

    fn ensure_uninitialized(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Uninitialized => Ok(()),
            SessionState::Ready(_) => Err(SessionError::AlreadyInitialized),
            SessionState::Released => Err(SessionError::NotInitialized),
        }
    }

    /// Bring the engine up with retries and degraded fallbacks.
    pub async fn init(
        &mut self,
        config: &EngineConfig,
        on_progress: ProgressCallback,
        policy: &RetryPolicy,
    ) -> Result<(), SessionError> {
        self.ensure_uninitialized()?;
        info!(
            session = %self.id.short(),
            backend = %self.orchestrator.backend_name(),
            model = %config.model,
            "initializing session"
        );

        let handle = self.orchestrator.init(config, policy, on_progress).await?;
        self.state = SessionState::Ready(handle);
        self.history = ConversationHistoryManager::new();
        info!(session = %self.id.short(), "session ready");
        Ok(())
    }

    /// Initialize from a loaded configuration.
    ///
    /// Validates `config`, fetches configured assets concurrently, applies
    /// the routing and remote sections, then runs [`init`](Self::init).
    ///
    /// A default mode set with [`with_default_mode`](Self::with_default_mode)
    /// and an embedder set with [`with_remote_embedder`](Self::with_remote_embedder)
    /// take precedence over `[routing]` and `[remote]`.
    pub async fn init_from_config(
        &mut self,
        config: &CactusConfig,
        fetcher: &dyn AssetFetcher,
        on_progress: ProgressCallback,
    ) -> Result<(), SessionError> {
        self.ensure_uninitialized()?;
        validation::validate(config)?;
        let policy = RetryPolicy::from_config(&config.retry)?;

        let engine = resolve_assets(&config.engine, &config.assets, fetcher, on_progress.clone())
            .await
            .map_err(SessionError::Asset)?;
        if engine.model.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "engine.model is empty and assets.model_url is not set".into(),
            ));
        }

        if !self.mode_pinned {
            self.router.set_default_mode(config.routing.embedding_mode);
        }
        if self.remote.is_none() && config.remote.is_configured() {
            self.remote = Some(Arc::new(RemoteEmbeddingClient::new(config.remote.clone())?));
        }

        self.init(&engine, on_progress, &policy).await
    }

    /// Clear both the engine context and the tracked history.
    pub async fn rewind(&mut self) -> Result<(), SessionError> {
        let handle = self.state.handle()?;
        if let Err(e) = handle.rewind().await {
            self.history.invalidate();
            return Err(SessionError::Engine(e));
        }
        self.history.reset();
        Ok(())
    }

    /// Free the engine. The session cannot be used afterwards.
    pub async fn release(&mut self) -> Result<(), SessionError> {
        let handle = match std::mem::replace(&mut self.state, SessionState::Released) {
            SessionState::Ready(handle) => handle,
            previous => {
                self.state = previous;
                return Err(SessionError::NotInitialized);
            }
        };

        self.history.reset();
        info!(session = %self.id.short(), "releasing engine");
        if let Err(e) = handle.release().await {
            warn!(session = %self.id.short(), "engine release reported an error: {e}");
            return Err(SessionError::Engine(e));
        }
        Ok(())
    }
}
