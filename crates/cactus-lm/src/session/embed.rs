//! Routed embeddings.

use cactus_common::RoutingMode;
use tracing::debug;

use crate::{BackendError, EmbeddingParams, EmbeddingResult, SessionError};

use super::manager::Session;
use super::state::BusyGuard;

impl Session {
    /// Embed `text` on the backend(s) selected by `mode`.
    ///
    /// `mode` is one of `local`, `remote`, `local-first`, `remote-first`.
    /// Only one embedding may be in flight per session; a concurrent call
    /// fails with [`SessionError::Busy`].
    pub async fn embedding(
        &self,
        text: &str,
        mode: &str,
        params: &EmbeddingParams,
    ) -> Result<EmbeddingResult, SessionError> {
        let mode: RoutingMode = mode.parse()?;
        self.embedding_with_mode(text, mode, params).await
    }

    /// [`embedding`](Self::embedding) using the session's default mode.
    pub async fn embedding_default(
        &self,
        text: &str,
        params: &EmbeddingParams,
    ) -> Result<EmbeddingResult, SessionError> {
        self.embedding_with_mode(text, self.router.default_mode(), params)
            .await
    }

    pub async fn embedding_with_mode(
        &self,
        text: &str,
        mode: RoutingMode,
        params: &EmbeddingParams,
    ) -> Result<EmbeddingResult, SessionError> {
        let handle = self.state.handle()?;
        let _guard = BusyGuard::acquire(&self.busy)?;
        let remote = self.remote.as_deref();

        let (embedding, decision) = self
            .router
            .route(
                mode,
                move || async move { handle.embed(text, params).await.map(|r| r.embedding) },
                move || async move {
                    match remote {
                        Some(remote) => remote.embed(text).await,
                        None => Err(BackendError::Unavailable(
                            "no remote embedder configured".into(),
                        )),
                    }
                },
            )
            .await?;

        debug!(
            session = %self.id.short(),
            %mode,
            backend = %decision.backend,
            fell_back = decision.fell_back,
            dims = embedding.len(),
            "embedding served"
        );
        Ok(EmbeddingResult { embedding })
    }
}
