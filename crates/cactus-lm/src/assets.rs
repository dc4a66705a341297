//! Model asset acquisition.
//!
//! Downloading and caching are the fetcher's business; this module only
//! runs the fetches concurrently and wires the resulting paths into an
//! [`EngineConfig`].

use std::path::PathBuf;

use async_trait::async_trait;
use cactus_config::{AssetsConfig, EngineConfig};
use futures_util::future::try_join_all;
use tracing::info;

use crate::{BackendError, ProgressCallback};

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Make `url` available on local storage and return its path.
    async fn fetch_to_local(
        &self,
        url: &str,
        on_progress: ProgressCallback,
    ) -> Result<PathBuf, BackendError>;
}

/// Fetch every URL concurrently. Paths come back in request order.
pub async fn fetch_all(
    fetcher: &dyn AssetFetcher,
    urls: &[&str],
    on_progress: ProgressCallback,
) -> Result<Vec<PathBuf>, BackendError> {
    try_join_all(
        urls.iter()
            .map(|url| fetcher.fetch_to_local(url, on_progress.clone())),
    )
    .await
}

/// Fetch the configured model and projector and point `engine` at them.
///
/// Fields without a configured URL keep the value from `engine`.
pub async fn resolve_assets(
    engine: &EngineConfig,
    assets: &AssetsConfig,
    fetcher: &dyn AssetFetcher,
    on_progress: ProgressCallback,
) -> Result<EngineConfig, BackendError> {
    let urls: Vec<&str> = [assets.model_url.as_deref(), assets.mmproj_url.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if urls.is_empty() {
        return Ok(engine.clone());
    }

    let mut paths = fetch_all(fetcher, &urls, on_progress).await?.into_iter();
    let mut resolved = engine.clone();
    if assets.model_url.is_some() {
        if let Some(path) = paths.next() {
            resolved.model = path.to_string_lossy().into_owned();
        }
    }
    if assets.mmproj_url.is_some() {
        if let Some(path) = paths.next() {
            resolved.mmproj = Some(path.to_string_lossy().into_owned());
        }
    }
    info!(model = %resolved.model, mmproj = ?resolved.mmproj, "assets resolved");
    Ok(resolved)
}
