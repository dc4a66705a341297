//! Scripted collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cactus_config::EngineConfig;
use tokio::time::Instant;

use crate::assets::AssetFetcher;
use crate::engine::{EngineBackend, EngineHandle, TokenCallback};
use crate::remote::RemoteEmbedder;
use crate::telemetry::{TelemetryError, TelemetryRecord, TelemetrySink};
use crate::{
    BackendError, CompletionParams, CompletionResult, EmbeddingParams, EmbeddingResult, Message,
    ProgressCallback,
};

/// Everything the fake engine observed, shared between backend and handles.
#[derive(Default)]
pub(crate) struct EngineLog {
    pub bring_ups: Mutex<Vec<(EngineConfig, Instant)>>,
    pub completions: Mutex<Vec<Vec<Message>>>,
    pub replies: Mutex<VecDeque<Result<String, BackendError>>>,
    pub embed_result: Mutex<Option<Result<Vec<f32>, BackendError>>>,
    pub embed_delay: Mutex<Option<Duration>>,
    pub rewind_failures: AtomicUsize,
    pub rewinds: AtomicUsize,
    pub releases: AtomicUsize,
}

impl EngineLog {
    pub fn bring_up_count(&self) -> usize {
        self.bring_ups.lock().unwrap().len()
    }

    pub fn bring_up_configs(&self) -> Vec<EngineConfig> {
        self.bring_ups
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// Gaps between consecutive bring-up calls.
    pub fn bring_up_gaps(&self) -> Vec<Duration> {
        let calls = self.bring_ups.lock().unwrap();
        calls.windows(2).map(|w| w[1].1 - w[0].1).collect()
    }

    pub fn sent(&self) -> Vec<Vec<Message>> {
        self.completions.lock().unwrap().clone()
    }

    pub fn queue_reply(&self, reply: Result<&str, BackendError>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(reply.map(str::to_string));
    }

    pub fn set_embedding(&self, result: Result<Vec<f32>, BackendError>) {
        *self.embed_result.lock().unwrap() = Some(result);
    }
}

/// Engine backend whose bring-up outcomes follow a script.
///
/// Each call pops the next scripted outcome; once the script is empty
/// every bring-up succeeds.
pub(crate) struct ScriptedBackend {
    script: Mutex<VecDeque<Result<(), BackendError>>>,
    pub log: Arc<EngineLog>,
}

impl ScriptedBackend {
    pub fn new(script: impl IntoIterator<Item = Result<(), BackendError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            log: Arc::new(EngineLog::default()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new([])
    }

    pub fn failing_times(n: usize) -> Self {
        Self::new((0..n).map(|i| Err(BackendError::BringUp(format!("failure {}", i + 1)))))
    }
}

#[async_trait]
impl EngineBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn bring_up(
        &self,
        config: &EngineConfig,
        on_progress: ProgressCallback,
    ) -> Result<Box<dyn EngineHandle>, BackendError> {
        self.log
            .bring_ups
            .lock()
            .unwrap()
            .push((config.clone(), Instant::now()));

        let outcome = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        outcome?;
        on_progress(1.0, "model");
        Ok(Box::new(FakeHandle {
            log: self.log.clone(),
        }))
    }
}

pub(crate) struct FakeHandle {
    log: Arc<EngineLog>,
}

#[async_trait]
impl EngineHandle for FakeHandle {
    async fn complete(
        &self,
        messages: &[Message],
        _params: &CompletionParams,
        on_token: TokenCallback,
    ) -> Result<CompletionResult, BackendError> {
        self.log.completions.lock().unwrap().push(messages.to_vec());
        let reply = self
            .log
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))?;
        for (i, word) in reply.split(' ').enumerate() {
            let token = if i == 0 {
                word.to_string()
            } else {
                format!(" {word}")
            };
            on_token(token);
        }
        Ok(CompletionResult { content: reply })
    }

    async fn embed(
        &self,
        _text: &str,
        _params: &EmbeddingParams,
    ) -> Result<EmbeddingResult, BackendError> {
        let delay = *self.log.embed_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = self
            .log
            .embed_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(vec![0.1, 0.2, 0.3]));
        result.map(|embedding| EmbeddingResult { embedding })
    }

    async fn rewind(&self) -> Result<(), BackendError> {
        self.log.rewinds.fetch_add(1, Ordering::SeqCst);
        let pending = self.log.rewind_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.log.rewind_failures.store(pending - 1, Ordering::SeqCst);
            return Err(BackendError::Engine("rewind failed".into()));
        }
        Ok(())
    }

    async fn release(&self) -> Result<(), BackendError> {
        self.log.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Telemetry sink that keeps every record, optionally refusing them.
#[derive(Default)]
pub(crate) struct RecordingTelemetry {
    pub records: Mutex<Vec<TelemetryRecord>>,
    pub fail: bool,
}

impl RecordingTelemetry {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn report(&self, record: TelemetryRecord) -> Result<(), TelemetryError> {
        self.records.lock().unwrap().push(record);
        if self.fail {
            return Err(TelemetryError::Unavailable("offline".into()));
        }
        Ok(())
    }
}

pub(crate) struct FakeRemote {
    pub result: Result<Vec<f32>, BackendError>,
    pub calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new(result: Result<Vec<f32>, BackendError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RemoteEmbedder for FakeRemote {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Fetcher that maps URLs to paths after a fixed delay.
pub(crate) struct FakeFetcher {
    pub paths: HashMap<String, PathBuf>,
    pub delay: Duration,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new(entries: &[(&str, &str)], delay: Duration) -> Self {
        Self {
            paths: entries
                .iter()
                .map(|(url, path)| (url.to_string(), PathBuf::from(path)))
                .collect(),
            delay,
            fetched: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch_to_local(
        &self,
        url: &str,
        on_progress: ProgressCallback,
    ) -> Result<PathBuf, BackendError> {
        on_progress(0.0, url);
        tokio::time::sleep(self.delay).await;
        self.fetched.lock().unwrap().push(url.to_string());
        let path = self
            .paths
            .get(url)
            .cloned()
            .ok_or_else(|| BackendError::Network(format!("404 for {url}")))?;
        on_progress(1.0, url);
        Ok(path)
    }
}
