//! Engine bring-up with retry, backoff and degraded fallbacks.
//!
//! Bring-up can fail for transient reasons (memory pressure, a busy
//! accelerator) or because a configuration does not work on this device
//! (for example a GPU backend that crashes on load). The orchestrator
//! handles both: every configuration candidate is retried with
//! exponential backoff, and when a candidate runs out of attempts the
//! next, more conservative one is tried.
//!
//! ```text
//! candidate 1 (as configured)   attempt 1 ── d ── attempt 2 ── 2d ── attempt 3
//!                                                                       │
//! candidate 2 (n_gpu_layers=0)  attempt 1 ── d ── attempt 2 ── 2d ── attempt 3 ──▶ InitializationFailure
//! ```

use std::sync::Arc;
use std::time::Duration;

use cactus_config::{EngineConfig, RetryConfig};
use tracing::{debug, info, warn};

use crate::engine::{EngineBackend, EngineHandle};
use crate::telemetry::{TelemetryRecord, TelemetrySink, TracingTelemetry};
use crate::{BackendError, ProgressCallback, SessionError};

/// How many times each candidate is tried and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Result<Self, SessionError> {
        if max_attempts == 0 {
            return Err(SessionError::InvalidConfig(
                "retry policy needs at least one attempt".into(),
            ));
        }
        Ok(Self {
            max_attempts,
            base_delay,
        })
    }

    pub fn from_config(config: &RetryConfig) -> Result<Self, SessionError> {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay between attempt `attempt` and `attempt + 1`: `base_delay * 2^(attempt - 1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Every candidate ran out of attempts.
///
/// Carries the most recent error and the configuration that produced it.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "engine initialization failed after {attempts} attempts \
     (model '{model}', n_ctx {n_ctx}, n_gpu_layers {n_gpu_layers}): {last_error}"
)]
pub struct InitializationFailure {
    #[source]
    pub last_error: BackendError,
    pub model: String,
    pub n_ctx: u32,
    pub n_gpu_layers: u32,
    pub attempts: u32,
}

/// The configured engine followed by the same engine with accelerator offload disabled.
pub fn default_candidates(base: &EngineConfig) -> Vec<EngineConfig> {
    vec![base.clone(), base.cpu_only()]
}

/// Brings an engine online, degrading the configuration when needed.
pub struct InitializationOrchestrator {
    backend: Arc<dyn EngineBackend>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl InitializationOrchestrator {
    pub fn new(backend: Arc<dyn EngineBackend>) -> Self {
        Self {
            backend,
            telemetry: Arc::new(TracingTelemetry),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Bring up `base`, falling back to [`default_candidates`] variants.
    pub async fn init(
        &self,
        base: &EngineConfig,
        policy: &RetryPolicy,
        on_progress: ProgressCallback,
    ) -> Result<Box<dyn EngineHandle>, SessionError> {
        self.init_candidates(&default_candidates(base), policy, on_progress)
            .await
    }

    /// Try each candidate in order, `policy.max_attempts()` times each.
    ///
    /// The first successful bring-up wins; no further candidates are tried.
    pub async fn init_candidates(
        &self,
        candidates: &[EngineConfig],
        policy: &RetryPolicy,
        on_progress: ProgressCallback,
    ) -> Result<Box<dyn EngineHandle>, SessionError> {
        if candidates.is_empty() {
            return Err(SessionError::InvalidConfig(
                "no engine configuration candidates".into(),
            ));
        }

        let mut attempts = 0u32;
        let mut last_failure: Option<(BackendError, &EngineConfig)> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            for attempt in 1..=policy.max_attempts() {
                attempts += 1;
                debug!(
                    backend = %self.backend.name(),
                    candidate = index,
                    attempt,
                    model = %candidate.model,
                    n_gpu_layers = candidate.n_gpu_layers,
                    "engine bring-up"
                );

                match self.backend.bring_up(candidate, on_progress.clone()).await {
                    Ok(handle) => {
                        info!(
                            candidate = index,
                            attempt,
                            total_attempts = attempts,
                            n_gpu_layers = candidate.n_gpu_layers,
                            "engine ready"
                        );
                        return Ok(handle);
                    }
                    Err(e) => {
                        warn!(candidate = index, attempt, "engine bring-up failed: {e}");
                        self.report(&e, candidate, index, attempt);

                        if attempt < policy.max_attempts() {
                            tokio::time::sleep(policy.delay_for(attempt)).await;
                        }
                        last_failure = Some((e, candidate));
                    }
                }
            }

            if index + 1 < candidates.len() {
                warn!(
                    candidate = index,
                    "candidate exhausted its attempts, degrading configuration"
                );
            }
        }

        let (last_error, candidate) = last_failure.ok_or_else(|| {
            SessionError::InvalidConfig("retry policy allowed no attempts".into())
        })?;
        Err(InitializationFailure {
            last_error,
            model: candidate.model.clone(),
            n_ctx: candidate.n_ctx,
            n_gpu_layers: candidate.n_gpu_layers,
            attempts,
        }
        .into())
    }

    fn report(&self, error: &BackendError, config: &EngineConfig, candidate: usize, attempt: u32) {
        let record = TelemetryRecord::new(error)
            .with_field("model", config.model.as_str())
            .with_field("n_ctx", config.n_ctx)
            .with_field("n_gpu_layers", config.n_gpu_layers)
            .with_field("candidate", candidate)
            .with_field("attempt", attempt);

        if let Err(e) = self.telemetry.report(record) {
            debug!("telemetry report dropped: {e}");
        }
    }
}
