//! Inference engine configuration types.

use serde::{Deserialize, Serialize};

/// Parameters handed to the engine's bring-up call.
///
/// The initialization orchestrator derives degraded variants of this
/// (for example with hardware offload disabled) when bring-up fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path or reference to the model weights.
    pub model: String,
    /// Optional multimodal projector weights.
    pub mmproj: Option<String>,
    /// Context window in tokens.
    pub n_ctx: u32,
    pub n_batch: u32,
    /// Layers offloaded to the accelerator. Zero means CPU only.
    pub n_gpu_layers: u32,
    pub n_threads: u32,
    /// Load the model in embedding mode.
    pub embedding: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            mmproj: None,
            n_ctx: 2048,
            n_batch: 32,
            n_gpu_layers: 99,
            n_threads: 4,
            embedding: false,
        }
    }
}

impl EngineConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_mmproj(mut self, mmproj: impl Into<String>) -> Self {
        self.mmproj = Some(mmproj.into());
        self
    }

    pub fn with_n_ctx(mut self, n_ctx: u32) -> Self {
        self.n_ctx = n_ctx;
        self
    }

    pub fn with_gpu_layers(mut self, n_gpu_layers: u32) -> Self {
        self.n_gpu_layers = n_gpu_layers;
        self
    }

    pub fn with_threads(mut self, n_threads: u32) -> Self {
        self.n_threads = n_threads;
        self
    }

    /// Same configuration with accelerator offload disabled.
    pub fn cpu_only(&self) -> Self {
        Self {
            n_gpu_layers: 0,
            ..self.clone()
        }
    }
}
