//! Engine section validation.

use crate::schema::CactusConfig;

use super::helpers::validate_range;

pub(crate) fn validate_engine(errors: &mut Vec<String>, config: &CactusConfig) {
    let engine = &config.engine;
    validate_range(errors, "engine.n_ctx", engine.n_ctx, 64, 131_072);
    validate_range(errors, "engine.n_batch", engine.n_batch, 1, engine.n_ctx.max(1));
    validate_range(errors, "engine.n_gpu_layers", engine.n_gpu_layers, 0, 999);
    validate_range(errors, "engine.n_threads", engine.n_threads, 1, 256);

    if engine.mmproj.as_deref().is_some_and(|p| p.trim().is_empty()) {
        errors.push("engine.mmproj must not be blank when set".to_string());
    }
}
