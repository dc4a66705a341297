//! Validation for the retry, remote and assets sections.

use crate::schema::CactusConfig;

use super::helpers::{validate_http_url, validate_range};

pub(crate) fn validate_retry(errors: &mut Vec<String>, config: &CactusConfig) {
    validate_range(errors, "retry.max_attempts", config.retry.max_attempts, 1, 10);
    validate_range(
        errors,
        "retry.base_delay_ms",
        config.retry.base_delay_ms,
        0,
        60_000,
    );
}

pub(crate) fn validate_remote(errors: &mut Vec<String>, config: &CactusConfig) {
    let remote = &config.remote;
    if remote.is_configured() {
        validate_http_url(errors, "remote.endpoint", &remote.endpoint);
    }
    validate_range(errors, "remote.timeout_secs", remote.timeout_secs, 1, 600);
}

/// URL schemes are left to the fetcher; only blank values are rejected.
pub(crate) fn validate_assets(errors: &mut Vec<String>, config: &CactusConfig) {
    let assets = &config.assets;
    for (name, url) in [
        ("assets.model_url", &assets.model_url),
        ("assets.mmproj_url", &assets.mmproj_url),
    ] {
        if url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            errors.push(format!("{name} must not be blank when set"));
        }
    }
}
