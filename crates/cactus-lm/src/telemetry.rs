//! Error telemetry.
//!
//! Failures worth shipping off-device are packaged as a [`TelemetryRecord`]
//! and handed to a [`TelemetrySink`]. Reporting is best-effort: a sink
//! error is logged and never changes the caller's control flow.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// One reported failure with its context fields.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub error: String,
    pub context: BTreeMap<String, serde_json::Value>,
}

impl TelemetryRecord {
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            id: cactus_common::new_correlation_id(),
            timestamp: Utc::now(),
            error: error.to_string(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("telemetry sink unavailable: {0}")]
    Unavailable(String),
    #[error("telemetry serialization failed: {0}")]
    Serialize(String),
}

/// Fire-and-forget destination for telemetry records.
pub trait TelemetrySink: Send + Sync {
    fn report(&self, record: TelemetryRecord) -> Result<(), TelemetryError>;
}

/// Emits each record as a structured `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn report(&self, record: TelemetryRecord) -> Result<(), TelemetryError> {
        let context = serde_json::to_string(&record.context)
            .map_err(|e| TelemetryError::Serialize(e.to_string()))?;
        warn!(
            id = %record.id,
            error = %record.error,
            context = %context,
            "telemetry"
        );
        Ok(())
    }
}

/// Drops every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn report(&self, _record: TelemetryRecord) -> Result<(), TelemetryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_collects_fields() {
        let record = TelemetryRecord::new("bring-up failed: no metal device")
            .with_field("model", "smol.gguf")
            .with_field("n_ctx", 2048)
            .with_field("mmproj", serde_json::Value::Null);
        assert_eq!(record.error, "bring-up failed: no metal device");
        assert_eq!(record.context["model"], "smol.gguf");
        assert_eq!(record.context["n_ctx"], 2048);
        assert!(record.context["mmproj"].is_null());
        assert_eq!(record.id.len(), 8);
    }

    #[test]
    fn record_serializes() {
        let record = TelemetryRecord::new("boom").with_field("attempt", 2);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["error"], "boom");
        assert_eq!(json["context"]["attempt"], 2);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn builtin_sinks_accept_records() {
        assert!(TracingTelemetry.report(TelemetryRecord::new("x")).is_ok());
        assert!(NoopTelemetry.report(TelemetryRecord::new("x")).is_ok());
    }
}
