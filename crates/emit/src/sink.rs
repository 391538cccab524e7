use chrono::{DateTime, Utc};
use pulselog_core::Result;
use pulselog_core::level::Severity;

use crate::attrs::Attributes;

/// Record handed to the external telemetry pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub body: String,
    pub severity: Severity,
    pub attributes: Attributes,
    pub timestamp: DateTime<Utc>,
}

/// External log pipeline. Implementations enqueue and return; batching,
/// delivery and retries are their own business.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, record: TelemetryRecord) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn emit(&self, _record: TelemetryRecord) -> Result<()> {
        Ok(())
    }
}
