use std::sync::atomic::{AtomicU64, Ordering};

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Meter};
use pulselog_core::level::Level;

/// Counters the emitter reports into.
pub trait EmitMetrics: Send + Sync {
    fn record_emitted(&self, level: Level);
    fn record_sink_failure(&self);
}

#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    emitted: [AtomicU64; Level::ALL.len()],
    sink_failures: AtomicU64,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self, level: Level) -> u64 {
        self.emitted[slot(level)].load(Ordering::Relaxed)
    }

    pub fn emitted_total(&self) -> u64 {
        self.emitted.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }
}

impl EmitMetrics for InMemoryMetrics {
    fn record_emitted(&self, level: Level) {
        self.emitted[slot(level)].fetch_add(1, Ordering::Relaxed);
    }

    fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }
}

fn slot(level: Level) -> usize {
    Level::ALL.iter().position(|l| *l == level).unwrap_or(0)
}

/// OpenTelemetry-backed counters: `pulselog.events.emitted{log.level}` and
/// `pulselog.sink.failures`.
pub struct OtelMetrics {
    emitted: Counter<u64>,
    sink_failures: Counter<u64>,
}

impl OtelMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            emitted: meter
                .u64_counter("pulselog.events.emitted")
                .with_description("Log events emitted, by level")
                .build(),
            sink_failures: meter
                .u64_counter("pulselog.sink.failures")
                .with_description("Telemetry sink hand-offs that returned an error")
                .build(),
        }
    }
}

impl EmitMetrics for OtelMetrics {
    fn record_emitted(&self, level: Level) {
        self.emitted
            .add(1, &[KeyValue::new("log.level", level.as_str())]);
    }

    fn record_sink_failure(&self) {
        self.sink_failures.add(1, &[]);
    }
}
