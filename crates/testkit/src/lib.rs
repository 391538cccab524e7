use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pulselog_core::ids::Correlation;
use pulselog_core::level::{Level, LevelFamily};
use pulselog_core::model::alert::{Alert, AlertSeverity};
use pulselog_core::model::log::{Details, LogRecord};
use pulselog_core::model::value::{ErrorValue, EventData};
use pulselog_core::{PulseError, Result};
use pulselog_emit::attrs::Attributes;
use pulselog_emit::console::Console;
use pulselog_emit::sink::{TelemetryRecord, TelemetrySink};
use pulselog_emit::span::ActiveSpan;
use serde_json::Value as Json;

pub const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";
pub const SPAN_ID: &str = "00f067aa0ba902b7";

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
}

/// Dashboard-style log stream, newest first.
pub fn sample_logs(now: DateTime<Utc>) -> Vec<LogRecord> {
    vec![
        LogRecord::new(Level::Error, "Database connection timeout", now)
            .with_id("log-1")
            .with_source("postgres")
            .with_details(Details::Fields(EventData::new().with("pool", "primary"))),
        LogRecord::new(Level::Delivered, "Alert sent to #ops", now - Duration::minutes(2))
            .with_id("log-2")
            .with_source("slack"),
        LogRecord::new(Level::Warn, "Payment retries climbing", now - Duration::minutes(20))
            .with_id("log-3")
            .with_source("payments"),
        LogRecord::new(Level::Error, "Payment gateway returned 502", now - Duration::hours(1))
            .with_id("log-4")
            .with_source("payments")
            .with_correlation(Correlation::parse(TRACE_ID, SPAN_ID).unwrap()),
        LogRecord::new(Level::Blocked, "Duplicate page suppressed", now - Duration::hours(3))
            .with_id("log-5")
            .with_source("pagerduty"),
        LogRecord::new(Level::Info, "Deploy finished", now - Duration::hours(6))
            .with_id("log-6")
            .with_details(Details::Text("version 1.4.2".into())),
        LogRecord::new(Level::Debug, "Cache warm-up stats", now - Duration::hours(12))
            .with_id("log-7")
            .with_source("cache"),
        LogRecord::new(Level::Error, "Disk usage above 95%", now - Duration::hours(30))
            .with_id("log-8")
            .with_source("node-3"),
    ]
}

pub fn sample_alerts(now: DateTime<Utc>) -> Vec<Alert> {
    vec![
        Alert {
            id: "a1".to_string(),
            timestamp: now - Duration::minutes(5),
            severity: AlertSeverity::Critical,
            title: "Payment failures".to_string(),
            description: "Error rate above 5% for checkout".to_string(),
            source: "datadog".to_string(),
            acknowledged: false,
            related_logs_query: Some("payment".to_string()),
        },
        Alert {
            id: "a2".to_string(),
            timestamp: now - Duration::hours(2),
            severity: AlertSeverity::Warning,
            title: "Slow queries".to_string(),
            description: "p95 latency above 800ms".to_string(),
            source: "datadog".to_string(),
            acknowledged: false,
            related_logs_query: Some("database".to_string()),
        },
        Alert {
            id: "a3".to_string(),
            timestamp: now - Duration::hours(8),
            severity: AlertSeverity::Critical,
            title: "Node unreachable".to_string(),
            description: "node-3 missed 5 heartbeats".to_string(),
            source: "pagerduty".to_string(),
            acknowledged: true,
            related_logs_query: None,
        },
    ]
}

/// Sink that keeps every record; optionally fails after storing.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<TelemetryRecord>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl TelemetrySink for RecordingSink {
    fn emit(&self, record: TelemetryRecord) -> Result<()> {
        self.records.lock().unwrap().push(record);
        if self.fail {
            return Err(PulseError::Sink("sink unavailable".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleLine {
    pub channel: LevelFamily,
    pub line: String,
    pub payload: Option<Json>,
}

#[derive(Default)]
pub struct RecordingConsole {
    lines: Mutex<Vec<ConsoleLine>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines.lock().unwrap().clone()
    }
}

impl Console for RecordingConsole {
    fn write(&self, channel: LevelFamily, line: &str, payload: Option<&Json>) {
        self.lines.lock().unwrap().push(ConsoleLine {
            channel,
            line: line.to_string(),
            payload: payload.cloned(),
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpanEvent {
    pub name: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedException {
    pub exception: ErrorValue,
    pub attributes: Attributes,
}

/// Span double that remembers every mutation.
#[derive(Default)]
pub struct RecordingSpan {
    correlation: Option<Correlation>,
    status: Mutex<Option<String>>,
    exceptions: Mutex<Vec<RecordedException>>,
    events: Mutex<Vec<SpanEvent>>,
}

impl RecordingSpan {
    pub fn new(trace_id: &str, span_id: &str) -> Self {
        Self {
            correlation: Some(Correlation::parse(trace_id, span_id).unwrap()),
            ..Self::default()
        }
    }

    pub fn error_status(&self) -> Option<String> {
        self.status.lock().unwrap().clone()
    }

    pub fn exceptions(&self) -> Vec<RecordedException> {
        self.exceptions.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<SpanEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ActiveSpan for RecordingSpan {
    fn correlation(&self) -> Option<Correlation> {
        self.correlation.clone()
    }

    fn set_error_status(&self, message: &str) {
        *self.status.lock().unwrap() = Some(message.to_string());
    }

    fn record_exception(&self, exception: &ErrorValue, attributes: &Attributes) {
        self.exceptions.lock().unwrap().push(RecordedException {
            exception: exception.clone(),
            attributes: attributes.clone(),
        });
    }

    fn add_event(&self, name: &str, attributes: &Attributes) {
        self.events.lock().unwrap().push(SpanEvent {
            name: name.to_string(),
            attributes: attributes.clone(),
        });
    }
}

/// Writes `items` as a pretty JSON array.
pub fn to_json_array<T: serde::Serialize>(items: &[T]) -> String {
    serde_json::to_string_pretty(items).unwrap()
}
