use std::sync::Arc;

use chrono::Utc;
use pulselog_core::level::{Level, Severity};
use pulselog_core::model::log::{Details, LogRecord};
use pulselog_core::model::value::{ErrorValue, EventData};

use crate::attrs::{
    Attributes, LOG_LEVEL_KEY, SPAN_ID_KEY, TRACE_ID_KEY, exception_attributes, shape_attributes,
};
use crate::console::{Console, StdConsole, format_console_line};
use crate::metrics::EmitMetrics;
use crate::sink::{NoopSink, TelemetryRecord, TelemetrySink};
use crate::span::ActiveSpan;

const EMPTY_MESSAGE: &str = "(no message)";

/// Builds log records and sends each one to the telemetry sink, the local
/// console and, when given, the active span.
#[derive(Clone)]
pub struct Emitter {
    sink: Arc<dyn TelemetrySink>,
    console: Arc<dyn Console>,
    metrics: Option<Arc<dyn EmitMetrics>>,
    source: Option<String>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(Arc::new(NoopSink), Arc::new(StdConsole::new()))
    }
}

impl Emitter {
    pub fn new(sink: Arc<dyn TelemetrySink>, console: Arc<dyn Console>) -> Self {
        Self {
            sink,
            console,
            metrics: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn EmitMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn emit(
        &self,
        level: Level,
        message: &str,
        data: Option<&EventData>,
        span: Option<&dyn ActiveSpan>,
    ) -> LogRecord {
        self.emit_tagged(level, level.as_str(), message, data, span)
    }

    /// Emits with a free-form level. Unknown levels are treated as `info`
    /// but keep their literal text in `log.level` and the console tag.
    pub fn emit_raw(
        &self,
        level: &str,
        message: &str,
        data: Option<&EventData>,
        span: Option<&dyn ActiveSpan>,
    ) -> LogRecord {
        match level.parse::<Level>() {
            Ok(parsed) => self.emit(parsed, message, data, span),
            Err(_) => {
                tracing::warn!(raw_level = level, "unrecognized log level, treating as info");
                self.emit_tagged(Level::Info, level, message, data, span)
            }
        }
    }

    fn emit_tagged(
        &self,
        level: Level,
        tag: &str,
        message: &str,
        data: Option<&EventData>,
        span: Option<&dyn ActiveSpan>,
    ) -> LogRecord {
        let timestamp = Utc::now();
        let message = if message.trim().is_empty() {
            EMPTY_MESSAGE
        } else {
            message
        };

        let correlation = span
            .and_then(|s| s.correlation())
            .filter(|c| !c.trace_id.is_unset());

        let mut attributes = data.map(shape_attributes).unwrap_or_default();
        attributes.insert(LOG_LEVEL_KEY.to_string(), tag.to_string());
        if let Some(c) = &correlation {
            attributes.insert(TRACE_ID_KEY.to_string(), c.trace_id.as_str().to_string());
            attributes.insert(SPAN_ID_KEY.to_string(), c.span_id.as_str().to_string());
        }

        let outcome = self.sink.emit(TelemetryRecord {
            body: message.to_string(),
            severity: Severity::for_level(level),
            attributes: attributes.clone(),
            timestamp,
        });
        if let Err(err) = outcome {
            tracing::debug!(error = %err, "telemetry sink rejected record");
            if let Some(m) = &self.metrics {
                m.record_sink_failure();
            }
        }

        let line = format_console_line(timestamp, tag, message);
        let payload = data.filter(|d| !d.is_empty()).map(EventData::to_json);
        self.console.write(level.family(), &line, payload.as_ref());

        if let Some(span) = span {
            annotate_span(span, level, tag, message, data, &attributes);
        }

        if let Some(m) = &self.metrics {
            m.record_emitted(level);
        }

        LogRecord {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            level,
            message: message.to_string(),
            source: self.source.clone(),
            details: data.cloned().map(Details::Fields),
            correlation,
        }
    }
}

fn annotate_span(
    span: &dyn ActiveSpan,
    level: Level,
    tag: &str,
    message: &str,
    data: Option<&EventData>,
    attributes: &Attributes,
) {
    if level == Level::Error {
        span.set_error_status(message);
        let exception = data
            .and_then(EventData::first_error)
            .cloned()
            .unwrap_or_else(|| ErrorValue::new(message));
        let exc_attrs = data.map(exception_attributes).unwrap_or_default();
        span.record_exception(&exception, &exc_attrs);
    } else {
        span.add_event(&format!("{tag}: {message}"), attributes);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pulselog_core::ids::Correlation;
    use pulselog_core::level::LevelFamily;
    use pulselog_core::{PulseError, Result};
    use serde_json::Value as Json;

    use super::*;
    use crate::metrics::InMemoryMetrics;

    #[derive(Default)]
    struct Captured {
        records: Mutex<Vec<TelemetryRecord>>,
        lines: Mutex<Vec<(LevelFamily, String, Option<Json>)>>,
    }

    struct Sink(Arc<Captured>, bool);

    impl TelemetrySink for Sink {
        fn emit(&self, record: TelemetryRecord) -> Result<()> {
            self.0.records.lock().unwrap().push(record);
            if self.1 {
                return Err(PulseError::Sink("collector down".into()));
            }
            Ok(())
        }
    }

    struct Lines(Arc<Captured>);

    impl Console for Lines {
        fn write(&self, channel: LevelFamily, line: &str, payload: Option<&Json>) {
            self.0
                .lines
                .lock()
                .unwrap()
                .push((channel, line.to_string(), payload.cloned()));
        }
    }

    #[derive(Default)]
    struct Span {
        correlation: Option<Correlation>,
        status: Mutex<Option<String>>,
        exceptions: Mutex<Vec<(ErrorValue, Attributes)>>,
        events: Mutex<Vec<String>>,
    }

    impl ActiveSpan for Span {
        fn correlation(&self) -> Option<Correlation> {
            self.correlation.clone()
        }

        fn set_error_status(&self, message: &str) {
            *self.status.lock().unwrap() = Some(message.to_string());
        }

        fn record_exception(&self, exception: &ErrorValue, attributes: &Attributes) {
            self.exceptions
                .lock()
                .unwrap()
                .push((exception.clone(), attributes.clone()));
        }

        fn add_event(&self, name: &str, _attributes: &Attributes) {
            self.events.lock().unwrap().push(name.to_string());
        }
    }

    fn emitter(failing_sink: bool) -> (Emitter, Arc<Captured>) {
        let captured = Arc::new(Captured::default());
        let emitter = Emitter::new(
            Arc::new(Sink(captured.clone(), failing_sink)),
            Arc::new(Lines(captured.clone())),
        );
        (emitter, captured)
    }

    #[test]
    fn count_becomes_string_attribute() {
        let (emitter, captured) = emitter(false);
        let data = EventData::new().with("count", 3);
        emitter.emit(Level::Warn, "queue growing", Some(&data), None);

        let records = captured.records.lock().unwrap();
        assert_eq!(records[0].attributes["count"], "3");
        assert_eq!(records[0].attributes[LOG_LEVEL_KEY], "warn");
        assert_eq!(records[0].severity, Severity::Warn);
        assert!(!records[0].attributes.contains_key(TRACE_ID_KEY));
    }

    #[test]
    fn pseudo_levels_route_to_standard_channels() {
        let (emitter, captured) = emitter(false);
        emitter.emit(Level::Delivered, "sent", None, None);
        emitter.emit(Level::Blocked, "suppressed", None, None);

        let records = captured.records.lock().unwrap();
        assert_eq!(records[0].severity, Severity::Info);
        assert_eq!(records[1].severity, Severity::Debug);
        let lines = captured.lines.lock().unwrap();
        assert_eq!(lines[0].0, LevelFamily::Info);
        assert!(lines[0].1.contains("[DELIVERED] sent"));
        assert_eq!(lines[1].0, LevelFamily::Debug);
        assert!(lines[1].2.is_none());
    }

    #[test]
    fn failing_sink_still_mirrors_to_console() {
        let (emitter, captured) = emitter(true);
        let metrics = Arc::new(InMemoryMetrics::new());
        let emitter = emitter.with_metrics(metrics.clone());
        let record = emitter.emit(Level::Error, "disk full", None, None);

        assert_eq!(record.message, "disk full");
        assert_eq!(captured.lines.lock().unwrap().len(), 1);
        assert_eq!(metrics.sink_failures(), 1);
        assert_eq!(metrics.emitted(Level::Error), 1);
    }

    #[test]
    fn zero_trace_id_is_not_injected() {
        let (emitter, captured) = emitter(false);
        let span = Span {
            correlation: Some(
                Correlation::parse("00000000000000000000000000000000", "0000000000000001")
                    .unwrap(),
            ),
            ..Span::default()
        };
        let record = emitter.emit(Level::Info, "hello", None, Some(&span));

        assert!(record.correlation.is_none());
        assert!(!captured.records.lock().unwrap()[0]
            .attributes
            .contains_key(TRACE_ID_KEY));
        assert_eq!(span.events.lock().unwrap().as_slice(), ["info: hello"]);
    }

    #[test]
    fn error_without_payload_synthesizes_exception() {
        let (emitter, _) = emitter(false);
        let span = Span::default();
        emitter.emit(Level::Error, "worker crashed", None, Some(&span));

        assert_eq!(span.status.lock().unwrap().as_deref(), Some("worker crashed"));
        let exceptions = span.exceptions.lock().unwrap();
        assert_eq!(exceptions[0].0.message, "worker crashed");
        assert!(exceptions[0].1.is_empty());
        assert!(span.events.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_raw_level_defaults_to_info_but_keeps_text() {
        let (emitter, captured) = emitter(false);
        let record = emitter.emit_raw("audit", "user exported report", None, None);

        assert_eq!(record.level, Level::Info);
        let records = captured.records.lock().unwrap();
        assert_eq!(records[0].severity, Severity::Info);
        assert_eq!(records[0].attributes[LOG_LEVEL_KEY], "audit");
        let lines = captured.lines.lock().unwrap();
        assert_eq!(lines[0].0, LevelFamily::Info);
        assert!(lines[0].1.contains("[AUDIT]"));
    }

    #[test]
    fn empty_message_is_replaced() {
        let (emitter, _) = emitter(false);
        let record = emitter.with_source("api").emit(Level::Debug, "  ", None, None);
        assert_eq!(record.message, EMPTY_MESSAGE);
        assert_eq!(record.source.as_deref(), Some("api"));
    }
}
