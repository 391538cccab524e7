//! Adapters from the emitter's collaborator traits onto OpenTelemetry.

use std::time::SystemTime;

use opentelemetry::logs::{AnyValue, LogRecord as _, Logger, Severity as OtelSeverity};
use opentelemetry::trace::{
    SpanContext, SpanId as OtelSpanId, Status, TraceContextExt, TraceFlags, TraceId as OtelTraceId,
    TraceState, Tracer,
};
use opentelemetry::{Context, KeyValue};
use pulselog_core::ids::Correlation;
use pulselog_core::level::Severity;
use pulselog_core::model::value::ErrorValue;
use pulselog_core::{PulseError, Result};

use crate::attrs::Attributes;
use crate::sink::{TelemetryRecord, TelemetrySink};
use crate::span::ActiveSpan;

/// Hands records to an OpenTelemetry logger. The logger's processor owns
/// batching and export.
pub struct OtelLogSink<L> {
    logger: L,
}

impl<L: Logger> OtelLogSink<L> {
    pub fn new(logger: L) -> Self {
        Self { logger }
    }
}

impl<L> TelemetrySink for OtelLogSink<L>
where
    L: Logger + Send + Sync,
{
    fn emit(&self, record: TelemetryRecord) -> Result<()> {
        let mut log = self.logger.create_log_record();
        log.set_body(AnyValue::from(record.body));
        log.set_severity_number(otel_severity(record.severity));
        log.set_severity_text(record.severity.label());
        log.set_timestamp(SystemTime::from(record.timestamp));
        log.set_observed_timestamp(SystemTime::now());
        for (key, value) in record.attributes {
            log.add_attribute(key, value);
        }
        self.logger.emit(log);
        Ok(())
    }
}

fn otel_severity(severity: Severity) -> OtelSeverity {
    match severity {
        Severity::Debug => OtelSeverity::Debug,
        Severity::Info => OtelSeverity::Info,
        Severity::Warn => OtelSeverity::Warn,
        Severity::Error => OtelSeverity::Error,
    }
}

/// Span carried by an OpenTelemetry [`Context`].
#[derive(Debug, Clone)]
pub struct OtelSpan {
    cx: Context,
}

impl OtelSpan {
    /// Starts a recording span from `tracer`, as a child of `parent` when one
    /// is given. Call [`OtelSpan::end`] once the work it covers is done.
    pub fn start<T>(tracer: &T, name: &'static str, parent: Option<&Correlation>) -> Result<Self>
    where
        T: Tracer,
        T::Span: Send + Sync + 'static,
    {
        let parent_cx = match parent {
            Some(correlation) => {
                Context::new().with_remote_span_context(remote_context(correlation)?)
            }
            None => Context::new(),
        };
        let span = tracer.start_with_context(name, &parent_cx);
        Ok(Self {
            cx: parent_cx.with_span(span),
        })
    }

    /// Non-recording span continuing a trace started elsewhere.
    pub fn remote(correlation: &Correlation) -> Result<Self> {
        Ok(Self {
            cx: Context::new().with_remote_span_context(remote_context(correlation)?),
        })
    }

    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn end(&self) {
        self.cx.span().end();
    }
}

fn remote_context(correlation: &Correlation) -> Result<SpanContext> {
    let trace_id = OtelTraceId::from_hex(correlation.trace_id.as_str())
        .map_err(|e| PulseError::Parse(format!("invalid trace id: {e}")))?;
    let span_id = OtelSpanId::from_hex(correlation.span_id.as_str())
        .map_err(|e| PulseError::Parse(format!("invalid span id: {e}")))?;
    Ok(SpanContext::new(
        trace_id,
        span_id,
        TraceFlags::SAMPLED,
        true,
        TraceState::default(),
    ))
}

impl ActiveSpan for OtelSpan {
    fn correlation(&self) -> Option<Correlation> {
        let span = self.cx.span();
        let sc = span.span_context();
        if !sc.is_valid() {
            return None;
        }
        Correlation::parse(&sc.trace_id().to_string(), &sc.span_id().to_string()).ok()
    }

    fn set_error_status(&self, message: &str) {
        self.cx.span().set_status(Status::error(message.to_string()));
    }

    fn record_exception(&self, exception: &ErrorValue, attributes: &Attributes) {
        let mut kvs = vec![
            KeyValue::new("exception.type", exception.name.clone()),
            KeyValue::new("exception.message", exception.message.clone()),
        ];
        if let Some(stack) = &exception.stack {
            kvs.push(KeyValue::new("exception.stacktrace", stack.clone()));
        }
        kvs.extend(to_key_values(attributes));
        self.cx.span().add_event("exception", kvs);
    }

    fn add_event(&self, name: &str, attributes: &Attributes) {
        self.cx
            .span()
            .add_event(name.to_string(), to_key_values(attributes));
    }
}

fn to_key_values(attributes: &Attributes) -> Vec<KeyValue> {
    attributes
        .iter()
        .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
        .collect()
}
