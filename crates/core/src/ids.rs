use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(String);

impl TraceId {
    pub fn parse(input: &str) -> Result<Self> {
        if input.len() != 32 || !input.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PulseError::Parse(format!("invalid trace id: {input}")));
        }
        Ok(Self(input.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The all-zero id carried by contexts that have no real trace.
    pub fn is_unset(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }
}

impl SpanId {
    pub fn parse(input: &str) -> Result<Self> {
        if input.len() != 16 || !input.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PulseError::Parse(format!("invalid span id: {input}")));
        }
        Ok(Self(input.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trace/span pair captured from the active context when a record is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Correlation {
    pub trace_id: TraceId,
    pub span_id: SpanId,
}

impl Correlation {
    pub fn parse(trace_id: &str, span_id: &str) -> Result<Self> {
        Ok(Self {
            trace_id: TraceId::parse(trace_id)?,
            span_id: SpanId::parse(span_id)?,
        })
    }
}
