//! Turns an event payload into flat string attributes.

use std::collections::BTreeMap;

use pulselog_core::model::value::{ErrorValue, EventData, EventValue, UNSERIALIZABLE};

pub type Attributes = BTreeMap<String, String>;

pub const LOG_LEVEL_KEY: &str = "log.level";
pub const TRACE_ID_KEY: &str = "trace_id";
pub const SPAN_ID_KEY: &str = "span_id";
pub const ERROR_MESSAGE_KEY: &str = "error.message";
pub const ERROR_STACK_KEY: &str = "error.stack";
pub const LOG_DATA_PREFIX: &str = "log.data.";

/// How a single payload value is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Shaped<'a> {
    /// Error-like value; expands into `error.*` attributes.
    Error(&'a ErrorValue),
    /// Nested structure rendered as JSON, or the placeholder.
    Structured(String),
    Scalar(String),
}

pub fn classify(value: &EventValue) -> Shaped<'_> {
    match value {
        EventValue::Error(err) => Shaped::Error(err),
        EventValue::Nested(json) => Shaped::Structured(
            serde_json::to_string(json).unwrap_or_else(|_| UNSERIALIZABLE.to_string()),
        ),
        EventValue::Unserializable => Shaped::Structured(UNSERIALIZABLE.to_string()),
        EventValue::Null => Shaped::Scalar("null".to_string()),
        EventValue::Bool(b) => Shaped::Scalar(b.to_string()),
        EventValue::Int(i) => Shaped::Scalar(i.to_string()),
        EventValue::Float(f) => Shaped::Scalar(f.to_string()),
        EventValue::Text(s) => Shaped::Scalar(s.clone()),
    }
}

/// Every entry keyed as given, then `error.*` from the first error value.
/// The `error.*` keys always describe the same error the span records.
pub fn shape_attributes(data: &EventData) -> Attributes {
    let mut attrs: Attributes = data
        .iter()
        .map(|(key, value)| {
            let rendered = match classify(value) {
                Shaped::Error(err) => err.to_string(),
                Shaped::Structured(s) | Shaped::Scalar(s) => s,
            };
            (key.to_string(), rendered)
        })
        .collect();
    if let Some(err) = data.first_error() {
        attrs.insert(ERROR_MESSAGE_KEY.to_string(), err.message.clone());
        match &err.stack {
            Some(stack) => attrs.insert(ERROR_STACK_KEY.to_string(), stack.clone()),
            None => attrs.remove(ERROR_STACK_KEY),
        };
    }
    attrs
}

/// Non-error payload entries, each key prefixed with `log.data.`.
pub fn exception_attributes(data: &EventData) -> Attributes {
    data.iter()
        .filter_map(|(key, value)| match classify(value) {
            Shaped::Error(_) => None,
            Shaped::Structured(s) | Shaped::Scalar(s) => Some((format!("{LOG_DATA_PREFIX}{key}"), s)),
        })
        .collect()
}
