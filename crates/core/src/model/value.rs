use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// Placeholder rendered wherever a payload value cannot be serialized.
pub const UNSERIALIZABLE: &str = "unserializable object";

/// A structured payload value attached to a log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Json", into = "Json")]
pub enum EventValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Error(ErrorValue),
    Nested(Json),
    /// A value whose serialization failed when it was captured.
    Unserializable,
}

impl EventValue {
    /// Captures any serializable value, degrading to `Unserializable` if serde
    /// refuses it.
    pub fn serialize_from<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => Self::from(json),
            Err(_) => Self::Unserializable,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Json {
        Json::from(self.clone())
    }
}

impl From<Json> for EventValue {
    fn from(value: Json) -> Self {
        match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Text(n.to_string())
                }
            }
            Json::String(s) => Self::Text(s),
            Json::Object(map) => match ErrorValue::from_json_object(&map) {
                Some(err) => Self::Error(err),
                None => Self::Nested(Json::Object(map)),
            },
            array @ Json::Array(_) => Self::Nested(array),
        }
    }
}

impl From<EventValue> for Json {
    fn from(value: EventValue) -> Self {
        match value {
            EventValue::Null => Json::Null,
            EventValue::Bool(b) => Json::Bool(b),
            EventValue::Int(i) => Json::from(i),
            EventValue::Float(f) => Json::from(f),
            EventValue::Text(s) => Json::String(s),
            EventValue::Error(err) => err.to_json(),
            EventValue::Nested(json) => json,
            EventValue::Unserializable => Json::String(UNSERIALIZABLE.to_string()),
        }
    }
}

impl From<&str> for EventValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EventValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for EventValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for EventValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for EventValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for EventValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for EventValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<ErrorValue> for EventValue {
    fn from(value: ErrorValue) -> Self {
        Self::Error(value)
    }
}

/// Error-like payload value: a message plus an optional stack rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_string(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Builds a value from a Rust error. The stack is the rendered source chain.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut frames = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            frames.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self {
            name: "Error".to_string(),
            message: err.to_string(),
            stack: Some(frames.join("\n")),
        }
    }

    /// Duck-typed detection. An object with a string `message` is an error
    /// when it also has a string `stack`, or when it is exactly the
    /// `{name, message}` shape [`ErrorValue::to_json`] writes.
    pub fn from_json_object(map: &Map<String, Json>) -> Option<Self> {
        let message = map.get("message")?.as_str()?;
        let name = map.get("name").and_then(Json::as_str);
        let stack = map.get("stack").and_then(Json::as_str);
        let error_keys_only = map
            .keys()
            .all(|k| matches!(k.as_str(), "name" | "message" | "stack"));
        if stack.is_none() && !(name.is_some() && error_keys_only) {
            return None;
        }
        Some(Self {
            name: name.unwrap_or("Error").to_string(),
            message: message.to_string(),
            stack: stack.map(str::to_string),
        })
    }

    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        map.insert("name".to_string(), Json::String(self.name.clone()));
        map.insert("message".to_string(), Json::String(self.message.clone()));
        if let Some(stack) = &self.stack {
            map.insert("stack".to_string(), Json::String(stack.clone()));
        }
        Json::Object(map)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Ordered payload attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventData(BTreeMap<String, EventValue>);

impl EventData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<EventValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<EventValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&EventValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First error-like value in key order.
    pub fn first_error(&self) -> Option<&ErrorValue> {
        self.0.values().find_map(EventValue::as_error)
    }

    pub fn to_json(&self) -> Json {
        Json::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<EventValue>> FromIterator<(K, V)> for EventData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
