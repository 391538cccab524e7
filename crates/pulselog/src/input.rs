use std::fs;
use std::path::Path;

use anyhow::Context;
use pulselog_core::model::value::{ErrorValue, EventData, EventValue};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;

/// Reads a JSON array, or JSON lines. Malformed lines are skipped with a
/// warning; a malformed array fails as a whole.
pub fn read_items<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_items(&raw).with_context(|| format!("parse {}", path.display()))
}

fn parse_items<T: DeserializeOwned>(raw: &str) -> anyhow::Result<Vec<T>> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut out = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(item) => out.push(item),
            Err(err) => tracing::warn!(line = idx + 1, error = %err, "skipping malformed record"),
        }
    }
    Ok(out)
}

/// `key=value`; the value is read as JSON when it parses, else as text.
pub fn parse_field(input: &str) -> anyhow::Result<(String, EventValue)> {
    let Some((key, value)) = input.split_once('=') else {
        anyhow::bail!("invalid field {input}: expected key=value");
    };
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("invalid field {input}: empty key");
    }
    let value = serde_json::from_str::<Json>(value)
        .map(EventValue::from)
        .unwrap_or_else(|_| EventValue::Text(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn build_event_data(fields: &[String], error: Option<String>) -> anyhow::Result<Option<EventData>> {
    let mut data = EventData::new();
    for field in fields {
        let (key, value) = parse_field(field)?;
        data.insert(key, value);
    }
    if let Some(message) = error {
        data.insert("error", ErrorValue::new(message));
    }
    Ok((!data.is_empty()).then_some(data))
}
