use std::io::{IsTerminal, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use owo_colors::OwoColorize;
use pulselog_core::level::LevelFamily;
use serde_json::Value as Json;

/// Local mirror of emitted events. One channel per level family.
pub trait Console: Send + Sync {
    fn write(&self, channel: LevelFamily, line: &str, payload: Option<&Json>);
}

/// `[2026-02-01T00:00:00.000Z] [ERROR] message`. The payload is kept out of
/// the line so consoles can render it separately.
pub fn format_console_line(ts: DateTime<Utc>, tag: &str, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        tag.to_uppercase(),
        message
    )
}

/// Writes to stderr, colouring the line by channel on a terminal.
#[derive(Debug, Clone, Copy)]
pub struct StdConsole {
    ansi: bool,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            ansi: std::io::stderr().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { ansi: false }
    }

    fn render(&self, channel: LevelFamily, line: &str, payload: Option<&Json>) -> String {
        let mut out = if self.ansi {
            match channel {
                LevelFamily::Error => line.red().to_string(),
                LevelFamily::Warn => line.yellow().to_string(),
                LevelFamily::Info => line.green().to_string(),
                LevelFamily::Debug => line.bright_black().to_string(),
            }
        } else {
            line.to_string()
        };
        if let Some(payload) = payload {
            out.push(' ');
            out.push_str(&payload.to_string());
        }
        out
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdConsole {
    fn write(&self, channel: LevelFamily, line: &str, payload: Option<&Json>) {
        let rendered = self.render(channel, line, payload);
        let _ = writeln!(std::io::stderr().lock(), "{rendered}");
    }
}

/// Routes each channel to the matching `tracing` macro with the payload as a
/// structured field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn write(&self, channel: LevelFamily, line: &str, payload: Option<&Json>) {
        match (channel, payload) {
            (LevelFamily::Error, Some(p)) => tracing::error!(payload = %p, "{line}"),
            (LevelFamily::Error, None) => tracing::error!("{line}"),
            (LevelFamily::Warn, Some(p)) => tracing::warn!(payload = %p, "{line}"),
            (LevelFamily::Warn, None) => tracing::warn!("{line}"),
            (LevelFamily::Info, Some(p)) => tracing::info!(payload = %p, "{line}"),
            (LevelFamily::Info, None) => tracing::info!("{line}"),
            (LevelFamily::Debug, Some(p)) => tracing::debug!(payload = %p, "{line}"),
            (LevelFamily::Debug, None) => tracing::debug!("{line}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullConsole;

impl Console for NullConsole {
    fn write(&self, _channel: LevelFamily, _line: &str, _payload: Option<&Json>) {}
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn line_embeds_timestamp_tag_and_message() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            format_console_line(ts, "delivered", "sent"),
            "[2026-02-01T00:00:00.000Z] [DELIVERED] sent"
        );
    }

    #[test]
    fn plain_render_appends_payload() {
        let console = StdConsole::plain();
        let out = console.render(LevelFamily::Error, "[x] [ERROR] boom", Some(&json!({"a": 1})));
        assert_eq!(out, "[x] [ERROR] boom {\"a\":1}");
        assert_eq!(console.render(LevelFamily::Info, "line", None), "line");
    }
}
