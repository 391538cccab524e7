use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};
use crate::level::LevelSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub service_name: String,
    pub source: Option<String>,
    pub console: ConsoleMode,
    pub recent_window: Duration,
    pub default_levels: LevelSet,
    pub otlp_endpoint: Option<String>,
    pub otlp_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "pulselog".to_string(),
            source: None,
            console: ConsoleMode::Plain,
            recent_window: Duration::from_secs(60 * 60 * 24),
            default_levels: LevelSet::all(),
            otlp_endpoint: None,
            otlp_timeout: Duration::from_secs(10),
        }
    }
}

/// Where the emitter mirrors events locally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleMode {
    /// Formatted lines on stderr.
    #[default]
    Plain,
    /// Through the `tracing` subscriber.
    Tracing,
    Off,
}

impl ConsoleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Tracing => "tracing",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for ConsoleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsoleMode {
    type Err = PulseError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "tracing" => Ok(Self::Tracing),
            "off" => Ok(Self::Off),
            _ => Err(PulseError::Config(
                "console must be one of plain, tracing, off".to_string(),
            )),
        }
    }
}

impl Config {
    /// Defaults, then the config file, then `PULSELOG_*` environment
    /// variables. A file named by `explicit` or `PULSELOG_CONFIG` must exist;
    /// the XDG default location is optional.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self> {
        let mut cfg = Self::default();
        let (config_path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => config_file_path(),
        };
        if let Some(file_overrides) = load_file_overrides(&config_path, required)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides();
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    service_name: Option<String>,
    source: Option<String>,
    console: Option<String>,
    recent_window: Option<String>,
    default_levels: Option<String>,
    otlp_endpoint: Option<String>,
    otlp_timeout: Option<String>,
}

/// The path to read and whether it must exist.
fn config_file_path() -> (PathBuf, bool) {
    if let Ok(path) = env::var("PULSELOG_CONFIG") {
        return (PathBuf::from(path), true);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    (config_home.join("pulselog/config.toml"), false)
}

fn load_file_overrides(path: &Path, required: bool) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        if required {
            return Err(PulseError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| PulseError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| PulseError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> ConfigOverrides {
    ConfigOverrides {
        service_name: env::var("PULSELOG_SERVICE_NAME").ok(),
        source: env::var("PULSELOG_SOURCE").ok(),
        console: env::var("PULSELOG_CONSOLE").ok(),
        recent_window: env::var("PULSELOG_RECENT_WINDOW").ok(),
        default_levels: env::var("PULSELOG_LEVELS").ok(),
        otlp_endpoint: env::var("PULSELOG_OTLP_ENDPOINT")
            .or_else(|_| env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
            .ok(),
        otlp_timeout: env::var("PULSELOG_OTLP_TIMEOUT").ok(),
    }
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.service_name {
        cfg.service_name = v;
    }
    if let Some(v) = overrides.source {
        cfg.source = Some(v);
    }
    if let Some(v) = overrides.console {
        cfg.console = v.parse().map_err(|e| {
            PulseError::Config(format!("bad console in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.recent_window {
        cfg.recent_window = humantime::parse_duration(&v).map_err(|e| {
            PulseError::Config(format!("bad recent_window in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.default_levels {
        cfg.default_levels = LevelSet::parse(&v).map_err(|e| {
            PulseError::Config(format!("bad default_levels in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.otlp_endpoint {
        cfg.otlp_endpoint = Some(v).filter(|e| !e.trim().is_empty());
    }
    if let Some(v) = overrides.otlp_timeout {
        cfg.otlp_timeout = humantime::parse_duration(&v).map_err(|e| {
            PulseError::Config(format!("bad otlp_timeout in {source}: {e} (value={v})"))
        })?;
    }
    Ok(())
}
