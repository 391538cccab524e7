use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};

/// Domain level attached to every log record.
///
/// `Delivered` and `Blocked` are notification outcomes. They stay distinct for
/// filtering and display but fold onto the standard families for telemetry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Delivered,
    Blocked,
}

/// The four standard families a level collapses onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelFamily {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Delivered,
        Level::Blocked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Delivered => "delivered",
            Level::Blocked => "blocked",
        }
    }

    pub fn family(self) -> LevelFamily {
        match self {
            Level::Error => LevelFamily::Error,
            Level::Warn => LevelFamily::Warn,
            Level::Info | Level::Delivered => LevelFamily::Info,
            Level::Debug | Level::Blocked => LevelFamily::Debug,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "delivered" => Ok(Self::Delivered),
            "blocked" => Ok(Self::Blocked),
            _ => Err(PulseError::Parse(format!("unknown level: {s}"))),
        }
    }
}

/// Set of levels a view lets through. An empty set lets nothing through.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LevelSet(BTreeSet<Level>);

impl LevelSet {
    pub fn all() -> Self {
        Level::ALL.into_iter().collect()
    }

    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, level: Level) -> bool {
        self.0.contains(&level)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses `"error,warn"`. The literal `all` selects every level.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Level::from_str)
            .collect()
    }
}

impl FromIterator<Level> for LevelSet {
    fn from_iter<I: IntoIterator<Item = Level>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Telemetry severity, numbered as in the OpenTelemetry log data model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug = 5,
    Info = 9,
    Warn = 13,
    Error = 17,
}

impl Severity {
    pub fn for_level(level: Level) -> Self {
        match level.family() {
            LevelFamily::Error => Self::Error,
            LevelFamily::Warn => Self::Warn,
            LevelFamily::Info => Self::Info,
            LevelFamily::Debug => Self::Debug,
        }
    }

    pub fn number(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}
