// Core data models for Canary

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

/// One line of input with its 1-based position in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: u64,
    pub text: String,
}

impl Line {
    pub fn new(number: u64, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// How the raw canary value is produced for each line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanaryMode {
    /// Unix seconds followed by the line number
    Timestamp,
    /// A fixed literal
    Custom(String),
    /// Round-robin over the decimal integers `start..=end`
    Range { start: i64, end: i64 },
}

impl CanaryMode {
    /// Select a mode from a user supplied value.
    ///
    /// - anything containing `-` is treated as a range; a malformed range
    ///   (`5-2`, `a-b`, `1-2-3`) degrades to a literal token
    /// - `timestamp` selects the timestamp mode
    /// - everything else is a custom literal
    pub fn from_value(value: &str) -> Self {
        if value.contains('-') {
            return match parse_range(value) {
                Some((start, end)) => CanaryMode::Range { start, end },
                None => {
                    tracing::warn!(value, "malformed canary range, using it as a literal token");
                    CanaryMode::Custom(value.to_string())
                }
            };
        }
        if value == "timestamp" {
            CanaryMode::Timestamp
        } else {
            CanaryMode::Custom(value.to_string())
        }
    }
}

impl fmt::Display for CanaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanaryMode::Timestamp => write!(f, "timestamp"),
            CanaryMode::Custom(value) => write!(f, "custom({})", value),
            CanaryMode::Range { start, end } => write!(f, "range({}-{})", start, end),
        }
    }
}

/// Parse a `start-end` specification.
///
/// Returns `None` unless there are exactly two hyphen separated integers
/// with `start <= end`.
pub fn parse_range(spec: &str) -> Option<(i64, i64)> {
    let parts: Vec<&str> = spec.split('-').collect();
    if parts.len() != 2 {
        return None;
    }
    let start = parts[0].parse::<i64>().ok()?;
    let end = parts[1].parse::<i64>().ok()?;
    if start > end {
        return None;
    }
    Some((start, end))
}

/// Canary strategy plus the decoration applied around every token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanaryConfig {
    pub mode: CanaryMode,
    pub prefix: String,
    pub suffix: String,
    /// Placed between the token and the OAST domain
    pub delimiter: String,
    pub oast_domain: Option<String>,
}

impl CanaryConfig {
    pub fn new(mode: CanaryMode) -> Self {
        Self {
            mode,
            prefix: String::new(),
            suffix: String::new(),
            delimiter: String::new(),
            oast_domain: None,
        }
    }
}

/// Parameter names eligible for injection; empty matches every name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetParams(HashSet<String>);

impl TargetParams {
    pub fn any() -> Self {
        Self::default()
    }

    /// Build from a comma separated list such as `id,q`
    pub fn from_csv(list: &str) -> Self {
        list.split(',').collect()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.is_empty() || self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TargetParams {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }
}

/// How eligible values are rewritten
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationPolicy {
    /// Append the token to the existing value instead of replacing it
    pub keep_original: bool,
    /// Rewrite every eligible value, not just the first one
    pub replace_all: bool,
}

/// Immutable configuration shared by every worker
#[derive(Debug, Clone)]
pub struct InjectorConfig {
    pub canary: CanaryConfig,
    pub targets: TargetParams,
    pub policy: MutationPolicy,
    /// Lines are raw HTTP request lines rather than bare URLs
    pub raw_mode: bool,
}

impl InjectorConfig {
    pub fn new(canary: CanaryConfig) -> Self {
        Self {
            canary,
            targets: TargetParams::any(),
            policy: MutationPolicy::default(),
            raw_mode: false,
        }
    }
}

/// A successfully injected line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    /// `base?query` with the token in place
    pub line: String,
    /// `original -> injected`
    pub log_entry: String,
}

/// Format of the change log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Order in which results reach the output stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputOrder {
    /// Whichever worker finishes first writes first
    #[default]
    Completion,
    /// Results are buffered and written in input line order
    Input,
}
