//! Structured diagnostics extracted from tool logs.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational output such as `ECHO:` or `TRACE:`.
    Info,
    /// Non-fatal warning.
    Warning,
    /// Fatal error.
    Error,
}

/// A diagnostic anchored to a position in the user's source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Severity of the message.
    pub severity: Severity,
    /// Path of the file the tool attributed the message to.
    pub path: String,
    /// One-based line in the user's source, after the prefix shift.
    pub line: u32,
    /// Message text without the severity tag or location suffix.
    pub message: String,
}

/// Log text and markers produced by one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Human-readable log, one entry per line.
    pub log_text: String,
    /// Structured markers.
    pub markers: Vec<Marker>,
}

impl Diagnostics {
    /// Whether any marker has error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.markers.iter().any(|m| m.severity == Severity::Error)
    }
}

/// Number of synthetic lines prepended to one source file before invoking the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineShift {
    /// Path of the source file the prefix was added to.
    pub source_path: String,
    /// Count of prepended lines.
    pub skip_lines: u32,
}

impl LineShift {
    /// Create a shift for `source_path`.
    pub fn new(source_path: impl Into<String>, skip_lines: u32) -> Self {
        Self {
            source_path: source_path.into(),
            skip_lines,
        }
    }

    /// Whether this shift applies to diagnostics reported against `path`.
    ///
    /// The tool sometimes reports paths without the leading slash.
    #[must_use]
    pub fn applies_to(&self, path: &str) -> bool {
        path.trim_start_matches('/') == self.source_path.trim_start_matches('/')
    }

    /// Map a tool-visible line to the user's line, never below zero.
    #[must_use]
    pub const fn shift(&self, line: u32) -> u32 {
        shift_line(line, self.skip_lines)
    }
}

/// Map a tool-visible line `line` back to the caller's numbering when `skip`
/// synthetic lines were prepended.
#[must_use]
pub const fn shift_line(line: u32, skip: u32) -> u32 {
    line.saturating_sub(skip)
}
