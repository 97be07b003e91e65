//! Log parser for the compiler's `SEVERITY: message in file <path>, line <n>` output.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::core::{Diagnostics, LineShift, LogEntry, LogParser, Marker, Severity};

static SEVERITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ERROR|WARNING|DEPRECATED|TRACE|ECHO):\s*(.*)$").expect("severity pattern")
});

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"in file "?([^",]+)"?, line (\d+)"#).expect("location pattern")
});

/// Default [`LogParser`] for compiler logs.
///
/// Every log line is kept in the text. Lines with a severity tag and a file
/// location become markers; locations in the shifted source file have their
/// line numbers mapped back in both the marker and the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScadLogParser;

impl ScadLogParser {
    /// Create a parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn severity(tag: &str) -> Severity {
        match tag {
            "ERROR" => Severity::Error,
            "WARNING" | "DEPRECATED" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    fn shift_text(text: &str, shift: &LineShift) -> String {
        LOCATION_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let path = &caps[1];
                match caps[2].parse::<u32>() {
                    Ok(line) if shift.applies_to(path) => {
                        let quoted = caps[0].contains('"');
                        let q = if quoted { "\"" } else { "" };
                        format!("in file {q}{path}{q}, line {}", shift.shift(line))
                    }
                    _ => caps[0].to_owned(),
                }
            })
            .into_owned()
    }

    fn marker(text: &str, shift: &LineShift) -> Option<Marker> {
        let tagged = SEVERITY_RE.captures(text)?;
        let severity = Self::severity(&tagged[1]);
        let body = tagged.get(2).map_or("", |m| m.as_str());

        let location = LOCATION_RE.captures(body)?;
        let whole = location.get(0)?;
        let path = location[1].to_owned();
        let raw_line: u32 = location[2].parse().ok()?;
        let line = if shift.applies_to(&path) {
            shift.shift(raw_line)
        } else {
            raw_line
        };

        let before = body[..whole.start()].trim().trim_end_matches(',').trim_end();
        let after = body[whole.end()..].trim().trim_start_matches(':').trim_start();
        let message = match (before.is_empty(), after.is_empty()) {
            (false, false) => format!("{before}: {after}"),
            (false, true) => before.to_owned(),
            (true, _) => after.to_owned(),
        };

        Some(Marker {
            severity,
            path,
            line,
            message,
        })
    }
}

impl LogParser for ScadLogParser {
    fn parse(&self, log: &[LogEntry], shift: &LineShift) -> Diagnostics {
        let mut lines = Vec::with_capacity(log.len());
        let mut markers = Vec::new();
        for entry in log {
            if let Some(marker) = Self::marker(&entry.text, shift) {
                markers.push(marker);
            }
            lines.push(Self::shift_text(&entry.text, shift));
        }
        Diagnostics {
            log_text: lines.join("\n"),
            markers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lines: &[&str], skip: u32) -> Diagnostics {
        let log: Vec<LogEntry> = lines.iter().map(|l| LogEntry::stderr(*l)).collect();
        ScadLogParser::new().parse(&log, &LineShift::new("/playground.scad", skip))
    }

    #[test]
    fn test_parser_error_with_quoted_path() {
        let d = parse(
            &[r#"ERROR: Parser error in file "/playground.scad", line 3: syntax error"#],
            1,
        );
        assert_eq!(d.markers.len(), 1);
        let m = &d.markers[0];
        assert_eq!(m.severity, Severity::Error);
        assert_eq!(m.line, 2);
        assert_eq!(m.message, "Parser error: syntax error");
        assert_eq!(
            d.log_text,
            r#"ERROR: Parser error in file "/playground.scad", line 2: syntax error"#
        );
    }

    #[test]
    fn test_warning_with_trailing_location() {
        let d = parse(
            &["WARNING: Ignoring unknown variable 'w' in file playground.scad, line 7"],
            1,
        );
        let m = &d.markers[0];
        assert_eq!(m.severity, Severity::Warning);
        assert_eq!(m.line, 6);
        assert_eq!(m.message, "Ignoring unknown variable 'w'");
    }

    #[test]
    fn test_other_files_are_not_shifted() {
        let d = parse(&["WARNING: Deprecated call in file lib.scad, line 7"], 1);
        assert_eq!(d.markers[0].line, 7);
        assert_eq!(d.log_text, "WARNING: Deprecated call in file lib.scad, line 7");
    }

    #[test]
    fn test_plain_lines_kept_without_markers() {
        let d = parse(&["Compiling design (CSG Tree generation)...", "ECHO: 42"], 1);
        assert!(d.markers.is_empty());
        assert_eq!(d.log_text, "Compiling design (CSG Tree generation)...\nECHO: 42");
    }

    #[test]
    fn test_error_on_prefix_line_clamps_to_zero() {
        let d = parse(&[r#"ERROR: Parser error in file "/playground.scad", line 1: x"#], 1);
        assert_eq!(d.markers[0].line, 0);
        assert!(d.has_errors());
    }
}
