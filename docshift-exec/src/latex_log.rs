//! Scanning of LaTeX (and LaTeX-like) log files.
//!
//! The scanner extracts `! ...` errors with their `l.<n>` source line,
//! `LaTeX`/`Package`/`Class` warnings, and the markers engines print when
//! another pass is needed to settle cross-references.

use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// How many lines after a `!` error to search for its `l.<n>` marker.
const ERROR_CONTEXT_LINES: usize = 12;

struct Patterns {
    warning: Regex,
    input_line: Regex,
    error_line: Regex,
    rerun: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        warning: Regex::new(r"^(?:LaTeX|Package \S+|Class \S+|LaTeX Font) Warning: (.*)$")
            .expect("warning pattern is valid"),
        input_line: Regex::new(r"on input line (\d+)").expect("input line pattern is valid"),
        error_line: Regex::new(r"^l\.(\d+)(.*)$").expect("error line pattern is valid"),
        rerun: Regex::new(r"Rerun to get|Label\(s\) may have changed|[Rr]erun LaTeX")
            .expect("rerun pattern is valid"),
    })
}

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One error or warning found in a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,

    /// Line in the processed source file, when the log names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// Source text the engine printed next to the line number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Everything the scanner learned from one log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogReport {
    /// Log file (or command) the report was produced from.
    pub source: PathBuf,
    pub entries: Vec<LogEntry>,

    /// The engine asked for another pass.
    pub rerun_requested: bool,

    /// The engine produced no pages.
    pub no_output: bool,
}

impl LogReport {
    pub fn errors(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

/// Whether the log asks for another LaTeX pass.
pub fn needs_rerun(log: &str) -> bool {
    log.lines().any(|line| patterns().rerun.is_match(line))
}

/// Scan log text into a [`LogReport`].
pub fn scan_log(source: impl AsRef<Path>, log: &str) -> LogReport {
    let patterns = patterns();
    let lines: Vec<&str> = log.lines().collect();
    let mut report = LogReport {
        source: source.as_ref().to_path_buf(),
        ..Default::default()
    };

    for (i, line) in lines.iter().enumerate() {
        if let Some(message) = line.strip_prefix("! ") {
            let mut entry = LogEntry {
                severity: Severity::Error,
                message: message.trim().to_string(),
                line: None,
                context: None,
            };
            for follow in lines.iter().skip(i + 1).take(ERROR_CONTEXT_LINES) {
                if follow.starts_with("! ") {
                    break;
                }
                if let Some(caps) = patterns.error_line.captures(follow) {
                    entry.line = caps[1].parse().ok();
                    let context = caps[2].trim();
                    if !context.is_empty() {
                        entry.context = Some(context.to_string());
                    }
                    break;
                }
            }
            report.entries.push(entry);
        } else if let Some(caps) = patterns.warning.captures(line) {
            let message = caps[1].trim().to_string();
            let line_no = patterns
                .input_line
                .captures(line)
                .and_then(|c| c[1].parse().ok());
            report.entries.push(LogEntry {
                severity: Severity::Warning,
                message,
                line: line_no,
                context: None,
            });
        }

        if patterns.rerun.is_match(line) {
            report.rerun_requested = true;
        }
        if line.starts_with("No pages of output") {
            report.no_output = true;
        }
    }

    report
}
