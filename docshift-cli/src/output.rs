//! Console output for the `docshift` binary.
//!
//! Status lines are styled and follow the output [`Level`]. The data a
//! command was asked for (format tables, converter chains, JSON) goes to
//! stdout unstyled at every level, so `docshift -q targets dvi` can be piped.

use console::{Emoji, style};
use docshift_core::{Conversion, Converter};
use docshift_exec::{LogEntry, Severity};
use std::fmt::Display;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

/// How much the CLI prints besides requested data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Errors only
    Quiet,
    Normal,
    /// Adds the files written and the flavor a chain was run with
    Verbose,
}

impl Level {
    /// Level for the `--quiet` and `--verbose` flags. Quiet wins.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Level::Quiet,
            (false, 0) => Level::Normal,
            (false, _) => Level::Verbose,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Quiet,
            1 => Level::Normal,
            _ => Level::Verbose,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(Level::Normal as u8);

static DONE: Emoji<'_, '_> = Emoji("✅ ", "OK ");
static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!! ");
static FAIL: Emoji<'_, '_> = Emoji("❌ ", "ERR ");
static NOTE: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");

pub fn set_level(level: Level) {
    LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn level() -> Level {
    Level::from_u8(LEVEL.load(Ordering::SeqCst))
}

pub fn is_quiet() -> bool {
    level() == Level::Quiet
}

fn shown_at(min: Level) -> bool {
    level() >= min
}

pub fn success(msg: &str) {
    if shown_at(Level::Normal) {
        println!("{} {}", DONE, style(msg).green());
    }
}

/// Warnings go to stderr so they never mix with piped data.
pub fn warning(msg: &str) {
    if shown_at(Level::Normal) {
        eprintln!("{} {}", WARN, style(msg).yellow());
    }
}

/// Printed at every level.
pub fn error(msg: &str) {
    eprintln!("{} {}", FAIL, style(msg).red().bold());
}

pub fn info(msg: &str) {
    if shown_at(Level::Normal) {
        println!("{} {}", NOTE, style(msg).cyan());
    }
}

pub fn verbose(msg: &str) {
    if shown_at(Level::Verbose) {
        println!("{}", style(msg).dim());
    }
}

pub fn heading(msg: &str) {
    if shown_at(Level::Normal) {
        println!("{}", style(msg).bold().underlined());
    }
}

/// Requested results, unstyled, at every level.
pub fn data(line: impl Display) {
    println!("{}", line);
}

/// One numbered line of a converter chain: `2. dvi -> ps: dvips -o $$o $$i`,
/// followed by the flags in parentheses when there are any.
pub fn step_line(number: usize, converter: &Converter) -> String {
    let mut line = format!(
        "{}. {} -> {}: {}",
        number, converter.from, converter.to, converter.command
    );
    let flags = converter.flags.to_string();
    if !flags.is_empty() {
        line.push_str(&format!("  ({})", flags));
    }
    line
}

/// `paper.log:12: Undefined control sequence.`
pub fn log_entry_line(source: &Path, entry: &LogEntry) -> String {
    match entry.line {
        Some(line) => format!("{}:{}: {}", source.display(), line, entry.message),
        None => entry.message.clone(),
    }
}

/// Warn about errors found in LaTeX logs. They do not fail the conversion,
/// so this is the only place the user learns about them.
pub fn log_problems(conversion: &Conversion) {
    let count = conversion.error_count();
    if count > 0 {
        warning(&format!(
            "{} error{} reported in the logs",
            count,
            if count == 1 { "" } else { "s" }
        ));
    }
    for log in &conversion.logs {
        for entry in &log.entries {
            let line = format!("  {}", log_entry_line(&log.source, entry));
            match entry.severity {
                Severity::Error => warning(&line),
                Severity::Warning => verbose(&line),
            }
        }
    }
}
