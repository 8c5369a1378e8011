//! A single converter: one edge of the format graph.

use crate::error::{ConvertError, ConvertResult};
use serde::Serialize;
use std::fmt;

/// Which LaTeX variant a conversion path requires from the document writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    #[default]
    Latex,
    PdfLatex,
}

impl Flavor {
    /// Flavor produced by a LaTeX converter writing the given format.
    pub fn for_target(to: &str) -> Self {
        if to.contains("pdf") {
            Flavor::PdfLatex
        } else {
            Flavor::Latex
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Latex => write!(f, "latex"),
            Flavor::PdfLatex => write!(f, "pdflatex"),
        }
    }
}

/// Typed converter flags.
///
/// Parsed from the configuration string
/// `latex,needaux,originaldir,resultdir=...,resultfile=...,parselog=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConverterFlags {
    /// The step runs a LaTeX engine.
    pub latex: bool,

    /// The step needs `.aux` files from a previous LaTeX run.
    pub need_aux: bool,

    /// The step runs in the document's own directory.
    pub original_dir: bool,

    /// Directory the step writes its result into (`$$b` is the input base).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_dir: Option<String>,

    /// Name of the main result file inside `result_dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_file: Option<String>,

    /// Command that turns the step's stderr into a LaTeX-style log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_log: Option<String>,
}

impl ConverterFlags {
    /// Parse a flag string. `to_extension` is the extension of the
    /// converter's target, used for the default `resultfile`.
    pub fn parse(flags: &str, to_extension: &str) -> ConvertResult<Self> {
        let mut parsed = ConverterFlags::default();

        for flag in flags.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            let (name, value) = match flag.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value.trim())),
                None => (flag, None),
            };

            match (name, value) {
                ("latex", None) => parsed.latex = true,
                ("needaux", None) => parsed.need_aux = true,
                ("originaldir", None) => parsed.original_dir = true,
                ("resultdir", value) => {
                    let dir = value.filter(|v| !v.is_empty()).unwrap_or("$$b");
                    parsed.result_dir = Some(dir.to_string());
                }
                ("resultfile", Some(value)) if !value.is_empty() => {
                    parsed.result_file = Some(value.to_string());
                }
                ("parselog", Some(value)) if !value.is_empty() => {
                    parsed.parse_log = Some(value.to_string());
                }
                ("latex" | "needaux" | "originaldir", Some(_)) => {
                    return Err(invalid(flag, "flag takes no value"));
                }
                ("resultfile" | "parselog", _) => {
                    return Err(invalid(flag, "flag requires a value"));
                }
                _ => return Err(invalid(flag, "unknown flag")),
            }
        }

        if parsed.result_dir.is_some() && parsed.result_file.is_none() {
            parsed.result_file = Some(format!("index.{}", to_extension));
        }

        Ok(parsed)
    }
}

fn invalid(flag: &str, reason: &str) -> ConvertError {
    ConvertError::InvalidFlag {
        flag: flag.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for ConverterFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.latex {
            parts.push("latex".to_string());
        }
        if self.need_aux {
            parts.push("needaux".to_string());
        }
        if self.original_dir {
            parts.push("originaldir".to_string());
        }
        if let Some(dir) = &self.result_dir {
            parts.push(format!("resultdir={}", dir));
        }
        if let Some(file) = &self.result_file {
            parts.push(format!("resultfile={}", file));
        }
        if let Some(parser) = &self.parse_log {
            parts.push(format!("parselog={}", parser));
        }
        write!(f, "{}", parts.join(","))
    }
}

/// A registered converter from one format to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Converter {
    pub from: String,
    pub to: String,

    /// Command template with `$$` tokens
    pub command: String,

    pub flags: ConverterFlags,

    /// For LaTeX converters, the flavor the document must be written in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latex_flavor: Option<Flavor>,
}

impl Converter {
    /// Create a new converter from already parsed flags.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        command: impl Into<String>,
        flags: ConverterFlags,
    ) -> Self {
        let to = to.into();
        let latex_flavor = flags.latex.then(|| Flavor::for_target(&to));
        Self {
            from: from.into(),
            to,
            command: command.into(),
            flags,
            latex_flavor,
        }
    }

    pub fn is_latex(&self) -> bool {
        self.flags.latex
    }
}
