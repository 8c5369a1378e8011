//! Configuration loading and validation for docshift.
//!
//! This module implements the `docshift.yaml` configuration schema: the
//! format table, the converter table and execution settings.
//!
//! # Lookup Order
//!
//! 1. The path given with `--config`
//! 2. `./docshift.yaml`
//! 3. `docshift/docshift.yaml` in the user config directory
//! 4. The built-in default table (the same content `docshift init` writes)
//!
//! # Environment Variable Overrides
//!
//! - `DOCSHIFT_NATIVE_FORMAT`: Override the native format name
//! - `DOCSHIFT_MAX_LATEX_PASSES`: Override the LaTeX pass bound
//! - `DOCSHIFT_TIMEOUT_SECS`: Override the per-process timeout
//! - `DOCSHIFT_TEMP_DIR`: Override where scratch directories are created

use docshift_core::{
    ConvertResult, ConverterFlags, Converters, DEFAULT_NATIVE_FORMAT,
    DEFAULT_TEXT_FORMAT, DEFAULT_TEXT_PARAGRAPH_FORMAT, ExecutionSettings, Formats, LoaderFormats,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name looked up in the working and user config directories.
pub const CONFIG_FILE_NAME: &str = "docshift.yaml";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read the configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse the YAML configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root configuration structure for `docshift.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocshiftConfig {
    /// Format of documents opened without conversion.
    #[serde(default = "default_native_format")]
    pub native_format: String,

    /// Plain text, one paragraph per line.
    #[serde(default = "default_text_format")]
    pub text_format: String,

    /// Plain text, paragraphs separated by blank lines.
    #[serde(default = "default_text_paragraph_format")]
    pub text_paragraph_format: String,

    #[serde(default)]
    pub formats: Vec<FormatEntry>,

    #[serde(default)]
    pub converters: Vec<ConverterEntry>,

    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Where this configuration was read from; `None` for the built-in table.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_native_format() -> String {
    DEFAULT_NATIVE_FORMAT.to_string()
}

fn default_text_format() -> String {
    DEFAULT_TEXT_FORMAT.to_string()
}

fn default_text_paragraph_format() -> String {
    DEFAULT_TEXT_PARAGRAPH_FORMAT.to_string()
}

/// One row of the format table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatEntry {
    pub name: String,

    /// Extension without the dot; empty for formats that produce no file.
    #[serde(default)]
    pub extension: String,

    /// Display name; defaults to `name`.
    #[serde(default)]
    pub pretty_name: String,

    #[serde(default)]
    pub shortcut: String,

    #[serde(default)]
    pub viewer: String,

    #[serde(default)]
    pub editor: String,
}

/// One row of the converter table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterEntry {
    pub from: String,
    pub to: String,

    /// Shell command with `$$` tokens.
    pub command: String,

    /// Comma separated flags (`latex`, `needaux`, `resultdir=...`, ...).
    #[serde(default)]
    pub flags: String,
}

/// How external programs are run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Upper bound on LaTeX runs per conversion step.
    #[serde(default = "default_max_latex_passes")]
    pub max_latex_passes: u32,

    /// Kill a converter after this many seconds; unset waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Back-channel address substituted for `$$a`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_address: Option<String>,

    /// Parent directory for per-run scratch directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_latex_passes: default_max_latex_passes(),
            timeout_secs: None,
            socket_address: None,
            temp_dir: None,
        }
    }
}

fn default_max_latex_passes() -> u32 {
    docshift_core::convert::DEFAULT_MAX_LATEX_PASSES
}

impl DocshiftConfig {
    /// Find and load the configuration following the lookup order.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load_from_path(&local);
        }

        if let Some(user) = user_config_path() {
            if user.exists() {
                return Self::load_from_path(&user);
            }
        }

        debug!("No configuration file found, using the built-in table");
        Self::builtin()
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// The default table shipped with docshift.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(DEFAULT_CONFIG_TEMPLATE)
    }

    fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: DocshiftConfig = serde_yaml::from_str(content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Expand paths (~ -> home directory)
        config.expand_paths()?;

        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(name) = env::var("DOCSHIFT_NATIVE_FORMAT") {
            self.native_format = name;
        }

        if let Ok(passes) = env::var("DOCSHIFT_MAX_LATEX_PASSES")
            && let Ok(n) = passes.parse()
        {
            self.execution.max_latex_passes = n;
        }

        if let Ok(secs) = env::var("DOCSHIFT_TIMEOUT_SECS")
            && let Ok(n) = secs.parse()
        {
            self.execution.timeout_secs = Some(n);
        }

        if let Ok(path) = env::var("DOCSHIFT_TEMP_DIR") {
            self.execution.temp_dir = Some(PathBuf::from(path));
        }
    }

    /// Expand `~` in paths to the home directory.
    fn expand_paths(&mut self) -> Result<(), ConfigError> {
        let Some(temp_dir) = &self.execution.temp_dir else {
            return Ok(());
        };
        let Some(raw) = temp_dir.to_str() else {
            return Ok(());
        };
        if raw != "~" && !raw.starts_with("~/") {
            return Ok(());
        }

        let home = dirs::home_dir().ok_or_else(|| {
            ConfigError::ValidationError("Cannot determine home directory".into())
        })?;
        self.execution.temp_dir = Some(match raw.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => home,
        });
        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for format in &self.formats {
            if format.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Format with an empty name".into(),
                ));
            }
            if !seen.insert(format.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Format '{}' is defined twice",
                    format.name
                )));
            }
        }

        for converter in &self.converters {
            if converter.from.trim().is_empty() || converter.to.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Converter '{}' needs both 'from' and 'to'",
                    converter.command
                )));
            }
            ConverterFlags::parse(&converter.flags, "").map_err(|e| {
                ConfigError::ValidationError(format!(
                    "Converter {} -> {}: {}",
                    converter.from, converter.to, e
                ))
            })?;
        }

        if self.execution.max_latex_passes < 1 {
            return Err(ConfigError::ValidationError(
                "execution.max_latex_passes must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Build the format and converter registries from the tables.
    pub fn build_registries(&self) -> ConvertResult<(Formats, Converters)> {
        let mut formats = Formats::new();
        for entry in &self.formats {
            let pretty = if entry.pretty_name.is_empty() {
                &entry.name
            } else {
                &entry.pretty_name
            };
            formats.add_full(&entry.name, &entry.extension, pretty, &entry.shortcut);
            formats.set_viewer(&entry.name, &entry.viewer);
            formats.set_editor(&entry.name, &entry.editor);
        }

        let mut converters = Converters::new().with_native_format(self.native_format.clone());
        for entry in &self.converters {
            converters.add(
                &mut formats,
                &entry.from,
                &entry.to,
                &entry.command,
                &entry.flags,
            )?;
        }
        converters.build_graph(&formats)?;

        Ok((formats, converters))
    }

    pub fn execution_settings(&self) -> ExecutionSettings {
        ExecutionSettings {
            max_latex_passes: self.execution.max_latex_passes,
            address: self.execution.socket_address.clone(),
        }
    }

    pub fn loader_formats(&self) -> LoaderFormats {
        LoaderFormats {
            native: self.native_format.clone(),
            text: self.text_format.clone(),
            text_paragraphs: self.text_paragraph_format.clone(),
        }
    }

    /// Human readable description of where the configuration came from.
    pub fn source_description(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "built-in defaults".to_string(),
        }
    }
}

/// `docshift.yaml` in the user config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docshift").join(CONFIG_FILE_NAME))
}

/// Default configuration template with comments, written by `docshift init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# docshift.yaml - docshift configuration file

# ===============================================================================
# LOADER FORMATS
# ===============================================================================
# Formats that can be opened without conversion. Importing converts anything
# else to the first of these it can reach.

native_format: lyx
text_format: text
text_paragraph_format: textparagraph

# ===============================================================================
# FORMATS
# ===============================================================================
# name:         unique identifier used by converters and on the command line
# extension:    file extension without the dot; empty for formats that
#               produce no file (fax)
# pretty_name:  display name, also the sort key of `docshift formats`
# viewer/editor: command templates, see the token list below
#
# Names ending in a digit (pdf2, pdf3) are variants of the name without the
# digit and fall back to its viewer and editor.

formats:
  - { name: lyx, extension: lyx, pretty_name: LyX, shortcut: "", viewer: "", editor: "lyx $$i" }
  - { name: latex, extension: tex, pretty_name: LaTeX, shortcut: L, viewer: "", editor: "" }
  - { name: literate, extension: nw, pretty_name: NoWeb, shortcut: N, viewer: "", editor: "" }
  - { name: docbook, extension: sgml, pretty_name: DocBook, shortcut: B, viewer: "", editor: "" }
  - { name: text, extension: txt, pretty_name: Plain text, shortcut: T, viewer: "", editor: "" }
  - { name: textparagraph, extension: txt, pretty_name: Plain text (paragraphs), shortcut: "", viewer: "", editor: "" }
  - { name: dvi, extension: dvi, pretty_name: DVI, shortcut: D, viewer: "xdvi $$i", editor: "" }
  - { name: ps, extension: ps, pretty_name: PostScript, shortcut: t, viewer: "gv $$i", editor: "" }
  - { name: pdf, extension: pdf, pretty_name: PDF (ps2pdf), shortcut: P, viewer: "xdg-open $$i", editor: "" }
  - { name: pdf2, extension: pdf, pretty_name: PDF (pdflatex), shortcut: F, viewer: "", editor: "" }
  - { name: pdf3, extension: pdf, pretty_name: PDF (dvipdfm), shortcut: m, viewer: "", editor: "" }
  - { name: html, extension: html, pretty_name: HTML, shortcut: H, viewer: "xdg-open $$i", editor: "" }
  - { name: fax, extension: "", pretty_name: Fax, shortcut: "", viewer: "", editor: "" }

# ===============================================================================
# CONVERTERS
# ===============================================================================
# Commands run through the shell. Tokens:
#   $$i  input file        $$o  output file
#   $$b  input without extension
#   $$p  directory of the input file
#   $$a  back-channel address (execution.socket_address)
#
# Flags (comma separated):
#   latex          the step runs a LaTeX engine and is re-run until
#                  cross-references settle
#   needaux        needs .aux files from a LaTeX run
#   originaldir    run in the document's directory instead of the temp dir
#   resultdir=DIR  the result is a directory ($$b is the input base)
#   resultfile=F   main file inside resultdir (default index.<ext>)
#   parselog=CMD   filter stderr through CMD into a LaTeX-style log

converters:
  - { from: latex, to: dvi, command: "latex $$i", flags: latex }
  - { from: latex, to: pdf2, command: "pdflatex $$i", flags: latex }
  - { from: dvi, to: ps, command: "dvips -o $$o $$i", flags: "" }
  - { from: ps, to: pdf, command: "ps2pdf $$i $$o", flags: "" }
  - { from: dvi, to: pdf3, command: "dvipdfm $$i", flags: "" }
  - { from: ps, to: fax, command: "ksendfax $$i", flags: "" }
  - { from: ps, to: text, command: "ps2ascii $$i $$o", flags: "" }
  - { from: literate, to: latex, command: "noweave -delay -index $$i > $$o", flags: "" }
  - { from: latex, to: html, command: "htlatex $$i", flags: needaux }
  - { from: docbook, to: html, command: "sgmltools -b html $$i", flags: "resultdir" }
  - { from: latex, to: lyx, command: "tex2lyx -f $$i $$o", flags: "" }

# ===============================================================================
# EXECUTION
# ===============================================================================

execution:
  # Upper bound on LaTeX runs per conversion step
  max_latex_passes: 6

  # Kill a converter that runs longer than this many seconds
  # timeout_secs: 300

  # Value substituted for $$a
  # socket_address: "/tmp/docshift.sock"

  # Where per-run scratch directories are created (default: system temp dir)
  # Supports ~ for home directory
  # temp_dir: "~/.cache/docshift"
"#;
