//! Error types for the docshift-core crate.

use docshift_exec::ExecError;
use docshift_graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting, exporting or importing.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A format name that is not registered.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// A converter flag string that cannot be parsed.
    #[error("Invalid converter flag '{flag}': {reason}")]
    InvalidFlag { flag: String, reason: String },

    /// No chain of converters leads from one format to the other.
    #[error("No conversion path from {from} to {to}")]
    NoConversionPath { from: String, to: String },

    /// One step of a conversion chain exited unsuccessfully.
    #[error("Converter #{index} ({from} -> {to}) failed with exit code {}: {command}", exit_code_text(.exit_code))]
    ConverterFailed {
        index: usize,
        from: String,
        to: String,
        command: String,
        exit_code: Option<i32>,
    },

    #[error("No viewer defined for format {0}")]
    NoViewer(String),

    #[error("No editor defined for format {0}")]
    NoEditor(String),

    /// The log post-processor could not be run.
    #[error("Failed to process the log of '{command}': {reason}")]
    LogScrapeError { command: String, reason: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to copy {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to move {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The user cancelled an export at an overwrite prompt.
    #[error("Export cancelled")]
    ExportCancelled,

    /// The document writer failed to produce the backend file.
    #[error("Failed to write {path} as {backend}")]
    WriteFailed {
        backend: String,
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The document loader failed to take over an imported file.
    #[error("Failed to load {path}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_code_text(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Result type for core operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
