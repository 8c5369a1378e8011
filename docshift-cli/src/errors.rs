use crate::config::ConfigError;
use docshift_core::ConvertError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocshiftError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Cannot tell the format of {0} from its extension")]
    UnknownExtension(PathBuf),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocshiftError {
    /// Get a suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            DocshiftError::Config(ConfigError::NotFound(_)) => Some(
                "Run 'docshift init' to create a configuration file, or use --config to specify a path",
            ),
            DocshiftError::Config(ConfigError::ParseError(_)) => {
                Some("Check the YAML syntax of the configuration file.")
            }
            DocshiftError::Config(_) => None,
            DocshiftError::Convert(ConvertError::UnknownFormat(_)) => {
                Some("Run 'docshift formats' to list the configured formats.")
            }
            DocshiftError::Convert(ConvertError::NoConversionPath { .. }) => Some(
                "Run 'docshift targets <FORMAT>' to see what can be produced, or add a converter to the configuration.",
            ),
            DocshiftError::Convert(ConvertError::ConverterFailed { .. }) => Some(
                "Re-run with --verbose to see the converter output, and check that the program is installed.",
            ),
            DocshiftError::Convert(ConvertError::NoViewer(_) | ConvertError::NoEditor(_)) => {
                Some("Set 'viewer' or 'editor' for the format in the configuration file.")
            }
            DocshiftError::Convert(ConvertError::ExportCancelled) => {
                Some("Pass --yes to overwrite existing files without asking.")
            }
            DocshiftError::Convert(_) => None,
            DocshiftError::UnknownExtension(_) => {
                Some("Name the format explicitly with --from.")
            }
            DocshiftError::FileNotFound(_) | DocshiftError::Json(_) | DocshiftError::Io(_) => {
                None
            }
        }
    }

    /// Format error with suggestion for CLI output
    pub fn format_for_cli(&self) -> String {
        let mut output = format!("Error: {}", self);

        if let Some(suggestion) = self.suggestion() {
            output.push_str(&format!("\n\nSuggestion: {}", suggestion));
        }

        output
    }
}
