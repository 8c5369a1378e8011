//! Implementation of the `docshift init` command.
//!
//! This command writes the default `docshift.yaml`, a LyX-style table of
//! formats and converters with comments explaining each section.
//!
//! # Usage
//!
//! ```bash
//! # Create docshift.yaml in current directory
//! docshift init
//!
//! # Specify output path
//! docshift init --output ~/.config/docshift/docshift.yaml
//!
//! # Overwrite existing file
//! docshift init --force
//! ```

use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::config::{CONFIG_FILE_NAME, DEFAULT_CONFIG_TEMPLATE};
use crate::output;

/// Errors that can occur during initialization.
#[derive(Debug, Error)]
pub enum InitError {
    /// Configuration file already exists and --force was not specified.
    #[error("Configuration file already exists: {path}. Use --force to overwrite.")]
    FileExists { path: String },

    /// Failed to write the configuration file.
    #[error("Failed to write configuration file: {0}")]
    WriteError(#[from] std::io::Error),
}

/// Options for the `docshift init` command.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Output path for the configuration file.
    pub output: Option<String>,
    /// Whether to overwrite an existing file.
    pub force: bool,
}

/// Run the `docshift init` command.
///
/// Returns an error if the file already exists (and `--force` was not
/// specified) or if writing failed.
pub fn run_init(options: InitOptions) -> Result<(), InitError> {
    let output_path = options
        .output
        .unwrap_or_else(|| CONFIG_FILE_NAME.to_string());
    let path = Path::new(&output_path);

    if path.exists() && !options.force {
        return Err(InitError::FileExists { path: output_path });
    }

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())?;

    output::success(&format!("Created configuration file: {}", output_path));
    output::info("");
    output::info("Next steps:");
    output::info(&format!(
        "  1. Edit {} to match the converters installed on this machine",
        output_path
    ));
    output::info("  2. Check the routes: docshift targets latex");
    output::info("  3. Run: docshift export paper.tex --to pdf");

    Ok(())
}
