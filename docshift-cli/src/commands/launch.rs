//! Implementation of the `docshift view` and `docshift edit` commands.
//!
//! Both start the configured program for the file's format and return
//! without waiting for it. Child formats without their own program use
//! their parent's (`pdf2` falls back to `pdf`).

use crate::errors::DocshiftError;
use crate::output;
use crate::session::{Session, existing_file};
use std::path::PathBuf;

/// Which program to start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LaunchMode {
    #[default]
    View,
    Edit,
}

/// Options for the `docshift view` and `docshift edit` commands.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub config: Option<PathBuf>,
    pub file: PathBuf,
    /// Format of `file`; guessed from its extension when absent.
    pub format: Option<String>,
    pub mode: LaunchMode,
}

/// Run the `docshift view` or `docshift edit` command.
pub async fn run_launch(options: LaunchOptions) -> Result<(), DocshiftError> {
    let session = Session::load(options.config.as_deref())?;
    let file = existing_file(&options.file)?;
    let format = session.resolve_format(&file, options.format.as_deref())?;
    let address = session.config.execution.socket_address.as_deref();

    match options.mode {
        LaunchMode::View => {
            session
                .formats
                .view(&session.runner, &file, &format, address)
                .await?
        }
        LaunchMode::Edit => {
            session
                .formats
                .edit(&session.runner, &file, &format, address)
                .await?
        }
    }

    output::success(&format!(
        "Opened {} as {}",
        file.display(),
        session.formats.pretty_name(&format)
    ));
    Ok(())
}
