//! docshift CLI library.
//!
//! Configuration loading, console output and the command implementations
//! behind the `docshift` binary. It's exposed as a library to enable
//! integration testing.
//!
//! # Modules
//!
//! - [`config`]: `docshift.yaml` loading, validation and registry building
//! - [`session`]: Loaded registries plus console implementations of the
//!   document, user interface and loader traits
//! - [`commands`]: One module per subcommand
//! - [`errors`]: The CLI error type with fix suggestions
//! - [`output`] and [`progress`]: Styled status lines and the step spinner

pub mod commands;
pub mod config;
pub mod errors;
pub mod output;
pub mod progress;
pub mod session;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConverterEntry, DocshiftConfig, ExecutionConfig, FormatEntry};
pub use errors::DocshiftError;
pub use session::{ConsoleLoader, ConsoleUi, FileDocument, Session};
