//! External process layer for docshift.
//!
//! This crate starts the external programs that do the actual format
//! conversion work (LaTeX engines, dvips, ghostscript, ...) and interprets
//! what they leave behind.
//!
//! # Architecture
//!
//! Commands come from configuration as templates containing `$$` tokens.
//! [`CommandTokens`] fills them in, an [`Invocation`] pairs the command line
//! with its working directory and redirections, and a [`CommandRunner`]
//! starts it:
//!
//! - [`ShellRunner`] runs through the platform shell
//! - `testing::RecordingRunner` records invocations for tests (behind the
//!   `testing` feature)
//!
//! [`latex_log`] scans engine logs for errors, warnings and rerun requests.
//!
//! # Example
//!
//! ```rust,ignore
//! use docshift_exec::{CommandRunner, CommandTokens, Invocation, ShellRunner};
//!
//! let tokens = CommandTokens::for_input("/work/paper.dvi").with_output("/work/paper.ps");
//! let invocation = Invocation::new(tokens.substitute("dvips -o $$o $$i"), "/work");
//!
//! let output = ShellRunner::new().run(&invocation).await?;
//! assert!(output.is_success());
//! ```

pub mod latex_log;
pub mod runner;
pub mod shell;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tokens;

// Re-export main types for convenience
pub use latex_log::{LogEntry, LogReport, Severity, needs_rerun, scan_log};
pub use runner::{CommandOutput, CommandRunner, ExecError, ExecResult, Invocation};
pub use shell::ShellRunner;
pub use tokens::CommandTokens;
