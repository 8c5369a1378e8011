//! Command runner trait and error types.
//!
//! Every external program docshift starts (converters, log parsers, viewers
//! and editors) goes through a [`CommandRunner`]. The production runner is
//! [`ShellRunner`](crate::shell::ShellRunner); tests substitute a recording
//! runner that never touches the system.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while running external commands.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Failed to spawn the process.
    #[error("Failed to spawn '{cmd}': {message}")]
    SpawnFailed { cmd: String, message: String },

    /// The process did not finish in time and was killed.
    #[error("'{cmd}' timed out after {secs} seconds")]
    Timeout { cmd: String, secs: u64 },

    /// I/O error while wiring up or collecting process streams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for command execution.
pub type ExecResult<T> = Result<T, ExecError>;

/// A fully substituted command line and the environment it runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Shell command line, tokens already substituted.
    pub command: String,

    /// Working directory of the child process.
    pub cwd: PathBuf,

    /// File fed to the child's stdin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<PathBuf>,

    /// File that receives the child's stderr instead of the captured buffer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_to: Option<PathBuf>,
}

impl Invocation {
    /// Create a new invocation running `command` in `cwd`.
    pub fn new(command: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            cwd: cwd.into(),
            stdin: None,
            stderr_to: None,
        }
    }

    /// Feed a file to stdin (builder pattern).
    pub fn with_stdin(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin = Some(path.as_ref().to_path_buf());
        self
    }

    /// Redirect stderr into a file (builder pattern).
    pub fn with_stderr_to(mut self, path: impl AsRef<Path>) -> Self {
        self.stderr_to = Some(path.as_ref().to_path_buf());
        self
    }
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failed output with the given exit code.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait for things that start external programs.
///
/// # Example
///
/// ```rust,ignore
/// use docshift_exec::{CommandRunner, Invocation, ExecResult};
///
/// async fn example(runner: &dyn CommandRunner) -> ExecResult<bool> {
///     let output = runner.run(&Invocation::new("latex paper.tex", "/tmp/work")).await?;
///     Ok(output.is_success())
/// }
/// ```
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Get the runner name (e.g., "shell").
    fn name(&self) -> &str;

    /// Run the command and wait for it to exit.
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// [`CommandOutput::code`].
    async fn run(&self, invocation: &Invocation) -> ExecResult<CommandOutput>;

    /// Start the command and return without waiting for it (viewers, editors).
    async fn spawn_detached(&self, invocation: &Invocation) -> ExecResult<()>;
}
