//! Runner that hands command lines to the platform shell.

use crate::runner::{CommandOutput, CommandRunner, ExecError, ExecResult, Invocation};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use tracing::debug;

/// Runs commands through `sh -c` (`cmd /C` on Windows).
///
/// Each child gets its own working directory; the working directory of the
/// docshift process itself is never touched.
///
/// # Example
///
/// ```rust,ignore
/// use docshift_exec::{ShellRunner, Invocation, CommandRunner};
///
/// let runner = ShellRunner::new().with_timeout(Some(120));
/// let output = runner.run(&Invocation::new("dvips doc.dvi", "/tmp/work")).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    /// Timeout in seconds for each process, `None` waits forever.
    pub timeout_secs: Option<u64>,
}

impl ShellRunner {
    /// Create a new shell runner without a timeout.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Set the per-process timeout in seconds (builder pattern).
    pub fn with_timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn shell_command(command_line: &str) -> Command {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        };
        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.arg("-c");
            cmd
        };
        cmd.arg(command_line);
        cmd
    }

    async fn open_stdin(path: Option<&Path>) -> ExecResult<Stdio> {
        match path {
            Some(path) => {
                let file = tokio::fs::File::open(path).await?;
                Ok(Stdio::from(file.into_std().await))
            }
            None => Ok(Stdio::null()),
        }
    }

    async fn open_stderr(path: Option<&Path>) -> ExecResult<Stdio> {
        match path {
            Some(path) => {
                let file = tokio::fs::File::create(path).await?;
                Ok(Stdio::from(file.into_std().await))
            }
            None => Ok(Stdio::piped()),
        }
    }

    fn spawn_failed(invocation: &Invocation, e: std::io::Error) -> ExecError {
        ExecError::SpawnFailed {
            cmd: invocation.command.clone(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    fn name(&self) -> &str {
        "shell"
    }

    async fn run(&self, invocation: &Invocation) -> ExecResult<CommandOutput> {
        debug!(
            command = %invocation.command,
            cwd = %invocation.cwd.display(),
            "Running command"
        );

        let stdin = Self::open_stdin(invocation.stdin.as_deref()).await?;
        let stderr = Self::open_stderr(invocation.stderr_to.as_deref()).await?;

        let mut cmd = Self::shell_command(&invocation.command);
        cmd.current_dir(&invocation.cwd)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(stderr)
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| Self::spawn_failed(invocation, e))?;

        let output = match self.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), child.wait_with_output())
                .await
                .map_err(|_| ExecError::Timeout {
                    cmd: invocation.command.clone(),
                    secs,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| Self::spawn_failed(invocation, e))?;

        debug!(code = ?output.status.code(), "Command finished");

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn spawn_detached(&self, invocation: &Invocation) -> ExecResult<()> {
        debug!(
            command = %invocation.command,
            cwd = %invocation.cwd.display(),
            "Launching detached command"
        );

        Self::shell_command(&invocation.command)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Self::spawn_failed(invocation, e))?;

        Ok(())
    }
}
