//! Test doubles for code that starts external programs.
//!
//! # Example
//!
//! ```rust,ignore
//! use docshift_exec::testing::RecordingRunner;
//!
//! let runner = RecordingRunner::new()
//!     .fail_when("dvips", 1)
//!     .with_handler(|invocation| {
//!         std::fs::write(invocation.cwd.join("doc.dvi"), "dvi")
//!     });
//!
//! // Drive a conversion with `&runner`...
//!
//! assert_eq!(runner.commands().await, vec!["latex doc.tex", "dvips doc.dvi"]);
//! ```

use crate::runner::{CommandOutput, CommandRunner, ExecError, ExecResult, Invocation};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

type Handler = Arc<dyn Fn(&Invocation) -> std::io::Result<()> + Send + Sync>;

/// Runner that records every invocation instead of starting processes.
///
/// Provides controllable behavior for testing:
/// - Record invocations for assertions
/// - Scripted exit codes and stdout, matched by command substring
/// - An optional handler that simulates the program's side effects
#[derive(Clone, Default)]
pub struct RecordingRunner {
    invocations: Arc<RwLock<Vec<Invocation>>>,
    detached: Arc<RwLock<Vec<Invocation>>>,
    exit_codes: Vec<(String, i32)>,
    stdout: Vec<(String, String)>,
    handler: Option<Handler>,
}

impl std::fmt::Debug for RecordingRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingRunner")
            .field("exit_codes", &self.exit_codes)
            .field("stdout", &self.stdout)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl RecordingRunner {
    /// Create a new runner where every command succeeds silently.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `pattern` exit with `code` (builder pattern).
    pub fn fail_when(mut self, pattern: impl Into<String>, code: i32) -> Self {
        self.exit_codes.push((pattern.into(), code));
        self
    }

    /// Commands containing `pattern` print `stdout` (builder pattern).
    pub fn print_when(mut self, pattern: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.stdout.push((pattern.into(), stdout.into()));
        self
    }

    /// Run `handler` for every waited-on invocation (builder pattern).
    ///
    /// The handler runs before the scripted exit code is applied, so it can
    /// create the files a real program would have written.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> std::io::Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Get all recorded waited-on invocations.
    pub async fn invocations(&self) -> Vec<Invocation> {
        self.invocations.read().await.clone()
    }

    /// Get the command lines of all waited-on invocations.
    pub async fn commands(&self) -> Vec<String> {
        self.invocations
            .read()
            .await
            .iter()
            .map(|i| i.command.clone())
            .collect()
    }

    /// Get all recorded detached invocations.
    pub async fn detached(&self) -> Vec<Invocation> {
        self.detached.read().await.clone()
    }

    /// Get the number of processes "started", detached ones included.
    pub async fn process_count(&self) -> usize {
        self.invocations.read().await.len() + self.detached.read().await.len()
    }

    fn scripted<'a, T>(table: &'a [(String, T)], command: &str) -> Option<&'a T> {
        table
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, value)| value)
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    fn name(&self) -> &str {
        "recording"
    }

    async fn run(&self, invocation: &Invocation) -> ExecResult<CommandOutput> {
        self.invocations.write().await.push(invocation.clone());

        if let Some(handler) = &self.handler {
            handler(invocation).map_err(ExecError::Io)?;
        }

        let code = Self::scripted(&self.exit_codes, &invocation.command)
            .copied()
            .unwrap_or(0);
        let stdout = Self::scripted(&self.stdout, &invocation.command)
            .cloned()
            .unwrap_or_default();

        Ok(CommandOutput {
            code: Some(code),
            stdout,
            stderr: String::new(),
        })
    }

    async fn spawn_detached(&self, invocation: &Invocation) -> ExecResult<()> {
        self.detached.write().await.push(invocation.clone());
        Ok(())
    }
}
