//! Execution of converter chains.
//!
//! [`Converters::convert`] walks the shortest path between two formats and
//! runs one external process per step (more for LaTeX, which is re-run until
//! its cross-references settle). Each step reads the previous step's output;
//! the final output is moved to the requested result name.

use crate::converter::{Converter, Flavor};
use crate::converters::Converters;
use crate::error::{ConvertError, ConvertResult};
use crate::files::{
    append_extension, change_extension, file_name_lossy, move_file, move_with_siblings,
    parent_dir, replace_dir, strip_extension,
};
use crate::format::Formats;
use docshift_exec::tokens::substitute_base;
use docshift_exec::{
    CommandOutput, CommandRunner, CommandTokens, Invocation, LogReport, needs_rerun, scan_log,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default bound on LaTeX passes per conversion step.
pub const DEFAULT_MAX_LATEX_PASSES: u32 = 6;

/// Name of the scratch file used when a step would overwrite its own input.
const IN_PLACE_SCRATCH: &str = "tmpfile.out";

/// Settings shared by every conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSettings {
    /// Upper bound on LaTeX runs per step
    pub max_latex_passes: u32,

    /// Back-channel address substituted for `$$a`
    pub address: Option<String>,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            max_latex_passes: DEFAULT_MAX_LATEX_PASSES,
            address: None,
        }
    }
}

/// Receives progress notifications while a conversion runs.
pub trait ConversionObserver: Send + Sync {
    /// A step is about to start. `step` counts from 1.
    fn step_started(&self, _step: usize, _total: usize, _converter: &Converter) {}

    /// A LaTeX step is about to start pass number `pass`.
    fn latex_pass(&self, _pass: u32) {}
}

/// Everything a conversion needs besides the registries.
pub struct ConversionContext<'a> {
    pub runner: &'a dyn CommandRunner,

    /// Working directory for `originaldir` converters
    pub document_dir: PathBuf,

    pub settings: ExecutionSettings,
    pub observer: Option<&'a dyn ConversionObserver>,
}

impl<'a> ConversionContext<'a> {
    /// Create a new context with default settings.
    pub fn new(runner: &'a dyn CommandRunner, document_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            document_dir: document_dir.into(),
            settings: ExecutionSettings::default(),
            observer: None,
        }
    }

    /// Set the execution settings (builder pattern).
    pub fn with_settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the progress observer (builder pattern).
    pub fn with_observer(mut self, observer: Option<&'a dyn ConversionObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn tokens(&self, input: &Path) -> CommandTokens {
        CommandTokens::for_input(input).with_address(self.settings.address.clone())
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Conversion {
    /// The produced file; `None` when the target is a dummy format.
    pub result_file: Option<PathBuf>,

    /// Directory holding the result for directory-producing converters.
    pub result_dir: Option<PathBuf>,

    /// Number of converter steps run
    pub steps: usize,

    pub flavor: Flavor,

    /// Logs scanned along the way, in step order
    pub logs: Vec<LogReport>,
}

impl Conversion {
    /// Total number of errors over all scanned logs.
    pub fn error_count(&self) -> usize {
        self.logs.iter().map(LogReport::error_count).sum()
    }
}

impl Converters {
    /// Convert `from_file` (in `from_format`) into `to_file_base` plus the
    /// extension of `to_format`.
    pub async fn convert(
        &self,
        formats: &Formats,
        ctx: &ConversionContext<'_>,
        from_file: &Path,
        to_file_base: &Path,
        from_format: &str,
        to_format: &str,
    ) -> ConvertResult<Conversion> {
        // steps run in the input's directory, so tokens must not be relative
        let from_file = std::path::absolute(from_file)?;
        let from_file = from_file.as_path();
        let to_file_base = std::path::absolute(to_file_base)?;
        let to_file_base = to_file_base.as_path();

        let target = formats
            .get_format(to_format)
            .ok_or_else(|| ConvertError::UnknownFormat(to_format.to_string()))?;
        if formats.get_format(from_format).is_none() {
            return Err(ConvertError::UnknownFormat(from_format.to_string()));
        }
        let to_file = change_extension(to_file_base, &target.extension);

        if from_format == to_format {
            if from_file != to_file {
                move_with_siblings(from_file, &to_file, false).await?;
            }
            return Ok(Conversion {
                result_file: Some(to_file),
                ..Default::default()
            });
        }

        let path = self.get_path(formats, from_format, to_format);
        if path.is_empty() {
            return Err(ConvertError::NoConversionPath {
                from: from_format.to_string(),
                to: to_format.to_string(),
            });
        }

        info!(
            from = from_format,
            to = to_format,
            steps = path.len(),
            file = %from_file.display(),
            "Converting"
        );

        let from_base = strip_extension(from_file);
        let to_base = strip_extension(&to_file);
        let total = path.len();

        let mut conversion = Conversion {
            steps: total,
            flavor: self.flavor(&path),
            ..Default::default()
        };
        let mut outfile = from_file.to_path_buf();
        let mut ran_latex = false;
        let mut last: Option<&Converter> = None;

        for (step, index) in path.iter().enumerate() {
            let conv = self
                .get(index)
                .ok_or_else(|| ConvertError::NoConversionPath {
                    from: from_format.to_string(),
                    to: to_format.to_string(),
                })?;
            if let Some(observer) = ctx.observer {
                observer.step_started(step + 1, total, conv);
            }

            let infile = outfile;
            let step_result = match &conv.flags.result_dir {
                Some(dir) => {
                    let dir = result_dir_path(dir, &from_base, from_file);
                    let file = conv.flags.result_file.as_deref().unwrap_or_default();
                    dir.join(substitute_base(file, &file_name_lossy(&from_base)))
                }
                None => change_extension(from_file, formats.extension(&conv.to)),
            };

            // a step may not write over its own input
            let in_place = infile == step_result;
            let step_out = if in_place {
                parent_dir(&infile).join(IN_PLACE_SCRATCH)
            } else {
                step_result.clone()
            };

            let cwd = if conv.flags.original_dir {
                ctx.document_dir.clone()
            } else {
                parent_dir(&infile)
            };
            let command = ctx.tokens(&infile).with_output(&step_out).substitute(&conv.command);

            debug!(
                step = step + 1,
                from = %conv.from,
                to = %conv.to,
                %command,
                cwd = %cwd.display(),
                "Running conversion step"
            );

            if conv.is_latex() {
                ran_latex = true;
                let report = self
                    .run_latex(ctx, index, conv, &command, &cwd, &infile)
                    .await?;
                conversion.logs.push(report);
            } else {
                if conv.flags.need_aux
                    && !ran_latex
                    && let Some(latex) = self.latex_command()
                {
                    ran_latex = true;
                    let aux_command = ctx.tokens(from_file).substitute(latex);
                    debug!(command = %aux_command, "Refreshing .aux files");
                    let invocation = Invocation::new(aux_command, parent_dir(from_file));
                    let output = ctx.runner.run(&invocation).await?;
                    check_exit(&output, index, conv, &invocation.command)?;
                }

                let stderr_file = conv
                    .flags
                    .parse_log
                    .as_ref()
                    .map(|_| append_extension(&infile, "out"));
                let mut invocation = Invocation::new(&command, &cwd);
                if let Some(stderr_file) = &stderr_file {
                    invocation = invocation.with_stderr_to(stderr_file);
                }
                let output = ctx.runner.run(&invocation).await?;

                if let (Some(parser), Some(stderr_file)) = (&conv.flags.parse_log, &stderr_file) {
                    let log_file = change_extension(&infile, "log");
                    let report = self
                        .scrape_log(ctx, parser, &cwd, stderr_file, Some(&log_file))
                        .await?;
                    conversion.logs.push(report);
                }
                check_exit(&output, index, conv, &command)?;
            }

            if in_place {
                move_file(&step_out, &step_result).await?;
            }
            outfile = step_result;
            last = Some(conv);
        }

        let Some(last) = last else {
            return Ok(conversion);
        };

        if formats.get_format(&last.to).is_some_and(|f| f.is_dummy()) {
            debug!(to = %last.to, "Dummy target, no result file");
            return Ok(conversion);
        }

        match &last.flags.result_dir {
            Some(dir) => {
                let from_dir = result_dir_path(dir, &from_base, from_file);
                let to_dir = result_dir_path(dir, &to_base, from_file);
                if from_dir != to_dir {
                    replace_dir(&from_dir, &to_dir).await?;
                }
                let file = last.flags.result_file.as_deref().unwrap_or_default();
                conversion.result_file =
                    Some(to_dir.join(substitute_base(file, &file_name_lossy(&from_base))));
                conversion.result_dir = Some(to_dir);
            }
            None => {
                move_with_siblings(&outfile, &to_file, last.is_latex()).await?;
                conversion.result_file = Some(to_file);
            }
        }

        Ok(conversion)
    }

    /// Run a LaTeX step until its log stops asking for reruns.
    async fn run_latex(
        &self,
        ctx: &ConversionContext<'_>,
        index: usize,
        conv: &Converter,
        command: &str,
        cwd: &Path,
        infile: &Path,
    ) -> ConvertResult<LogReport> {
        let log_file = change_extension(infile, "log");
        let max_passes = ctx.settings.max_latex_passes.max(1);
        let invocation = Invocation::new(command, cwd);
        let mut pass = 0;

        let log_text = loop {
            pass += 1;
            if let Some(observer) = ctx.observer {
                observer.latex_pass(pass);
            }

            let output = ctx.runner.run(&invocation).await?;
            check_exit(&output, index, conv, command)?;

            match tokio::fs::read_to_string(&log_file).await {
                Ok(text) if needs_rerun(&text) && pass < max_passes => {
                    debug!(pass, "LaTeX requested another pass");
                }
                Ok(text) => {
                    if needs_rerun(&text) {
                        warn!(passes = pass, "LaTeX still requests a rerun, giving up");
                    }
                    break Some(text);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(log = %log_file.display(), "LaTeX wrote no log file");
                    break None;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let Some(text) = log_text else {
            return Ok(LogReport {
                source: log_file,
                ..Default::default()
            });
        };

        match &conv.flags.parse_log {
            Some(parser) => self.scrape_log(ctx, parser, cwd, &log_file, None).await,
            None => Ok(scan_log(&log_file, &text)),
        }
    }

    /// Run a log parser over `input` and scan what it prints.
    async fn scrape_log(
        &self,
        ctx: &ConversionContext<'_>,
        parser: &str,
        cwd: &Path,
        input: &Path,
        write_to: Option<&Path>,
    ) -> ConvertResult<LogReport> {
        let scrape_error = |reason: String| ConvertError::LogScrapeError {
            command: parser.to_string(),
            reason,
        };

        let invocation = Invocation::new(parser, cwd).with_stdin(input);
        let output = ctx
            .runner
            .run(&invocation)
            .await
            .map_err(|e| scrape_error(e.to_string()))?;
        if !output.is_success() {
            return Err(scrape_error(format!(
                "exited with code {:?}",
                output.code
            )));
        }

        if let Some(path) = write_to {
            tokio::fs::write(path, &output.stdout)
                .await
                .map_err(|e| scrape_error(e.to_string()))?;
        }

        Ok(scan_log(write_to.unwrap_or(input), &output.stdout))
    }
}

/// Result directory of a converter, `$$b` replaced by `base`; relative
/// directories are anchored next to `anchor`.
fn result_dir_path(template: &str, base: &Path, anchor: &Path) -> PathBuf {
    let dir = PathBuf::from(substitute_base(template, &base.to_string_lossy()));
    if dir.is_relative() {
        parent_dir(anchor).join(dir)
    } else {
        dir
    }
}

fn check_exit(
    output: &CommandOutput,
    index: usize,
    conv: &Converter,
    command: &str,
) -> ConvertResult<()> {
    if output.is_success() {
        return Ok(());
    }
    warn!(
        index,
        from = %conv.from,
        to = %conv.to,
        code = ?output.code,
        stderr = %output.stderr.trim(),
        "Converter failed"
    );
    Err(ConvertError::ConverterFailed {
        index,
        from: conv.from.clone(),
        to: conv.to.clone(),
        command: command.to_string(),
        exit_code: output.code,
    })
}
