//! Everything a command needs to run conversions: the loaded registries, a
//! shell runner, and console implementations of the document traits.

use crate::config::DocshiftConfig;
use crate::errors::DocshiftError;
use crate::output;
use async_trait::async_trait;
use console::Term;
use docshift_core::{
    ConversionObserver, ConvertError, Converters, Document, DocumentLoader, Exporter, Formats,
    Importer, OverwriteChoice, UserInterface, WriteParams, WriteReport,
};
use docshift_exec::ShellRunner;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Loaded configuration plus the registries built from it.
pub struct Session {
    pub config: DocshiftConfig,
    pub formats: Formats,
    pub converters: Converters,
    pub runner: ShellRunner,
}

impl Session {
    /// Locate the configuration and build the registries.
    pub fn load(config_path: Option<&Path>) -> Result<Self, DocshiftError> {
        let config = DocshiftConfig::locate(config_path)?;
        Self::from_config(config)
    }

    pub fn from_config(config: DocshiftConfig) -> Result<Self, DocshiftError> {
        let (formats, converters) = config.build_registries()?;
        let runner = ShellRunner::new().with_timeout(config.execution.timeout_secs);
        debug!(
            source = %config.source_description(),
            formats = formats.len(),
            converters = converters.len(),
            "Session ready"
        );

        Ok(Self {
            config,
            formats,
            converters,
            runner,
        })
    }

    /// Format of `file`: the explicit name if given, else guessed from the
    /// extension.
    pub fn resolve_format(&self, file: &Path, explicit: Option<&str>) -> Result<String, DocshiftError> {
        match explicit {
            Some(name) if self.formats.get_format(name).is_some() => Ok(name.to_string()),
            Some(name) => Err(ConvertError::UnknownFormat(name.to_string()).into()),
            None => self
                .formats
                .get_format_from_file(file)
                .map(|f| f.name.clone())
                .ok_or_else(|| DocshiftError::UnknownExtension(file.to_path_buf())),
        }
    }

    /// Fail unless `name` is a registered format.
    pub fn require_format(&self, name: &str) -> Result<(), DocshiftError> {
        if self.formats.get_format(name).is_none() {
            return Err(ConvertError::UnknownFormat(name.to_string()).into());
        }
        Ok(())
    }

    pub fn exporter<'a>(&'a self, observer: Option<&'a dyn ConversionObserver>) -> Exporter<'a> {
        Exporter::new(&self.formats, &self.converters, &self.runner)
            .with_settings(self.config.execution_settings())
            .with_text_format(self.config.text_format.clone())
            .with_observer(observer)
    }

    pub fn importer<'a>(&'a self, observer: Option<&'a dyn ConversionObserver>) -> Importer<'a> {
        Importer::new(&self.formats, &self.converters, &self.runner)
            .with_loaders(self.config.loader_formats())
            .with_settings(self.config.execution_settings())
            .with_observer(observer)
    }

    /// Fresh scratch directory for one run.
    ///
    /// With `keep` the directory survives the returned handle, for results
    /// that outlive the process (previews, `--temp` exports).
    pub fn scratch_dir(&self, keep: bool) -> Result<TempDir, DocshiftError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docshift-").keep(keep);

        let dir = match &self.config.execution.temp_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        debug!(dir = %dir.path().display(), keep, "Created scratch directory");
        Ok(dir)
    }
}

/// Absolute path of an existing input file.
pub fn existing_file(file: &Path) -> Result<PathBuf, DocshiftError> {
    if !file.is_file() {
        return Err(DocshiftError::FileNotFound(file.to_path_buf()));
    }
    Ok(std::path::absolute(file)?)
}

/// A file on disk exported as a document.
///
/// The file is its own markup: writing it in any backend copies its bytes
/// unchanged.
#[derive(Debug, Clone)]
pub struct FileDocument {
    file_path: PathBuf,
    temp_dir: PathBuf,
    format: String,
}

impl FileDocument {
    /// Create a new document for `file_path`, written as `format`.
    pub fn new(file_path: PathBuf, temp_dir: PathBuf, format: impl Into<String>) -> Self {
        Self {
            file_path,
            temp_dir,
            format: format.into(),
        }
    }
}

#[async_trait]
impl Document for FileDocument {
    fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    fn markup_format(&self) -> &str {
        &self.format
    }

    async fn write(
        &self,
        backend: &str,
        path: &Path,
        params: &WriteParams,
    ) -> std::io::Result<WriteReport> {
        debug!(
            source = %self.file_path.display(),
            destination = %path.display(),
            backend,
            flavor = %params.flavor,
            "Writing document"
        );
        tokio::fs::copy(&self.file_path, path).await?;
        Ok(WriteReport::default())
    }
}

/// Interprets a typed overwrite answer. Anything unrecognised cancels.
pub fn parse_overwrite_answer(answer: &str) -> OverwriteChoice {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => OverwriteChoice::Overwrite,
        "a" | "all" => OverwriteChoice::OverwriteAll,
        _ => OverwriteChoice::Cancel,
    }
}

/// Prompts on the terminal; `--yes` answers "overwrite all" up front.
#[derive(Clone, Default)]
pub struct ConsoleUi {
    assume_yes: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleUi {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            progress: None,
        }
    }

    /// Hide this progress bar while printing or prompting (builder pattern).
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    fn suspended<R>(progress: Option<&ProgressBar>, f: impl FnOnce() -> R) -> R {
        match progress {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }
}

#[async_trait]
impl UserInterface for ConsoleUi {
    fn message(&self, text: &str) {
        Self::suspended(self.progress.as_ref(), || output::info(text));
    }

    async fn confirm_overwrite(&self, path: &Path) -> OverwriteChoice {
        if self.assume_yes {
            return OverwriteChoice::OverwriteAll;
        }

        let term = Term::stderr();
        if !term.is_term() {
            output::warning(&format!(
                "{} exists and there is no terminal to ask; not overwriting",
                path.display()
            ));
            return OverwriteChoice::Cancel;
        }

        let prompt = format!(
            "The file {} already exists. Overwrite? [y]es, [a]ll, [N]o: ",
            path.display()
        );
        let progress = self.progress.clone();
        let answer = tokio::task::spawn_blocking(move || {
            Self::suspended(progress.as_ref(), || {
                term.write_str(&prompt)?;
                term.read_line()
            })
        })
        .await;

        match answer {
            Ok(Ok(line)) => parse_overwrite_answer(&line),
            _ => OverwriteChoice::Cancel,
        }
    }
}

/// Stands in for an editor: reports which file would be taken over.
#[derive(Debug, Clone, Default)]
pub struct ConsoleLoader;

#[async_trait]
impl DocumentLoader for ConsoleLoader {
    async fn open_native(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::metadata(path).await?;
        output::success(&format!("Ready to open {} as a document", path.display()));
        Ok(())
    }

    async fn insert_text(&self, path: &Path, paragraphs: bool) -> std::io::Result<()> {
        let text = tokio::fs::read_to_string(path).await?;
        let count = if paragraphs {
            text.split("\n\n").filter(|p| !p.trim().is_empty()).count()
        } else {
            text.lines().filter(|l| !l.trim().is_empty()).count()
        };
        output::success(&format!(
            "Ready to insert {} as text ({} paragraphs)",
            path.display(),
            count
        ));
        Ok(())
    }
}
