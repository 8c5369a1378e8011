//! Importing foreign files as documents.
//!
//! Only three formats can be loaded directly: the native format and two
//! flavors of plain text. Anything else is first converted to the closest
//! of them.

use crate::convert::{Conversion, ConversionContext, ConversionObserver, ExecutionSettings};
use crate::converters::{Converters, DEFAULT_NATIVE_FORMAT};
use crate::document::DocumentLoader;
use crate::error::{ConvertError, ConvertResult};
use crate::exporter::DEFAULT_TEXT_FORMAT;
use crate::files::{parent_dir, strip_extension};
use crate::format::{Format, Formats};
use docshift_exec::CommandRunner;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the paragraph-preserving text format unless configured otherwise.
pub const DEFAULT_TEXT_PARAGRAPH_FORMAT: &str = "textparagraph";

/// Ways a file can be taken over without conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Loader {
    /// Opened as a document in the native format
    Native,
    /// Inserted as text, one paragraph per line
    Text,
    /// Inserted as text, blank lines separate paragraphs
    TextParagraphs,
}

impl Loader {
    /// Loaders in order of preference.
    pub const ALL: [Loader; 3] = [Loader::Native, Loader::Text, Loader::TextParagraphs];
}

/// Format names backing each loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderFormats {
    pub native: String,
    pub text: String,
    pub text_paragraphs: String,
}

impl Default for LoaderFormats {
    fn default() -> Self {
        Self {
            native: DEFAULT_NATIVE_FORMAT.to_string(),
            text: DEFAULT_TEXT_FORMAT.to_string(),
            text_paragraphs: DEFAULT_TEXT_PARAGRAPH_FORMAT.to_string(),
        }
    }
}

impl LoaderFormats {
    pub fn format_name(&self, loader: Loader) -> &str {
        match loader {
            Loader::Native => &self.native,
            Loader::Text => &self.text,
            Loader::TextParagraphs => &self.text_paragraphs,
        }
    }

    /// The loader reading `format` directly, if any.
    pub fn loader_for(&self, format: &str) -> Option<Loader> {
        Loader::ALL
            .into_iter()
            .find(|loader| self.format_name(*loader) == format)
    }
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imported {
    pub loader: Loader,

    /// File handed to the loader
    pub loaded_file: PathBuf,

    /// `None` when the file was already in a loader format
    pub conversion: Option<Conversion>,
}

/// Converts foreign files into something a [`DocumentLoader`] can take.
pub struct Importer<'a> {
    formats: &'a Formats,
    converters: &'a Converters,
    runner: &'a dyn CommandRunner,
    loaders: LoaderFormats,
    settings: ExecutionSettings,
    observer: Option<&'a dyn ConversionObserver>,
}

impl<'a> Importer<'a> {
    /// Create a new importer with the default loader formats.
    pub fn new(
        formats: &'a Formats,
        converters: &'a Converters,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            formats,
            converters,
            runner,
            loaders: LoaderFormats::default(),
            settings: ExecutionSettings::default(),
            observer: None,
        }
    }

    /// Set the loader format names (builder pattern).
    pub fn with_loaders(mut self, loaders: LoaderFormats) -> Self {
        self.loaders = loaders;
        self
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

    pub fn loaders(&self) -> &LoaderFormats {
        &self.loaders
    }

    /// The first loader whose format can be produced from `format`.
    pub fn loader_reachable_from(&self, format: &str) -> Option<Loader> {
        Loader::ALL.into_iter().find(|loader| {
            self.converters
                .is_reachable(self.formats, format, self.loaders.format_name(*loader))
        })
    }

    /// Import `file`, written in `format`, through `loader`.
    ///
    /// A converted file is written next to `file`, named after it with the
    /// loader format's extension.
    pub async fn import(
        &self,
        loader: &dyn DocumentLoader,
        file: &Path,
        format: &str,
    ) -> ConvertResult<Imported> {
        if self.formats.get_format(format).is_none() {
            return Err(ConvertError::UnknownFormat(format.to_string()));
        }
        if !file.exists() {
            return Err(ConvertError::FileNotFound(file.to_path_buf()));
        }
        let file = std::path::absolute(file)?;
        let file = file.as_path();

        let (kind, loaded_file, conversion) = match self.loaders.loader_for(format) {
            Some(kind) => (kind, file.to_path_buf(), None),
            None => {
                let kind = self.loader_reachable_from(format).ok_or_else(|| {
                    ConvertError::NoConversionPath {
                        from: format.to_string(),
                        to: self.loaders.native.clone(),
                    }
                })?;
                let target = self.loaders.format_name(kind);

                info!(file = %file.display(), from = format, to = target, "Importing");

                let ctx = ConversionContext::new(self.runner, parent_dir(file))
                    .with_settings(self.settings.clone())
                    .with_observer(self.observer);
                let conversion = self
                    .converters
                    .convert(
                        self.formats,
                        &ctx,
                        file,
                        &strip_extension(file),
                        format,
                        target,
                    )
                    .await?;
                let loaded = conversion
                    .result_file
                    .clone()
                    .ok_or_else(|| ConvertError::FileNotFound(strip_extension(file)))?;
                (kind, loaded, Some(conversion))
            }
        };

        let load_failed = |error| ConvertError::LoadFailed {
            path: loaded_file.clone(),
            error,
        };
        match kind {
            Loader::Native => loader.open_native(&loaded_file).await,
            Loader::Text => loader.insert_text(&loaded_file, false).await,
            Loader::TextParagraphs => loader.insert_text(&loaded_file, true).await,
        }
        .map_err(load_failed)?;

        info!(file = %loaded_file.display(), loader = ?kind, "Imported");
        Ok(Imported {
            loader: kind,
            loaded_file,
            conversion,
        })
    }

    /// Formats that can be imported, without duplicates.
    pub fn importable_formats(&self) -> Vec<&'a Format> {
        let targets: Vec<&str> = Loader::ALL
            .iter()
            .map(|loader| self.loaders.format_name(*loader))
            .collect();
        self.converters.get_reachable_to_any(self.formats, &targets)
    }
}
