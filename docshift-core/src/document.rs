//! Collaborator interfaces implemented by the embedding application.
//!
//! docshift does not own a document model. Exporting asks a [`Document`] to
//! write itself in a backend format, overwrite decisions go through a
//! [`UserInterface`], and importing hands the converted file to a
//! [`DocumentLoader`].

use crate::converter::Flavor;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Options passed to the document writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteParams {
    /// LaTeX variant the rest of the conversion path expects
    pub flavor: Flavor,

    /// The backend file is itself the export result and is meant for humans
    pub nice: bool,
}

/// A file the written document references, copied along on export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalFile {
    /// Location of the file, normally inside the temp directory
    pub source: PathBuf,

    /// Path relative to the export destination directory
    pub export_name: PathBuf,
}

/// What the writer reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub external_files: Vec<ExternalFile>,
}

/// A document that can be exported.
#[async_trait]
pub trait Document: Send + Sync {
    /// Where the document lives; exports land next to it.
    fn file_path(&self) -> &Path;

    /// Scratch directory for this document's conversions.
    fn temp_dir(&self) -> &Path;

    /// Markup family the document is written in (`latex`, `literate`,
    /// `docbook`, `linuxdoc`, `text`, ...).
    fn markup_format(&self) -> &str;

    /// Whether the document class can be processed by a LaTeX engine.
    fn tex_class_available(&self) -> bool {
        true
    }

    /// Write the document in `backend` format to `path`.
    async fn write(
        &self,
        backend: &str,
        path: &Path,
        params: &WriteParams,
    ) -> std::io::Result<WriteReport>;
}

/// Answer to an overwrite prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteChoice {
    Overwrite,
    /// Overwrite this and every later file of the same batch
    OverwriteAll,
    Cancel,
}

/// User-facing side of export and import.
#[async_trait]
pub trait UserInterface: Send + Sync {
    /// Show a status message.
    fn message(&self, text: &str);

    /// Ask whether an existing file may be overwritten.
    async fn confirm_overwrite(&self, path: &Path) -> OverwriteChoice;
}

/// Takes over a file produced by an import.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Open a file in the native format as a new document.
    async fn open_native(&self, path: &Path) -> std::io::Result<()>;

    /// Create a new document from a plain text file. With `paragraphs`,
    /// blank-line separated blocks become paragraphs; otherwise every line
    /// break is kept.
    async fn insert_text(&self, path: &Path, paragraphs: bool) -> std::io::Result<()>;
}
