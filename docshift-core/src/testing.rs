//! Test doubles for the collaborator interfaces.
//!
//! These stand in for the embedding application in unit tests and in
//! downstream crates that exercise export and import without a real
//! document model or terminal.

use crate::converters::Converters;
use crate::document::{
    Document, DocumentLoader, ExternalFile, OverwriteChoice, UserInterface, WriteParams,
    WriteReport,
};
use crate::error::ConvertResult;
use crate::format::Formats;
use async_trait::async_trait;
use docshift_exec::Invocation;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A small LaTeX-centred registry:
///
/// ```text
/// latex -> dvi -> ps -> pdf
///              \-> fax (dummy)
/// latex -> pdf2, latex -> html (directory result), latex -> lyx
/// ```
///
/// Formats `text` and `textparagraph` exist without converters.
pub fn sample_registry() -> ConvertResult<(Formats, Converters)> {
    let mut formats = Formats::new();
    for (name, extension, pretty) in [
        ("lyx", "lyx", "LyX"),
        ("latex", "tex", "LaTeX"),
        ("dvi", "dvi", "DVI"),
        ("ps", "ps", "PostScript"),
        ("pdf", "pdf", "PDF (ps2pdf)"),
        ("pdf2", "pdf", "PDF (pdflatex)"),
        ("html", "html", "HTML"),
        ("fax", "", "Fax"),
        ("text", "txt", "Plain text"),
        ("textparagraph", "txt", "Plain text (paragraphs)"),
    ] {
        formats.add_full(name, extension, pretty, "");
    }
    formats.set_viewer("pdf", "xpdf $$i");
    formats.set_viewer("dvi", "xdvi $$i");

    let mut converters = Converters::new();
    let table = [
        ("latex", "dvi", "latex $$i", "latex"),
        ("dvi", "ps", "dvips -o $$o $$i", ""),
        ("ps", "pdf", "ps2pdf $$i $$o", ""),
        ("ps", "fax", "sendfax $$i", ""),
        ("latex", "pdf2", "pdflatex $$i", "latex"),
        ("latex", "html", "htlatex $$i", "resultdir=$$b.html.d,needaux"),
        ("latex", "lyx", "tex2lyx $$i $$o", ""),
    ];
    for (from, to, command, flags) in table {
        converters.add(&mut formats, from, to, command, flags)?;
    }
    converters.build_graph(&formats)?;

    Ok((formats, converters))
}

/// Pretend to be the programs named in [`sample_registry`].
///
/// Meant as a [`docshift_exec::testing::RecordingRunner`] handler: finds the
/// input argument by extension and writes what the real program would, a
/// LaTeX log included. Unknown programs do nothing.
pub fn simulate_tools(invocation: &Invocation) -> std::io::Result<()> {
    let mut words = invocation.command.split_whitespace();
    let program = words.next().unwrap_or_default();
    let (input_extension, output_extension) = match program {
        "latex" => ("tex", "dvi"),
        "pdflatex" => ("tex", "pdf"),
        "htlatex" => ("tex", "html"),
        "dvips" => ("dvi", "ps"),
        "ps2pdf" => ("ps", "pdf"),
        "tex2lyx" => ("tex", "lyx"),
        _ => return Ok(()),
    };
    let Some(input) = words
        .map(Path::new)
        .find(|word| word.extension().is_some_and(|e| e == input_extension))
    else {
        return Ok(());
    };

    if program == "htlatex" {
        let dir = PathBuf::from(format!("{}.html.d", input.with_extension("").display()));
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("index.html"), "<html></html>")?;
    } else {
        std::fs::write(input.with_extension(output_extension), program)?;
    }
    if program.ends_with("latex") {
        std::fs::write(input.with_extension("log"), "Output written.\n")?;
    }
    Ok(())
}

/// A user interface with scripted overwrite answers.
///
/// Answers are handed out in order; once they run out every further prompt
/// is answered with [`OverwriteChoice::Cancel`].
#[derive(Debug, Default)]
pub struct ScriptedUi {
    answers: Mutex<VecDeque<OverwriteChoice>>,
    prompts: Mutex<Vec<PathBuf>>,
    messages: Mutex<Vec<String>>,
}

impl ScriptedUi {
    /// Create a new UI answering prompts with `answers`.
    pub fn new(answers: Vec<OverwriteChoice>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Default::default()
        }
    }

    pub fn prompt_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Files the user was asked about, in order.
    pub fn prompts(&self) -> Vec<PathBuf> {
        lock(&self.prompts).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }
}

#[async_trait]
impl UserInterface for ScriptedUi {
    fn message(&self, text: &str) {
        lock(&self.messages).push(text.to_string());
    }

    async fn confirm_overwrite(&self, path: &Path) -> OverwriteChoice {
        lock(&self.prompts).push(path.to_path_buf());
        lock(&self.answers)
            .pop_front()
            .unwrap_or(OverwriteChoice::Cancel)
    }
}

/// A document whose writer emits fixed content.
#[derive(Debug)]
pub struct StaticDocument {
    file_path: PathBuf,
    temp_dir: PathBuf,
    markup: String,
    content: String,
    tex_class: bool,
    external_files: Vec<ExternalFile>,
    writes: Mutex<Vec<(String, PathBuf, WriteParams)>>,
}

impl StaticDocument {
    /// Create a new document at `file_path` converting inside `temp_dir`.
    pub fn new(
        file_path: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
        markup: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            temp_dir: temp_dir.into(),
            markup: markup.into(),
            content: String::new(),
            tex_class: true,
            external_files: Vec::new(),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Set what the writer emits (builder pattern).
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Report a referenced file on every write (builder pattern).
    pub fn with_external_file(
        mut self,
        source: impl Into<PathBuf>,
        export_name: impl Into<PathBuf>,
    ) -> Self {
        self.external_files.push(ExternalFile {
            source: source.into(),
            export_name: export_name.into(),
        });
        self
    }

    /// Mark the document class as unusable with LaTeX (builder pattern).
    pub fn without_tex_class(mut self) -> Self {
        self.tex_class = false;
        self
    }

    /// Every `(backend, path, params)` the writer was called with.
    pub fn writes(&self) -> Vec<(String, PathBuf, WriteParams)> {
        lock(&self.writes).clone()
    }
}

#[async_trait]
impl Document for StaticDocument {
    fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    fn markup_format(&self) -> &str {
        &self.markup
    }

    fn tex_class_available(&self) -> bool {
        self.tex_class
    }

    async fn write(
        &self,
        backend: &str,
        path: &Path,
        params: &WriteParams,
    ) -> std::io::Result<WriteReport> {
        lock(&self.writes).push((backend.to_string(), path.to_path_buf(), *params));
        tokio::fs::write(path, &self.content).await?;
        Ok(WriteReport {
            external_files: self.external_files.clone(),
        })
    }
}

/// A loader that records what it was handed.
#[derive(Debug, Default)]
pub struct RecordingLoader {
    opened: Mutex<Vec<PathBuf>>,
    texts: Mutex<Vec<(PathBuf, bool)>>,
    fail: bool,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every load fail (builder pattern).
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Files opened as native documents.
    pub fn opened(&self) -> Vec<PathBuf> {
        lock(&self.opened).clone()
    }

    /// Files inserted as text, with their paragraph mode.
    pub fn texts(&self) -> Vec<(PathBuf, bool)> {
        lock(&self.texts).clone()
    }

    fn check(&self) -> std::io::Result<()> {
        if self.fail {
            Err(std::io::Error::other("loader refused the file"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentLoader for RecordingLoader {
    async fn open_native(&self, path: &Path) -> std::io::Result<()> {
        self.check()?;
        lock(&self.opened).push(path.to_path_buf());
        Ok(())
    }

    async fn insert_text(&self, path: &Path, paragraphs: bool) -> std::io::Result<()> {
        self.check()?;
        lock(&self.texts).push((path.to_path_buf(), paragraphs));
        Ok(())
    }
}
