//! Exporting documents to any reachable format.
//!
//! An export writes the document in a *backend* format (the markup it is
//! written in, or plain text) into its temp directory, converts that file to
//! the requested format, and copies the result plus any referenced files
//! next to the document.

use crate::convert::{Conversion, ConversionContext, ConversionObserver, ExecutionSettings};
use crate::converter::Flavor;
use crate::converters::Converters;
use crate::copy::{CopyStatus, copy_export_file};
use crate::document::{Document, UserInterface, WriteParams};
use crate::error::{ConvertError, ConvertResult};
use crate::files::{change_extension, file_name_lossy, parent_dir, strip_extension};
use crate::format::{Format, Formats};
use docshift_exec::CommandRunner;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Name of the plain text format unless configured otherwise.
pub const DEFAULT_TEXT_FORMAT: &str = "text";

/// Markup formats that need a LaTeX-capable document class.
const LATEX_FAMILY: &[&str] = &["latex", "literate"];

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exported {
    /// Backend the document was written in
    pub backend: String,

    /// Final location of the result; `None` for dummy targets
    pub result_file: Option<PathBuf>,

    /// Destinations handled by the copy step, result included
    pub copied: Vec<PathBuf>,

    pub conversion: Conversion,
}

/// Drives document writers and converters to produce exports.
pub struct Exporter<'a> {
    formats: &'a Formats,
    converters: &'a Converters,
    runner: &'a dyn CommandRunner,
    settings: ExecutionSettings,
    text_format: String,
    observer: Option<&'a dyn ConversionObserver>,
}

impl<'a> Exporter<'a> {
    /// Create a new exporter over the given registries.
    pub fn new(
        formats: &'a Formats,
        converters: &'a Converters,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            formats,
            converters,
            runner,
            settings: ExecutionSettings::default(),
            text_format: DEFAULT_TEXT_FORMAT.to_string(),
            observer: None,
        }
    }

    /// Set the execution settings (builder pattern).
    pub fn with_settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the plain text format name (builder pattern).
    pub fn with_text_format(mut self, name: impl Into<String>) -> Self {
        self.text_format = name.into();
        self
    }

    /// Set the progress observer (builder pattern).
    pub fn with_observer(mut self, observer: Option<&'a dyn ConversionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Formats the document can be written in directly.
    pub fn backends(&self, document: &dyn Document) -> Vec<String> {
        let markup = document.markup_format();
        let mut backends = Vec::new();

        let needs_tex = LATEX_FAMILY.contains(&markup);
        if !needs_tex || document.tex_class_available() {
            backends.push(markup.to_string());
        }
        if markup != self.text_format {
            backends.push(self.text_format.clone());
        }
        backends
    }

    /// Backend to write and the flavor to write it in, for `target`.
    fn choose_backend(&self, backends: &[String], target: &str) -> ConvertResult<(String, Flavor)> {
        if backends.iter().any(|b| b == target) {
            return Ok((target.to_string(), Flavor::default()));
        }

        backends
            .iter()
            .find_map(|backend| {
                let path = self.converters.get_path(self.formats, backend, target);
                (!path.is_empty()).then(|| (backend.clone(), self.converters.flavor(&path)))
            })
            .ok_or_else(|| ConvertError::NoConversionPath {
                from: backends.first().cloned().unwrap_or_default(),
                to: target.to_string(),
            })
    }

    /// Export `document` to `target`.
    ///
    /// With `put_in_tempdir` the result stays in the temp directory;
    /// otherwise it is copied next to the document, asking before
    /// overwriting anything.
    pub async fn export(
        &self,
        document: &dyn Document,
        ui: &dyn UserInterface,
        target: &str,
        put_in_tempdir: bool,
    ) -> ConvertResult<Exported> {
        if self.formats.get_format(target).is_none() {
            return Err(ConvertError::UnknownFormat(target.to_string()));
        }

        let backends = self.backends(document);
        let (backend, flavor) = self.choose_backend(&backends, target)?;
        let backend_format = self
            .formats
            .get_format(&backend)
            .ok_or_else(|| ConvertError::UnknownFormat(backend.clone()))?;

        let stem = strip_extension(document.file_path());
        let written = change_extension(
            &document.temp_dir().join(file_name_lossy(&stem)),
            &backend_format.extension,
        );
        let params = WriteParams {
            flavor,
            nice: backend == target,
        };

        info!(
            document = %document.file_path().display(),
            %backend,
            target,
            %flavor,
            "Exporting"
        );

        let report = document
            .write(&backend, &written, &params)
            .await
            .map_err(|error| ConvertError::WriteFailed {
                backend: backend.clone(),
                path: written.clone(),
                error,
            })?;

        let ctx = ConversionContext::new(self.runner, parent_dir(document.file_path()))
            .with_settings(self.settings.clone())
            .with_observer(self.observer);
        let conversion = self
            .converters
            .convert(
                self.formats,
                &ctx,
                &written,
                &strip_extension(&written),
                &backend,
                target,
            )
            .await?;

        let mut exported = Exported {
            backend,
            result_file: conversion.result_file.clone(),
            copied: Vec::new(),
            conversion,
        };

        if put_in_tempdir {
            return Ok(exported);
        }

        let dest_dir = parent_dir(document.file_path());
        let temp_dir = document.temp_dir();
        let mut status = CopyStatus::Success;

        for file in &report.external_files {
            let destination = dest_dir.join(&file.export_name);
            status = copy_export_file(
                ui,
                temp_dir,
                &file.source,
                &destination,
                status.is_forced(),
            )
            .await?;
            if status == CopyStatus::Cancel {
                ui.message("Document export cancelled.");
                return Err(ConvertError::ExportCancelled);
            }
            exported.copied.push(destination);
        }

        let pretty = self.formats.pretty_name(target);
        match exported.conversion.result_file.clone() {
            Some(tmp_result) if tmp_result.exists() => {
                let final_result = match &exported.conversion.result_dir {
                    Some(result_dir) => {
                        let copied = self
                            .copy_result_dir(ui, temp_dir, result_dir, &dest_dir, status)
                            .await?;
                        exported.copied.extend(copied);
                        let relative = tmp_result
                            .strip_prefix(parent_dir(result_dir))
                            .unwrap_or(&tmp_result);
                        dest_dir.join(relative)
                    }
                    None => {
                        let destination = change_extension(
                            document.file_path(),
                            self.formats.extension(target),
                        );
                        let status = copy_export_file(
                            ui,
                            temp_dir,
                            &tmp_result,
                            &destination,
                            status.is_forced(),
                        )
                        .await?;
                        if status == CopyStatus::Cancel {
                            ui.message("Document export cancelled.");
                            return Err(ConvertError::ExportCancelled);
                        }
                        exported.copied.push(destination.clone());
                        destination
                    }
                };
                ui.message(&format!(
                    "Document exported as {} to file '{}'",
                    pretty,
                    final_result.display()
                ));
                exported.result_file = Some(final_result);
            }
            _ => {
                // dummy targets such as fax leave nothing behind
                ui.message(&format!("Document exported as {}", pretty));
                exported.result_file = None;
            }
        }

        Ok(exported)
    }

    /// Copy every file of a directory result, keeping the directory name.
    async fn copy_result_dir(
        &self,
        ui: &dyn UserInterface,
        temp_dir: &Path,
        result_dir: &Path,
        dest_dir: &Path,
        mut status: CopyStatus,
    ) -> ConvertResult<Vec<PathBuf>> {
        let target_dir = dest_dir.join(file_name_lossy(result_dir));
        let mut copied = Vec::new();

        for entry in WalkDir::new(result_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let relative = entry
                .path()
                .strip_prefix(result_dir)
                .unwrap_or(entry.path());
            let destination = target_dir.join(relative);
            status =
                copy_export_file(ui, temp_dir, entry.path(), &destination, status.is_forced())
                    .await?;
            if status == CopyStatus::Cancel {
                ui.message("Document export cancelled.");
                return Err(ConvertError::ExportCancelled);
            }
            copied.push(destination);
        }

        debug!(dir = %target_dir.display(), files = copied.len(), "Copied result directory");
        Ok(copied)
    }

    /// Export into the temp directory and open the result in its viewer.
    pub async fn preview(
        &self,
        document: &dyn Document,
        ui: &dyn UserInterface,
        format: &str,
    ) -> ConvertResult<Exported> {
        let exported = self.export(document, ui, format, true).await?;
        let result = exported
            .result_file
            .clone()
            .ok_or_else(|| ConvertError::NoViewer(format.to_string()))?;
        self.formats
            .view(self.runner, &result, format, self.settings.address.as_deref())
            .await?;
        Ok(exported)
    }

    /// Whether any backend of the document can reach `format`.
    pub fn is_exportable(&self, document: &dyn Document, format: &str) -> bool {
        self.backends(document)
            .iter()
            .any(|backend| self.converters.is_reachable(self.formats, backend, format))
    }

    /// Every format the document can be exported to, without duplicates.
    pub fn exportable_formats(
        &self,
        document: &dyn Document,
        only_viewable: bool,
    ) -> Vec<&'a Format> {
        let backends = self.backends(document);
        let sources: Vec<&str> = backends.iter().map(String::as_str).collect();
        self.converters
            .get_reachable_from_any(self.formats, &sources, only_viewable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::OverwriteChoice;
    use crate::testing::{ScriptedUi, StaticDocument, sample_registry, simulate_tools};
    use docshift_exec::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct Workspace {
        doc_dir: TempDir,
        temp_dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            Self {
                doc_dir: tempfile::tempdir().unwrap(),
                temp_dir: tempfile::tempdir().unwrap(),
            }
        }

        fn document(&self) -> StaticDocument {
            StaticDocument::new(
                self.doc_dir.path().join("paper.lyx"),
                self.temp_dir.path(),
                "latex",
            )
            .with_content("\\documentclass{article}")
        }

        fn doc_path(&self, name: &str) -> PathBuf {
            self.doc_dir.path().join(name)
        }

        fn temp_path(&self, name: &str) -> PathBuf {
            self.temp_dir.path().join(name)
        }
    }

    fn names(formats: &[&Format]) -> Vec<String> {
        let mut names: Vec<String> = formats.iter().map(|f| f.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_backends() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new();
        let exporter = Exporter::new(&formats, &converters, &runner);
        let ws = Workspace::new();

        assert_eq!(exporter.backends(&ws.document()), vec!["latex", "text"]);
        assert_eq!(
            exporter.backends(&ws.document().without_tex_class()),
            vec!["text"]
        );
        let text_doc = StaticDocument::new(ws.doc_path("a.txt"), ws.temp_dir.path(), "text");
        assert_eq!(exporter.backends(&text_doc), vec!["text"]);
    }

    #[tokio::test]
    async fn test_export_to_backend_starts_no_process() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new();
        let ui = ScriptedUi::new(vec![]);
        let ws = Workspace::new();
        let document = ws.document();

        let exported = Exporter::new(&formats, &converters, &runner)
            .export(&document, &ui, "latex", false)
            .await
            .unwrap();

        assert_eq!(runner.process_count().await, 0);
        assert_eq!(exported.backend, "latex");
        assert_eq!(exported.result_file, Some(ws.doc_path("paper.tex")));
        assert_eq!(
            std::fs::read_to_string(ws.doc_path("paper.tex")).unwrap(),
            "\\documentclass{article}"
        );

        let writes = document.writes();
        assert_eq!(writes[0].1, ws.temp_path("paper.tex"));
        assert!(writes[0].2.nice);
        assert_eq!(
            ui.messages(),
            vec![format!(
                "Document exported as LaTeX to file '{}'",
                ws.doc_path("paper.tex").display()
            )]
        );
    }

    #[tokio::test]
    async fn test_export_passes_flavor_to_writer() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new().with_handler(simulate_tools);
        let ui = ScriptedUi::new(vec![]);
        let ws = Workspace::new();
        let document = ws.document();

        let exported = Exporter::new(&formats, &converters, &runner)
            .export(&document, &ui, "pdf2", false)
            .await
            .unwrap();

        let writes = document.writes();
        assert_eq!(writes[0].0, "latex");
        assert_eq!(writes[0].2.flavor, Flavor::PdfLatex);
        assert!(!writes[0].2.nice);
        assert_eq!(exported.result_file, Some(ws.doc_path("paper.pdf")));
        assert_eq!(
            std::fs::read_to_string(ws.doc_path("paper.pdf")).unwrap(),
            "pdflatex"
        );
    }

    #[tokio::test]
    async fn test_put_in_tempdir_leaves_document_dir_alone() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new().with_handler(simulate_tools);
        let ui = ScriptedUi::new(vec![]);
        let ws = Workspace::new();

        let exported = Exporter::new(&formats, &converters, &runner)
            .export(&ws.document(), &ui, "pdf", true)
            .await
            .unwrap();

        assert_eq!(exported.result_file, Some(ws.temp_path("paper.pdf")));
        assert_eq!(exported.conversion.steps, 3);
        assert!(exported.copied.is_empty());
        assert!(!ws.doc_path("paper.pdf").exists());
        assert!(ui.messages().is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_all_prompts_once() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new();
        let ui = ScriptedUi::new(vec![OverwriteChoice::OverwriteAll]);
        let ws = Workspace::new();
        for name in ["fig1.png", "fig2.png"] {
            std::fs::write(ws.temp_path(name), "new").unwrap();
            std::fs::write(ws.doc_path(name), "old").unwrap();
        }
        std::fs::write(ws.doc_path("paper.tex"), "old").unwrap();
        let document = ws
            .document()
            .with_external_file(ws.temp_path("fig1.png"), "fig1.png")
            .with_external_file(ws.temp_path("fig2.png"), "fig2.png");

        let exported = Exporter::new(&formats, &converters, &runner)
            .export(&document, &ui, "latex", false)
            .await
            .unwrap();

        assert_eq!(ui.prompts(), vec![ws.doc_path("fig1.png")]);
        assert_eq!(exported.copied.len(), 3);
        for name in ["fig1.png", "fig2.png"] {
            assert_eq!(std::fs::read_to_string(ws.doc_path(name)).unwrap(), "new");
        }
        assert_ne!(std::fs::read_to_string(ws.doc_path("paper.tex")).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_cancel_keeps_earlier_copies() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new();
        let ui = ScriptedUi::new(vec![OverwriteChoice::Overwrite, OverwriteChoice::Cancel]);
        let ws = Workspace::new();
        for name in ["fig1.png", "fig2.png"] {
            std::fs::write(ws.temp_path(name), "new").unwrap();
            std::fs::write(ws.doc_path(name), "old").unwrap();
        }
        let document = ws
            .document()
            .with_external_file(ws.temp_path("fig1.png"), "fig1.png")
            .with_external_file(ws.temp_path("fig2.png"), "fig2.png");

        let result = Exporter::new(&formats, &converters, &runner)
            .export(&document, &ui, "latex", false)
            .await;

        assert!(matches!(result, Err(ConvertError::ExportCancelled)));
        assert_eq!(ui.prompt_count(), 2);
        assert_eq!(std::fs::read_to_string(ws.doc_path("fig1.png")).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(ws.doc_path("fig2.png")).unwrap(), "old");
        assert!(!ws.doc_path("paper.tex").exists());
        assert_eq!(ui.messages(), vec!["Document export cancelled.".to_string()]);
    }

    #[tokio::test]
    async fn test_export_directory_result() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new().with_handler(simulate_tools);
        let ui = ScriptedUi::new(vec![]);
        let ws = Workspace::new();

        let exported = Exporter::new(&formats, &converters, &runner)
            .export(&ws.document(), &ui, "html", false)
            .await
            .unwrap();

        let index = ws.doc_path("paper.html.d").join("index.html");
        assert_eq!(exported.result_file, Some(index.clone()));
        assert!(index.exists());
    }

    #[tokio::test]
    async fn test_export_dummy_target() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new().with_handler(simulate_tools);
        let ui = ScriptedUi::new(vec![]);
        let ws = Workspace::new();

        let exported = Exporter::new(&formats, &converters, &runner)
            .export(&ws.document(), &ui, "fax", false)
            .await
            .unwrap();

        assert_eq!(exported.result_file, None);
        assert_eq!(ui.messages(), vec!["Document exported as Fax".to_string()]);
    }

    #[tokio::test]
    async fn test_export_without_route() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new();
        let ui = ScriptedUi::new(vec![]);
        let ws = Workspace::new();
        let document = ws.document().without_tex_class();

        let result = Exporter::new(&formats, &converters, &runner)
            .export(&document, &ui, "pdf", false)
            .await;

        assert!(matches!(result, Err(ConvertError::NoConversionPath { .. })));
        assert!(document.writes().is_empty());
    }

    #[tokio::test]
    async fn test_preview_launches_viewer() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new().with_handler(simulate_tools);
        let ui = ScriptedUi::new(vec![]);
        let ws = Workspace::new();

        Exporter::new(&formats, &converters, &runner)
            .preview(&ws.document(), &ui, "pdf")
            .await
            .unwrap();

        let detached = runner.detached().await;
        assert_eq!(detached.len(), 1);
        assert_eq!(
            detached[0].command,
            format!("xpdf {}", ws.temp_path("paper.pdf").display())
        );
    }

    #[test]
    fn test_exportable_formats() {
        let (formats, converters) = sample_registry().unwrap();
        let runner = RecordingRunner::new();
        let exporter = Exporter::new(&formats, &converters, &runner);
        let ws = Workspace::new();
        let document = ws.document();

        let all = names(&exporter.exportable_formats(&document, false));
        let mut deduped = all.clone();
        deduped.dedup();
        assert_eq!(all, deduped);
        assert_eq!(
            all,
            vec!["dvi", "fax", "html", "latex", "pdf", "pdf2", "ps", "text"]
        );

        assert_eq!(
            names(&exporter.exportable_formats(&document, true)),
            vec!["dvi", "pdf"]
        );
        assert!(exporter.is_exportable(&document, "fax"));
        assert!(!exporter.is_exportable(&document, "textparagraph"));
    }
}
