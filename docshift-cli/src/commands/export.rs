//! Implementation of the `docshift export` and `docshift preview` commands.
//!
//! The file is written into a fresh scratch directory, converted along the
//! shortest converter chain, and the result copied next to the file.
//! `preview` keeps the result in the scratch directory and opens it in the
//! target format's viewer.
//!
//! # Usage
//!
//! ```bash
//! docshift export paper.tex --to pdf
//! docshift export notes.nw --from literate --to html --yes
//! docshift export paper.tex --to dvi --temp
//! docshift preview paper.tex --to pdf
//! ```

use crate::errors::DocshiftError;
use crate::output;
use crate::progress::ConversionSpinner;
use crate::session::{ConsoleUi, FileDocument, Session, existing_file};
use docshift_core::Exported;
use std::path::PathBuf;

/// Options for the `docshift export` command.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub config: Option<PathBuf>,
    pub file: PathBuf,
    /// Target format.
    pub to: String,
    /// Format of `file`; guessed from its extension when absent.
    pub from: Option<String>,
    /// Leave the result in the scratch directory.
    pub temp: bool,
    /// Overwrite existing files without asking.
    pub yes: bool,
}

/// Options for the `docshift preview` command.
#[derive(Debug, Clone, Default)]
pub struct PreviewOptions {
    pub config: Option<PathBuf>,
    pub file: PathBuf,
    pub to: String,
    pub from: Option<String>,
}

/// Run the `docshift export` command.
pub async fn run_export(options: ExportOptions) -> Result<Exported, DocshiftError> {
    let session = Session::load(options.config.as_deref())?;
    let file = existing_file(&options.file)?;
    let format = session.resolve_format(&file, options.from.as_deref())?;
    session.require_format(&options.to)?;

    let scratch = session.scratch_dir(options.temp)?;
    let document = FileDocument::new(file, scratch.path().to_path_buf(), format);

    let spinner = ConversionSpinner::new(&format!(
        "Exporting to {}...",
        session.formats.pretty_name(&options.to)
    ));
    let ui = ConsoleUi::new(options.yes).with_progress(spinner.progress_bar());
    let result = session
        .exporter(Some(&spinner))
        .export(&document, &ui, &options.to, options.temp)
        .await;
    spinner.finish();
    let exported = result?;

    output::log_problems(&exported.conversion);
    if options.temp {
        match &exported.result_file {
            Some(result) => output::success(&format!("Result kept at {}", result.display())),
            None => output::success(&format!(
                "Exported as {}",
                session.formats.pretty_name(&options.to)
            )),
        }
    }
    for copied in &exported.copied {
        output::verbose(&format!("  wrote {}", copied.display()));
    }

    Ok(exported)
}

/// Run the `docshift preview` command.
pub async fn run_preview(options: PreviewOptions) -> Result<Exported, DocshiftError> {
    let session = Session::load(options.config.as_deref())?;
    let file = existing_file(&options.file)?;
    let format = session.resolve_format(&file, options.from.as_deref())?;
    session.require_format(&options.to)?;

    // the viewer outlives this process, so the scratch directory must too
    let scratch = session.scratch_dir(true)?;
    let document = FileDocument::new(file, scratch.path().to_path_buf(), format);

    let spinner = ConversionSpinner::new(&format!(
        "Preparing {} preview...",
        session.formats.pretty_name(&options.to)
    ));
    let ui = ConsoleUi::new(false).with_progress(spinner.progress_bar());
    let result = session
        .exporter(Some(&spinner))
        .preview(&document, &ui, &options.to)
        .await;
    spinner.finish();
    let exported = result?;

    output::log_problems(&exported.conversion);
    if let Some(result) = &exported.result_file {
        output::success(&format!("Opened {}", result.display()));
    }

    Ok(exported)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use docshift_core::ConvertError;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    fn write_config(dir: &Path) -> PathBuf {
        let yaml = format!(
            r#"
formats:
  - {{ name: text, extension: txt }}
  - {{ name: markdown, extension: md }}
  - {{ name: html, extension: html, viewer: "true $$i" }}
converters:
  - {{ from: text, to: markdown, command: "cp $$i $$o" }}
  - {{ from: markdown, to: html, command: "cp $$i $$o" }}
execution:
  temp_dir: "{}"
"#,
            dir.join("scratch").display()
        );
        let path = dir.join("docshift.yaml");
        fs::write(&path, yaml).unwrap();
        path
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());
        let file = dir.path().join("notes.txt");
        fs::write(&file, "hello\n").unwrap();
        (dir, config, file)
    }

    #[tokio::test]
    async fn test_export_copies_result_next_to_file() {
        let (dir, config, file) = setup();

        let exported = run_export(ExportOptions {
            config: Some(config),
            file,
            to: "html".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        let html = dir.path().join("notes.html");
        assert_eq!(exported.backend, "text");
        assert_eq!(exported.result_file, Some(html.clone()));
        assert_eq!(fs::read_to_string(html).unwrap(), "hello\n");
        assert_eq!(exported.conversion.steps, 2);
    }

    #[tokio::test]
    async fn test_export_to_temp_keeps_scratch_result() {
        let (dir, config, file) = setup();

        let exported = run_export(ExportOptions {
            config: Some(config),
            file,
            to: "markdown".to_string(),
            temp: true,
            ..Default::default()
        })
        .await
        .unwrap();

        let result = exported.result_file.unwrap();
        assert!(result.starts_with(dir.path().join("scratch")));
        assert!(result.exists());
        assert!(!dir.path().join("notes.md").exists());
    }

    #[tokio::test]
    async fn test_export_unknown_target() {
        let (_dir, config, file) = setup();

        let result = run_export(ExportOptions {
            config: Some(config),
            file,
            to: "pdf".to_string(),
            ..Default::default()
        })
        .await;

        assert!(matches!(
            result,
            Err(DocshiftError::Convert(ConvertError::UnknownFormat(_)))
        ));
    }

    #[tokio::test]
    async fn test_export_missing_file() {
        let (dir, config, _file) = setup();

        let result = run_export(ExportOptions {
            config: Some(config),
            file: dir.path().join("missing.txt"),
            to: "html".to_string(),
            ..Default::default()
        })
        .await;

        assert!(matches!(result, Err(DocshiftError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_preview_keeps_result_for_viewer() {
        let (dir, config, file) = setup();

        let exported = run_preview(PreviewOptions {
            config: Some(config),
            file,
            to: "html".to_string(),
            from: None,
        })
        .await
        .unwrap();

        let result = exported.result_file.unwrap();
        assert!(result.starts_with(dir.path().join("scratch")));
        assert!(result.exists());
    }
}
