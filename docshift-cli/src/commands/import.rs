//! Implementation of the `docshift import` command.
//!
//! Converts a foreign file to the closest loader format (the native format,
//! then plain text, then paragraph text) and reports what an editor would
//! open. The converted file is written next to the original.
//!
//! # Usage
//!
//! ```bash
//! docshift import paper.tex
//! docshift import scan.ps --from ps
//! ```

use crate::errors::DocshiftError;
use crate::output;
use crate::progress::ConversionSpinner;
use crate::session::{ConsoleLoader, Session, existing_file};
use docshift_core::Imported;
use std::path::PathBuf;

/// Options for the `docshift import` command.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub config: Option<PathBuf>,
    pub file: PathBuf,
    /// Format of `file`; guessed from its extension when absent.
    pub from: Option<String>,
}

/// Run the `docshift import` command.
pub async fn run_import(options: ImportOptions) -> Result<Imported, DocshiftError> {
    let session = Session::load(options.config.as_deref())?;
    let file = existing_file(&options.file)?;
    let format = session.resolve_format(&file, options.from.as_deref())?;

    let spinner = ConversionSpinner::new(&format!(
        "Importing {}...",
        session.formats.pretty_name(&format)
    ));
    let result = session
        .importer(Some(&spinner))
        .import(&ConsoleLoader, &file, &format)
        .await;
    spinner.finish();
    let imported = result?;

    if let Some(conversion) = &imported.conversion {
        output::log_problems(conversion);
    }
    Ok(imported)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use docshift_core::{ConvertError, Loader};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let config = dir.path().join("docshift.yaml");
        fs::write(
            &config,
            r#"
native_format: doc
formats:
  - { name: doc, extension: doc }
  - { name: text, extension: txt }
  - { name: textparagraph, extension: txt }
  - { name: markdown, extension: md }
  - { name: pdf, extension: pdf }
converters:
  - { from: markdown, to: doc, command: "cp $$i $$o" }
"#,
        )
        .unwrap();
        (dir, config)
    }

    #[tokio::test]
    async fn test_import_converts_to_native() {
        let (dir, config) = setup();
        let file = dir.path().join("readme.md");
        fs::write(&file, "# Title\n").unwrap();

        let imported = run_import(ImportOptions {
            config: Some(config),
            file,
            from: None,
        })
        .await
        .unwrap();

        let converted = dir.path().join("readme.doc");
        assert_eq!(imported.loader, Loader::Native);
        assert_eq!(imported.loaded_file, converted);
        assert_eq!(fs::read_to_string(converted).unwrap(), "# Title\n");
    }

    #[tokio::test]
    async fn test_import_text_needs_no_conversion() {
        let (dir, config) = setup();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "one\n\ntwo\n").unwrap();

        let imported = run_import(ImportOptions {
            config: Some(config),
            file: file.clone(),
            from: None,
        })
        .await
        .unwrap();

        assert_eq!(imported.loader, Loader::Text);
        assert_eq!(imported.loaded_file, file);
        assert!(imported.conversion.is_none());
    }

    #[tokio::test]
    async fn test_import_without_route() {
        let (dir, config) = setup();
        let file = dir.path().join("scan.pdf");
        fs::write(&file, "%PDF").unwrap();

        let result = run_import(ImportOptions {
            config: Some(config),
            file,
            from: None,
        })
        .await;

        assert!(matches!(
            result,
            Err(DocshiftError::Convert(ConvertError::NoConversionPath { .. }))
        ));
    }
}
