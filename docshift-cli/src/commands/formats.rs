//! Implementation of the `docshift formats` command.
//!
//! Lists the configured formats sorted by display name.

use crate::errors::DocshiftError;
use crate::output;
use crate::session::Session;
use docshift_core::Format;
use std::path::PathBuf;

/// Options for the `docshift formats` command.
#[derive(Debug, Clone, Default)]
pub struct FormatsOptions {
    pub config: Option<PathBuf>,
    /// Print JSON instead of a table.
    pub json: bool,
}

/// Run the `docshift formats` command.
pub fn run_formats(options: FormatsOptions) -> Result<(), DocshiftError> {
    let session = Session::load(options.config.as_deref())?;

    let mut formats = session.formats.clone();
    formats.sort();
    let listed: Vec<&Format> = formats.iter().collect();

    if options.json {
        output::data(&serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    output::heading(&format!(
        "Formats ({})",
        session.config.source_description()
    ));
    for line in format_table(&listed) {
        output::data(&line);
    }
    Ok(())
}

/// One line per format: name, extension, display name and launchers.
pub fn format_table(formats: &[&Format]) -> Vec<String> {
    let width = formats.iter().map(|f| f.name.len()).max().unwrap_or(0);

    formats
        .iter()
        .map(|f| {
            let extension = if f.is_dummy() {
                "-".to_string()
            } else {
                format!(".{}", f.extension)
            };
            let mut line = format!(
                "{:width$}  {:6}  {}",
                f.name,
                extension,
                f.pretty_name,
                width = width
            );
            if f.has_viewer() {
                line.push_str(&format!("  [view: {}]", f.viewer));
            }
            if !f.editor.is_empty() {
                line.push_str(&format!("  [edit: {}]", f.editor));
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_table() {
        let mut pdf = Format::new("pdf", "pdf", "PDF", "P");
        pdf.viewer = "xpdf $$i".to_string();
        let fax = Format::new("fax", "", "Fax", "");

        let lines = format_table(&[&pdf, &fax]);

        assert_eq!(
            lines,
            vec![
                "pdf  .pdf    PDF  [view: xpdf $$i]".to_string(),
                "fax  -       Fax".to_string(),
            ]
        );
    }

    #[test]
    fn test_format_table_empty() {
        assert!(format_table(&[]).is_empty());
    }
}
