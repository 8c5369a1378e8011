//! Format registry.
//!
//! A [`Format`] describes one file format: its unique name, file extension,
//! display name and the commands used to view or edit files of that format.
//! [`Formats`] keeps them in registration order; a format's position is its
//! [`FormatId`] and doubles as its vertex in the converter graph.

use crate::error::{ConvertError, ConvertResult};
use docshift_exec::{CommandRunner, CommandTokens, Invocation};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Stable index of a format in the registry.
///
/// Ids are only stable between registry mutations that reorder or remove
/// formats ([`Formats::sort`], [`Formats::erase`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FormatId(usize);

impl FormatId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A file format known to the converter graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Format {
    /// Unique name
    pub name: String,

    /// File extension without the leading dot; empty for dummy formats
    pub extension: String,

    /// Display name, also the sort key
    pub pretty_name: String,

    /// Keyboard shortcut shown in menus
    pub shortcut: String,

    /// Viewer command template
    pub viewer: String,

    /// Editor command template
    pub editor: String,
}

impl Format {
    /// Create a new format without viewer or editor.
    pub fn new(
        name: impl Into<String>,
        extension: impl Into<String>,
        pretty_name: impl Into<String>,
        shortcut: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            pretty_name: pretty_name.into(),
            shortcut: shortcut.into(),
            viewer: String::new(),
            editor: String::new(),
        }
    }

    /// A dummy format produces no file (e.g. `fax`, `program`).
    pub fn is_dummy(&self) -> bool {
        self.extension.is_empty()
    }

    /// Child formats end in a digit (`pdf2`, `eps1`) and fall back to their
    /// parent's viewer and editor.
    pub fn is_child_format(&self) -> bool {
        self.name
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_digit())
    }

    /// Name of the parent format, the name minus its last character.
    pub fn parent_format(&self) -> Option<&str> {
        if !self.is_child_format() {
            return None;
        }
        let cut = self.name.len() - 1;
        Some(&self.name[..cut])
    }

    pub fn has_viewer(&self) -> bool {
        !self.viewer.is_empty()
    }
}

/// Which launcher command to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Launcher {
    Viewer,
    Editor,
}

impl Launcher {
    fn command(self, format: &Format) -> &str {
        match self {
            Launcher::Viewer => &format.viewer,
            Launcher::Editor => &format.editor,
        }
    }

    fn missing(self, name: &str) -> ConvertError {
        match self {
            Launcher::Viewer => ConvertError::NoViewer(name.to_string()),
            Launcher::Editor => ConvertError::NoEditor(name.to_string()),
        }
    }
}

/// The registry of formats.
#[derive(Debug, Clone, Default)]
pub struct Formats {
    formats: Vec<Format>,
}

impl Formats {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // === Lookup ===

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Iterate over all formats in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Format> {
        self.formats.iter()
    }

    /// Get a format by name.
    pub fn get_format(&self, name: &str) -> Option<&Format> {
        self.formats.iter().find(|f| f.name == name)
    }

    /// Get a format by id.
    pub fn get(&self, id: FormatId) -> Option<&Format> {
        self.formats.get(id.index())
    }

    /// Id (registration index) of a format.
    pub fn get_number(&self, name: &str) -> Option<FormatId> {
        self.formats
            .iter()
            .position(|f| f.name == name)
            .map(FormatId::new)
    }

    /// The format whose extension matches the file's, if any.
    pub fn get_format_from_file(&self, path: &Path) -> Option<&Format> {
        let extension = path.extension()?.to_str()?;
        self.formats
            .iter()
            .find(|f| f.extension == extension)
            .or_else(|| {
                self.formats
                    .iter()
                    .find(|f| !f.is_dummy() && f.extension.eq_ignore_ascii_case(extension))
            })
    }

    /// Display name, or `name` itself for unknown formats.
    pub fn pretty_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.get_format(name)
            .map(|f| f.pretty_name.as_str())
            .unwrap_or(name)
    }

    /// File extension, or `name` itself for unknown formats.
    pub fn extension<'a>(&'a self, name: &'a str) -> &'a str {
        self.get_format(name)
            .map(|f| f.extension.as_str())
            .unwrap_or(name)
    }

    // === Mutation ===

    /// Register `name` with extension and pretty name equal to the name.
    /// Does nothing if the format already exists.
    pub fn add(&mut self, name: &str) {
        if self.get_format(name).is_none() {
            self.add_full(name, name, name, "");
        }
    }

    /// Insert or update a format. Updating keeps viewer and editor.
    pub fn add_full(&mut self, name: &str, extension: &str, pretty_name: &str, shortcut: &str) {
        let format = Format::new(name, extension, pretty_name, shortcut);
        match self.formats.iter_mut().find(|f| f.name == name) {
            Some(existing) => {
                let viewer = std::mem::take(&mut existing.viewer);
                let editor = std::mem::take(&mut existing.editor);
                *existing = Format {
                    viewer,
                    editor,
                    ..format
                };
            }
            None => self.formats.push(format),
        }
    }

    /// Remove a format by name. Ids of later formats shift down.
    pub fn erase(&mut self, name: &str) {
        self.formats.retain(|f| f.name != name);
    }

    /// Order formats by pretty name, ignoring ASCII case.
    ///
    /// This reassigns every id; rebuild the converter graph afterwards.
    pub fn sort(&mut self) {
        self.formats
            .sort_by_cached_key(|f| f.pretty_name.to_ascii_lowercase());
    }

    /// Set the viewer command, registering the format if needed.
    pub fn set_viewer(&mut self, name: &str, command: &str) {
        self.add(name);
        if let Some(format) = self.formats.iter_mut().find(|f| f.name == name) {
            format.viewer = command.to_string();
        }
    }

    /// Set the editor command, registering the format if needed.
    pub fn set_editor(&mut self, name: &str, command: &str) {
        self.add(name);
        if let Some(format) = self.formats.iter_mut().find(|f| f.name == name) {
            format.editor = command.to_string();
        }
    }

    // === Viewing and editing ===

    /// Resolve the viewer command for a format, falling back to the parent
    /// of a child format.
    pub fn viewer_for(&self, name: &str) -> ConvertResult<&str> {
        self.launcher_for(name, Launcher::Viewer)
    }

    /// Resolve the editor command for a format, like [`Formats::viewer_for`].
    pub fn editor_for(&self, name: &str) -> ConvertResult<&str> {
        self.launcher_for(name, Launcher::Editor)
    }

    fn launcher_for(&self, name: &str, launcher: Launcher) -> ConvertResult<&str> {
        let format = self
            .get_format(name)
            .ok_or_else(|| ConvertError::UnknownFormat(name.to_string()))?;

        let format = match format.parent_format() {
            Some(parent) if launcher.command(format).is_empty() => {
                self.get_format(parent).unwrap_or(format)
            }
            _ => format,
        };

        let command = launcher.command(format);
        if command.is_empty() {
            Err(launcher.missing(name))
        } else {
            Ok(command)
        }
    }

    /// Open `file` in the viewer of `format` without waiting for it.
    pub async fn view(
        &self,
        runner: &dyn CommandRunner,
        file: &Path,
        format: &str,
        address: Option<&str>,
    ) -> ConvertResult<()> {
        let command = self.viewer_for(format)?;
        self.launch(runner, file, command, address).await
    }

    /// Open `file` in the editor of `format` without waiting for it.
    pub async fn edit(
        &self,
        runner: &dyn CommandRunner,
        file: &Path,
        format: &str,
        address: Option<&str>,
    ) -> ConvertResult<()> {
        let command = self.editor_for(format)?;
        self.launch(runner, file, command, address).await
    }

    async fn launch(
        &self,
        runner: &dyn CommandRunner,
        file: &Path,
        template: &str,
        address: Option<&str>,
    ) -> ConvertResult<()> {
        if !file.exists() {
            return Err(ConvertError::FileNotFound(file.to_path_buf()));
        }

        let tokens =
            CommandTokens::for_input(file).with_address(address.map(ToString::to_string));
        let cwd = tokens.directory().unwrap_or_default();
        let command = tokens.substitute(template);
        debug!(%command, "Launching");

        runner
            .spawn_detached(&Invocation::new(command, cwd))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshift_exec::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn create_test_formats() -> Formats {
        let mut formats = Formats::new();
        formats.add_full("latex", "tex", "LaTeX", "L");
        formats.add_full("pdf", "pdf", "PDF", "P");
        formats.add_full("pdf2", "pdf", "PDF (pdflatex)", "F");
        formats.add_full("fax", "", "Fax", "");
        formats.set_viewer("pdf", "xpdf $$i");
        formats
    }

    #[test]
    fn test_add_registers_once() {
        let mut formats = Formats::new();
        formats.add("html");
        formats.add("html");
        assert_eq!(formats.len(), 1);

        let html = formats.get_format("html").unwrap();
        assert_eq!(html.extension, "html");
        assert_eq!(html.pretty_name, "html");
    }

    #[test]
    fn test_add_full_updates_and_keeps_viewer() {
        let mut formats = create_test_formats();
        formats.set_editor("pdf", "pdfedit $$i");
        formats.add_full("pdf", "pdf", "Portable Document", "D");

        assert_eq!(formats.len(), 4);
        let pdf = formats.get_format("pdf").unwrap();
        assert_eq!(pdf.pretty_name, "Portable Document");
        assert_eq!(pdf.shortcut, "D");
        assert_eq!(pdf.viewer, "xpdf $$i");
        assert_eq!(pdf.editor, "pdfedit $$i");
    }

    #[test]
    fn test_get_number_and_erase() {
        let mut formats = create_test_formats();
        assert_eq!(formats.get_number("pdf"), Some(FormatId::new(1)));
        assert_eq!(formats.get_number("nope"), None);

        formats.erase("latex");
        formats.erase("nope");
        assert_eq!(formats.len(), 3);
        assert_eq!(formats.get_number("pdf"), Some(FormatId::new(0)));
        assert_eq!(formats.get(FormatId::new(0)).unwrap().name, "pdf");
    }

    #[test]
    fn test_fallbacks_for_unknown_names() {
        let formats = create_test_formats();
        assert_eq!(formats.pretty_name("latex"), "LaTeX");
        assert_eq!(formats.pretty_name("mystery"), "mystery");
        assert_eq!(formats.extension("latex"), "tex");
        assert_eq!(formats.extension("mystery"), "mystery");
    }

    #[test]
    fn test_get_format_from_file() {
        let formats = create_test_formats();
        let found = formats.get_format_from_file(Path::new("/doc/paper.tex"));
        assert_eq!(found.map(|f| f.name.as_str()), Some("latex"));

        let upper = formats.get_format_from_file(Path::new("PAPER.PDF"));
        assert_eq!(upper.map(|f| f.name.as_str()), Some("pdf"));

        assert!(formats.get_format_from_file(Path::new("noext")).is_none());
    }

    #[test]
    fn test_sort_case_insensitive() {
        let mut formats = Formats::new();
        formats.add_full("b", "b", "beta", "");
        formats.add_full("a", "a", "Alpha", "");
        formats.add_full("c", "c", "Gamma", "");
        formats.sort();

        let names: Vec<_> = formats.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dummy_and_child_formats() {
        let formats = create_test_formats();
        assert!(formats.get_format("fax").unwrap().is_dummy());
        assert!(!formats.get_format("pdf").unwrap().is_dummy());

        let pdf2 = formats.get_format("pdf2").unwrap();
        assert!(pdf2.is_child_format());
        assert_eq!(pdf2.parent_format(), Some("pdf"));
        assert_eq!(formats.get_format("pdf").unwrap().parent_format(), None);
    }

    #[test]
    fn test_viewer_resolution() {
        let formats = create_test_formats();
        assert_eq!(formats.viewer_for("pdf").unwrap(), "xpdf $$i");
        assert_eq!(formats.viewer_for("pdf2").unwrap(), "xpdf $$i");
        assert!(matches!(
            formats.viewer_for("latex"),
            Err(ConvertError::NoViewer(name)) if name == "latex"
        ));
        assert!(matches!(
            formats.editor_for("pdf"),
            Err(ConvertError::NoEditor(_))
        ));
        assert!(matches!(
            formats.viewer_for("mystery"),
            Err(ConvertError::UnknownFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_view_launches_detached_in_file_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paper.pdf");
        std::fs::write(&file, "%PDF").unwrap();

        let mut formats = create_test_formats();
        formats.set_viewer("pdf", "xpdf -remote $$a $$i");
        let runner = RecordingRunner::new();

        formats
            .view(&runner, &file, "pdf2", Some("sock"))
            .await
            .unwrap();

        let launched = runner.detached().await;
        assert_eq!(launched.len(), 1);
        assert_eq!(
            launched[0].command,
            format!("xpdf -remote sock {}", file.display())
        );
        assert_eq!(launched[0].cwd, dir.path().to_path_buf());
        assert!(runner.invocations().await.is_empty());
    }

    #[tokio::test]
    async fn test_view_missing_file() {
        let formats = create_test_formats();
        let runner = RecordingRunner::new();
        let result = formats
            .view(&runner, &PathBuf::from("/nonexistent/paper.pdf"), "pdf", None)
            .await;
        assert!(matches!(result, Err(ConvertError::FileNotFound(_))));
    }
}
