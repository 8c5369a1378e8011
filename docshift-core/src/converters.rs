//! Converter registry and path queries.

use crate::converter::{Converter, ConverterFlags, Flavor};
use crate::error::{ConvertError, ConvertResult};
use crate::format::{Format, FormatId, Formats};
use docshift_graph::{EdgePath, FormatGraph};
use tracing::debug;

/// Name of the native document format unless configured otherwise.
pub const DEFAULT_NATIVE_FORMAT: &str = "lyx";

/// The registry of converters and the graph built from it.
///
/// Converter indices are registration positions and equal the edge indices
/// of the graph. The graph is only valid after [`Converters::build_graph`]
/// and must be rebuilt whenever converters or formats change.
#[derive(Debug)]
pub struct Converters {
    converters: Vec<Converter>,
    graph: FormatGraph,

    /// Command of the LaTeX converter used to refresh `.aux` files
    latex_command: Option<String>,

    /// Format that reachability listings never report
    native_format: String,
}

impl Default for Converters {
    fn default() -> Self {
        Self::new()
    }
}

impl Converters {
    /// Create a new empty registry with the default native format.
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
            graph: FormatGraph::new(),
            latex_command: None,
            native_format: DEFAULT_NATIVE_FORMAT.to_string(),
        }
    }

    /// Set the native format name (builder pattern).
    pub fn with_native_format(mut self, name: impl Into<String>) -> Self {
        self.native_format = name.into();
        self
    }

    pub fn native_format(&self) -> &str {
        &self.native_format
    }

    // === Registry ===

    /// Register a converter, or update the one with the same `(from, to)`.
    ///
    /// Missing formats are registered by name. A LaTeX converter becomes the
    /// command used to refresh `.aux` files if none is known yet, or if it
    /// produces DVI.
    pub fn add(
        &mut self,
        formats: &mut Formats,
        from: &str,
        to: &str,
        command: &str,
        flags: &str,
    ) -> ConvertResult<usize> {
        formats.add(from);
        formats.add(to);

        let flags = ConverterFlags::parse(flags, formats.extension(to))?;
        let converter = Converter::new(from, to, command, flags);

        if converter.is_latex() && (self.latex_command.is_none() || to == "dvi") {
            self.latex_command = Some(command.to_string());
        }

        let index = match self.get_number(from, to) {
            Some(index) => {
                self.converters[index] = converter;
                index
            }
            None => {
                self.converters.push(converter);
                self.converters.len() - 1
            }
        };

        debug!(from, to, index, "Registered converter");
        Ok(index)
    }

    /// Remove the converter for `(from, to)`. Later indices shift down.
    pub fn erase(&mut self, from: &str, to: &str) {
        self.converters.retain(|c| !(c.from == from && c.to == to));
    }

    pub fn get_converter(&self, from: &str, to: &str) -> Option<&Converter> {
        self.converters.iter().find(|c| c.from == from && c.to == to)
    }

    /// Index of the converter for `(from, to)`.
    pub fn get_number(&self, from: &str, to: &str) -> Option<usize> {
        self.converters
            .iter()
            .position(|c| c.from == from && c.to == to)
    }

    /// Get a converter by index.
    pub fn get(&self, index: usize) -> Option<&Converter> {
        self.converters.get(index)
    }

    /// Whether any converter reads or writes the format.
    pub fn format_is_used(&self, name: &str) -> bool {
        self.converters
            .iter()
            .any(|c| c.from == name || c.to == name)
    }

    pub fn latex_command(&self) -> Option<&str> {
        self.latex_command.as_deref()
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Iterate over converters in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Converter> {
        self.converters.iter()
    }

    // === Graph ===

    /// Reset the graph to one vertex per format and one edge per converter.
    pub fn build_graph(&mut self, formats: &Formats) -> ConvertResult<()> {
        self.graph.init(formats.len());
        for converter in &self.converters {
            let from = formats
                .get_number(&converter.from)
                .ok_or_else(|| ConvertError::UnknownFormat(converter.from.clone()))?;
            let to = formats
                .get_number(&converter.to)
                .ok_or_else(|| ConvertError::UnknownFormat(converter.to.clone()))?;
            self.graph.add_edge(from.index(), to.index())?;
        }
        debug!(
            formats = formats.len(),
            converters = self.converters.len(),
            "Built format graph"
        );
        Ok(())
    }

    pub fn graph(&self) -> &FormatGraph {
        &self.graph
    }

    /// Shortest converter chain between two formats.
    ///
    /// Empty for `from == to`, for unknown formats and when there is no route.
    pub fn get_path(&self, formats: &Formats, from: &str, to: &str) -> EdgePath {
        match (formats.get_number(from), formats.get_number(to)) {
            (Some(from), Some(to)) => self.graph.get_path(from.index(), to.index()),
            _ => EdgePath::new(),
        }
    }

    /// Whether `to` can be produced from `from`. A known format reaches itself.
    pub fn is_reachable(&self, formats: &Formats, from: &str, to: &str) -> bool {
        match (formats.get_number(from), formats.get_number(to)) {
            (Some(from), Some(to)) => self.graph.is_reachable(from.index(), to.index()),
            _ => false,
        }
    }

    /// Formats reachable from `from`, itself included, never the native
    /// format. With `only_viewable`, only formats that have a viewer.
    pub fn get_reachable<'f>(
        &self,
        formats: &'f Formats,
        from: &str,
        only_viewable: bool,
    ) -> Vec<&'f Format> {
        self.get_reachable_from_any(formats, &[from], only_viewable)
    }

    /// Union of [`Converters::get_reachable`] over several sources, without
    /// duplicates.
    pub fn get_reachable_from_any<'f>(
        &self,
        formats: &'f Formats,
        sources: &[&str],
        only_viewable: bool,
    ) -> Vec<&'f Format> {
        let mut traversal = self.graph.traversal();
        let mut result = Vec::new();

        for source in sources {
            let Some(start) = formats.get_number(source) else {
                continue;
            };
            let reached = traversal.reachable(start.index(), |v| {
                formats.get(FormatId::new(v)).is_some_and(|f| {
                    f.name != self.native_format && (!only_viewable || f.has_viewer())
                })
            });
            result.extend(reached.into_iter().filter_map(|v| formats.get(FormatId::new(v))));
        }

        result
    }

    /// Formats from which `target` can be produced, `target` included unless
    /// it is the native format.
    pub fn get_reachable_to<'f>(&self, formats: &'f Formats, target: &str) -> Vec<&'f Format> {
        self.get_reachable_to_any(formats, &[target])
    }

    /// Union of [`Converters::get_reachable_to`] over several targets,
    /// without duplicates.
    pub fn get_reachable_to_any<'f>(
        &self,
        formats: &'f Formats,
        targets: &[&str],
    ) -> Vec<&'f Format> {
        let mut traversal = self.graph.traversal();
        let mut result = Vec::new();

        for target in targets {
            let Some(end) = formats.get_number(target) else {
                continue;
            };
            let skip_self = *target == self.native_format;
            let reached =
                traversal.reachable_to(end.index(), |v| !(skip_self && v == end.index()));
            result.extend(reached.into_iter().filter_map(|v| formats.get(FormatId::new(v))));
        }

        result
    }

    /// The flavor a path needs: decided by its first LaTeX converter.
    pub fn flavor(&self, path: &EdgePath) -> Flavor {
        path.iter()
            .filter_map(|index| self.converters.get(index))
            .find_map(|c| c.latex_flavor)
            .unwrap_or_default()
    }

    /// Whether the first LaTeX converter on the path produces PDF.
    pub fn use_pdflatex(&self, path: &EdgePath) -> bool {
        self.flavor(path) == Flavor::PdfLatex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// lyx -> latex -> dvi -> {pdf, ps}, ps -> pdf, latex -> pdf2
    fn create_test_registry() -> (Formats, Converters) {
        let mut formats = Formats::new();
        formats.add_full("lyx", "lyx", "LyX", "");
        formats.add_full("latex", "tex", "LaTeX", "");
        formats.add_full("dvi", "dvi", "DVI", "");
        formats.add_full("ps", "ps", "PostScript", "");
        formats.add_full("pdf", "pdf", "PDF (ps2pdf)", "");
        formats.add_full("pdf2", "pdf", "PDF (pdflatex)", "");
        formats.set_viewer("pdf", "xpdf $$i");
        formats.set_viewer("dvi", "xdvi $$i");

        let mut converters = Converters::new();
        for (from, to, command, flags) in [
            ("lyx", "latex", "lyx --export latex $$i", ""),
            ("latex", "dvi", "latex $$i", "latex"),
            ("dvi", "pdf", "dvipdfm $$i", ""),
            ("dvi", "ps", "dvips -o $$o $$i", ""),
            ("ps", "pdf", "ps2pdf $$i $$o", ""),
            ("latex", "pdf2", "pdflatex $$i", "latex"),
        ] {
            converters
                .add(&mut formats, from, to, command, flags)
                .unwrap();
        }
        converters.build_graph(&formats).unwrap();
        (formats, converters)
    }

    fn names(formats: &[&Format]) -> Vec<String> {
        formats.iter().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn test_add_registers_missing_formats() {
        let mut formats = Formats::new();
        let mut converters = Converters::new();
        converters
            .add(&mut formats, "tex", "html", "htlatex $$i", "")
            .unwrap();

        assert_eq!(formats.len(), 2);
        assert!(formats.get_format("html").is_some());
        assert!(converters.format_is_used("tex"));
        assert!(!converters.format_is_used("pdf"));
    }

    #[test]
    fn test_add_upserts_by_pair() {
        let (mut formats, mut converters) = create_test_registry();
        let before = converters.len();

        let index = converters
            .add(&mut formats, "dvi", "ps", "dvips -Ppdf -o $$o $$i", "")
            .unwrap();

        assert_eq!(converters.len(), before);
        assert_eq!(index, 3);
        assert_eq!(converters.get(3).unwrap().command, "dvips -Ppdf -o $$o $$i");
    }

    #[test]
    fn test_add_rejects_bad_flags() {
        let mut formats = Formats::new();
        let mut converters = Converters::new();
        let result = converters.add(&mut formats, "a", "b", "x", "frobnicate");
        assert!(matches!(result, Err(ConvertError::InvalidFlag { .. })));
        assert!(converters.is_empty());
    }

    #[test]
    fn test_latex_command_prefers_dvi() {
        let mut formats = Formats::new();
        let mut converters = Converters::new();
        converters
            .add(&mut formats, "latex", "pdf2", "pdflatex $$i", "latex")
            .unwrap();
        assert_eq!(converters.latex_command(), Some("pdflatex $$i"));

        converters
            .add(&mut formats, "latex", "dvi", "latex $$i", "latex")
            .unwrap();
        assert_eq!(converters.latex_command(), Some("latex $$i"));

        converters
            .add(&mut formats, "latex", "pdf3", "xelatex $$i", "latex")
            .unwrap();
        assert_eq!(converters.latex_command(), Some("latex $$i"));
    }

    #[test]
    fn test_erase_and_lookup() {
        let (_, mut converters) = create_test_registry();
        assert_eq!(converters.get_number("ps", "pdf"), Some(4));
        converters.erase("dvi", "ps");
        assert!(converters.get_converter("dvi", "ps").is_none());
        assert_eq!(converters.get_number("ps", "pdf"), Some(3));
    }

    #[test]
    fn test_get_path_through_dvi() {
        let (formats, converters) = create_test_registry();
        let path = converters.get_path(&formats, "lyx", "pdf");

        let steps: Vec<_> = path
            .iter()
            .map(|i| {
                let c = converters.get(i).unwrap();
                (c.from.as_str(), c.to.as_str())
            })
            .collect();
        assert_eq!(
            steps,
            vec![("lyx", "latex"), ("latex", "dvi"), ("dvi", "pdf")]
        );
    }

    #[test]
    fn test_get_path_identity_and_unknown() {
        let (formats, converters) = create_test_registry();
        for format in formats.iter() {
            assert!(converters.get_path(&formats, &format.name, &format.name).is_empty());
        }
        assert!(converters.get_path(&formats, "lyx", "mystery").is_empty());
        assert!(!converters.is_reachable(&formats, "mystery", "mystery"));
        assert!(converters.is_reachable(&formats, "ps", "ps"));
    }

    #[test]
    fn test_get_reachable_skips_native() {
        let (formats, converters) = create_test_registry();
        let reached = converters.get_reachable(&formats, "lyx", false);
        assert_eq!(
            names(&reached),
            vec!["latex", "dvi", "pdf2", "pdf", "ps"]
        );
    }

    #[test]
    fn test_get_reachable_only_viewable() {
        let (formats, converters) = create_test_registry();
        let reached = converters.get_reachable(&formats, "latex", true);
        assert_eq!(names(&reached), vec!["dvi", "pdf"]);
        assert!(reached.iter().all(|f| f.has_viewer()));
    }

    #[test]
    fn test_get_reachable_from_any_merges() {
        let (formats, converters) = create_test_registry();
        let reached = converters.get_reachable_from_any(&formats, &["ps", "dvi"], false);
        assert_eq!(names(&reached), vec!["ps", "pdf", "dvi"]);
    }

    #[test]
    fn test_get_reachable_to() {
        let (formats, converters) = create_test_registry();
        let sources = converters.get_reachable_to(&formats, "ps");
        assert_eq!(names(&sources), vec!["ps", "dvi", "latex", "lyx"]);

        // the native format never lists itself as a source
        let sources = converters.get_reachable_to(&formats, "lyx");
        assert!(sources.is_empty());
    }

    #[test]
    fn test_flavor_decided_by_first_latex_step() {
        let (formats, converters) = create_test_registry();

        let dvi_route = converters.get_path(&formats, "lyx", "ps");
        assert_eq!(converters.flavor(&dvi_route), Flavor::Latex);
        assert!(!converters.use_pdflatex(&dvi_route));

        let pdf_route = converters.get_path(&formats, "latex", "pdf2");
        assert_eq!(converters.flavor(&pdf_route), Flavor::PdfLatex);

        let no_latex = converters.get_path(&formats, "ps", "pdf");
        assert_eq!(converters.flavor(&no_latex), Flavor::Latex);
    }

    #[test]
    fn test_build_graph_after_sort() {
        let (mut formats, mut converters) = create_test_registry();
        formats.sort();
        converters.build_graph(&formats).unwrap();

        let path = converters.get_path(&formats, "dvi", "pdf");
        assert_eq!(path.as_slice(), &[2]);
    }

    #[test]
    fn test_build_graph_unknown_format() {
        let (mut formats, mut converters) = create_test_registry();
        formats.erase("ps");
        let result = converters.build_graph(&formats);
        assert!(matches!(result, Err(ConvertError::UnknownFormat(name)) if name == "ps"));
    }
}
