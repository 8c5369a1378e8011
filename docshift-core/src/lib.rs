//! # docshift-core
//!
//! Format registry, converter chains, export and import.
//!
//! This crate turns configured tables of formats and external converter
//! commands into working conversions:
//!
//! - [`Formats`]: the format registry with viewer and editor launching
//! - [`Converters`]: the converter registry, its graph and path queries,
//!   and [`Converters::convert`] which runs a chain step by step
//! - [`Exporter`]: writes a [`Document`] in a backend format, converts it
//!   and copies the result next to the document
//! - [`Importer`]: converts a foreign file to something a
//!   [`DocumentLoader`] can take over
//!
//! External processes are started through a
//! [`docshift_exec::CommandRunner`], so everything here can be driven by a
//! recording runner in tests.
//!
//! ## Example
//!
//! ```rust,ignore
//! use docshift_core::{ConversionContext, Converters, Formats};
//! use docshift_exec::ShellRunner;
//!
//! let mut formats = Formats::new();
//! formats.add_full("latex", "tex", "LaTeX", "L");
//! formats.add_full("dvi", "dvi", "DVI", "D");
//!
//! let mut converters = Converters::new();
//! converters.add(&mut formats, "latex", "dvi", "latex $$i", "latex")?;
//! converters.build_graph(&formats)?;
//!
//! let runner = ShellRunner::new();
//! let ctx = ConversionContext::new(&runner, "/work");
//! let conversion = converters
//!     .convert(&formats, &ctx, "/work/paper.tex".as_ref(), "/work/paper".as_ref(), "latex", "dvi")
//!     .await?;
//! ```

pub mod convert;
pub mod converter;
pub mod converters;
pub mod copy;
pub mod document;
pub mod error;
pub mod exporter;
mod files;
pub mod format;
pub mod importer;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types for convenience
pub use convert::{Conversion, ConversionContext, ConversionObserver, ExecutionSettings};
pub use converter::{Converter, ConverterFlags, Flavor};
pub use converters::{Converters, DEFAULT_NATIVE_FORMAT};
pub use document::{
    Document, DocumentLoader, ExternalFile, OverwriteChoice, UserInterface, WriteParams,
    WriteReport,
};
pub use error::{ConvertError, ConvertResult};
pub use exporter::{DEFAULT_TEXT_FORMAT, Exported, Exporter};
pub use format::{Format, FormatId, Formats};
pub use importer::{DEFAULT_TEXT_PARAGRAPH_FORMAT, Imported, Importer, Loader, LoaderFormats};
