//! CLI commands for docshift.
//!
//! - `docshift init` - Write a default `docshift.yaml`
//! - `docshift formats` - List the configured formats
//! - `docshift path` - Show the converter chain between two formats
//! - `docshift targets` / `docshift sources` - Reachability listings
//! - `docshift export` / `docshift preview` - Convert a file and copy or view the result
//! - `docshift view` / `docshift edit` - Open a file in its format's viewer or editor
//! - `docshift import` - Convert a file to something an editor can load

pub mod export;
pub mod formats;
pub mod import;
pub mod init;
pub mod launch;
pub mod path;
pub mod reachable;

pub use export::{ExportOptions, PreviewOptions, run_export, run_preview};
pub use formats::{FormatsOptions, run_formats};
pub use import::{ImportOptions, run_import};
pub use init::{InitError, InitOptions, run_init};
pub use launch::{LaunchMode, LaunchOptions, run_launch};
pub use path::{PathOptions, run_path};
pub use reachable::{SourcesOptions, TargetsOptions, run_sources, run_targets};
