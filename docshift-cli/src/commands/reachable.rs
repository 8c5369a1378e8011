//! Implementation of the `docshift targets` and `docshift sources` commands.
//!
//! `targets` lists what a format can be converted to, `sources` what can be
//! converted into a format.
//!
//! # Usage
//!
//! ```bash
//! docshift targets latex
//! docshift targets latex --viewable
//! docshift sources lyx
//! ```

use crate::errors::DocshiftError;
use crate::output;
use crate::session::Session;
use docshift_core::Format;
use std::path::PathBuf;

/// Options for the `docshift targets` command.
#[derive(Debug, Clone, Default)]
pub struct TargetsOptions {
    pub config: Option<PathBuf>,
    pub from: String,
    /// Only formats that have a viewer.
    pub viewable: bool,
}

/// Options for the `docshift sources` command.
#[derive(Debug, Clone, Default)]
pub struct SourcesOptions {
    pub config: Option<PathBuf>,
    pub to: String,
}

/// Formats reachable from `from`, by name.
pub fn targets<'a>(session: &'a Session, from: &str, viewable: bool) -> Result<Vec<&'a Format>, DocshiftError> {
    session.require_format(from)?;
    Ok(sorted(
        session
            .converters
            .get_reachable(&session.formats, from, viewable),
    ))
}

/// Formats that can be converted to `to`, by name.
pub fn sources<'a>(session: &'a Session, to: &str) -> Result<Vec<&'a Format>, DocshiftError> {
    session.require_format(to)?;
    Ok(sorted(
        session.converters.get_reachable_to(&session.formats, to),
    ))
}

fn sorted(mut formats: Vec<&Format>) -> Vec<&Format> {
    formats.sort_by(|a, b| a.name.cmp(&b.name));
    formats
}

fn print(formats: &[&Format]) {
    for format in formats {
        output::data(&format!("{}  ({})", format.name, format.pretty_name));
    }
}

/// Run the `docshift targets` command.
pub fn run_targets(options: TargetsOptions) -> Result<(), DocshiftError> {
    let session = Session::load(options.config.as_deref())?;
    let formats = targets(&session, &options.from, options.viewable)?;
    print(&formats);
    Ok(())
}

/// Run the `docshift sources` command.
pub fn run_sources(options: SourcesOptions) -> Result<(), DocshiftError> {
    let session = Session::load(options.config.as_deref())?;
    let formats = sources(&session, &options.to)?;
    print(&formats);
    Ok(())
}
