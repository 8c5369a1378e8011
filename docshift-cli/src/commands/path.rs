//! Implementation of the `docshift path` command.
//!
//! Shows the converter chain between two formats without running it.
//!
//! # Usage
//!
//! ```bash
//! docshift path latex pdf
//! docshift path latex pdf --json
//! ```

use crate::errors::DocshiftError;
use crate::output;
use crate::session::Session;
use docshift_core::{ConvertError, Converter, Converters, Flavor};
use serde::Serialize;
use std::path::PathBuf;

/// Options for the `docshift path` command.
#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    pub config: Option<PathBuf>,
    pub from: String,
    pub to: String,
    /// Print JSON instead of a list.
    pub json: bool,
}

/// A converter chain as printed by `docshift path`.
#[derive(Debug, Serialize)]
pub struct PathReport<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub flavor: Flavor,
    pub steps: Vec<&'a Converter>,
}

impl<'a> PathReport<'a> {
    /// Resolve the chain from `from` to `to`.
    ///
    /// Same-format requests give an empty chain; otherwise an empty chain
    /// means there is no route.
    pub fn build(
        session: &'a Session,
        from: &'a str,
        to: &'a str,
    ) -> Result<Self, DocshiftError> {
        session.require_format(from)?;
        session.require_format(to)?;

        let path = session.converters.get_path(&session.formats, from, to);
        if path.is_empty() && from != to {
            return Err(ConvertError::NoConversionPath {
                from: from.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        Ok(Self {
            from,
            to,
            flavor: session.converters.flavor(&path),
            steps: steps(&session.converters, path.iter()),
        })
    }
}

fn steps(converters: &Converters, path: impl Iterator<Item = usize>) -> Vec<&Converter> {
    path.filter_map(|index| converters.get(index)).collect()
}

/// Run the `docshift path` command.
pub fn run_path(options: PathOptions) -> Result<(), DocshiftError> {
    let session = Session::load(options.config.as_deref())?;
    let report = PathReport::build(&session, &options.from, &options.to)?;

    if options.json {
        output::data(&serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.steps.is_empty() {
        output::info(&format!("{} needs no conversion", report.from));
        return Ok(());
    }

    for (i, converter) in report.steps.iter().enumerate() {
        output::data(output::step_line(i + 1, converter));
    }
    if report.steps.iter().any(|c| c.is_latex()) {
        output::verbose(&format!("Document is written for {}", report.flavor));
    }
    Ok(())
}
