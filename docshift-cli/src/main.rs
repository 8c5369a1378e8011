//! docshift - Convert documents by chaining external converters.
//!
//! docshift reads a table of formats and converter commands, finds the
//! shortest chain of converters between two formats, and runs it.
//!
//! # Commands
//!
//! - `docshift init` - Write a default configuration file
//! - `docshift formats` - List the configured formats
//! - `docshift path` - Show the converter chain between two formats
//! - `docshift targets` / `docshift sources` - What a format converts to or from
//! - `docshift export` - Convert a file and copy the result next to it
//! - `docshift preview` - Convert a file and open the result
//! - `docshift view` / `docshift edit` - Open a file in its viewer or editor
//! - `docshift import` - Convert a file into a loadable format
//!
//! # Usage
//!
//! ```bash
//! docshift init
//! docshift path latex pdf
//! docshift export paper.tex --to pdf
//! docshift --verbose import paper.tex
//! ```

use clap::{ArgAction, Parser, Subcommand};
use docshift_cli::errors::DocshiftError;
use docshift_cli::{commands, output};
use std::future::Future;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// docshift - Convert documents by chaining external converters
#[derive(Parser)]
#[command(name = "docshift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Show detailed progress (repeat for more)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only print errors and requested data
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new docshift.yaml configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short)]
        output: Option<String>,

        /// Overwrite existing configuration file
        #[arg(long, short)]
        force: bool,
    },

    /// List the configured formats
    Formats {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the converter chain between two formats
    Path {
        from: String,
        to: String,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List the formats a format can be converted to
    Targets {
        from: String,

        /// Only formats that have a viewer
        #[arg(long)]
        viewable: bool,
    },

    /// List the formats that can be converted to a format
    Sources { to: String },

    /// Convert a file and copy the result next to it
    Export {
        file: PathBuf,

        /// Target format
        #[arg(long, short)]
        to: String,

        /// Format of the file (default: guessed from the extension)
        #[arg(long, short)]
        from: Option<String>,

        /// Leave the result in a scratch directory
        #[arg(long)]
        temp: bool,

        /// Overwrite existing files without asking
        #[arg(long, short)]
        yes: bool,
    },

    /// Convert a file and open the result in its viewer
    Preview {
        file: PathBuf,

        /// Target format
        #[arg(long, short)]
        to: String,

        /// Format of the file (default: guessed from the extension)
        #[arg(long, short)]
        from: Option<String>,
    },

    /// Open a file in the viewer for its format
    View {
        file: PathBuf,

        /// Format of the file (default: guessed from the extension)
        #[arg(long, short)]
        format: Option<String>,
    },

    /// Open a file in the editor for its format
    Edit {
        file: PathBuf,

        /// Format of the file (default: guessed from the extension)
        #[arg(long, short)]
        format: Option<String>,
    },

    /// Convert a file into a format an editor can load
    Import {
        file: PathBuf,

        /// Format of the file (default: guessed from the extension)
        #[arg(long, short)]
        from: Option<String>,
    },
}

/// Install the tracing subscriber. `DOCSHIFT_LOG` wins over `RUST_LOG`.
fn init_logging(verbosity: u8) {
    let default = if verbosity > 0 { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DOCSHIFT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Drive an async command to completion on a fresh runtime.
fn block_on<T>(future: impl Future<Output = Result<T, DocshiftError>>) -> Result<(), String> {
    match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime
            .block_on(future)
            .map(|_| ())
            .map_err(|e| e.format_for_cli()),
        Err(e) => Err(format!("Error: Failed to create tokio runtime: {}", e)),
    }
}

fn main() {
    let cli = Cli::parse();

    output::set_level(output::Level::from_flags(cli.quiet, cli.verbose));
    init_logging(cli.verbose);

    let config = cli.config;
    let result = match cli.command {
        Commands::Init { output, force } => {
            let options = commands::InitOptions { output, force };
            commands::run_init(options).map_err(|e| format!("Error: {}", e))
        }
        Commands::Formats { json } => {
            let options = commands::FormatsOptions { config, json };
            commands::run_formats(options).map_err(|e| e.format_for_cli())
        }
        Commands::Path { from, to, json } => {
            let options = commands::PathOptions {
                config,
                from,
                to,
                json,
            };
            commands::run_path(options).map_err(|e| e.format_for_cli())
        }
        Commands::Targets { from, viewable } => {
            let options = commands::TargetsOptions {
                config,
                from,
                viewable,
            };
            commands::run_targets(options).map_err(|e| e.format_for_cli())
        }
        Commands::Sources { to } => {
            let options = commands::SourcesOptions { config, to };
            commands::run_sources(options).map_err(|e| e.format_for_cli())
        }
        Commands::Export {
            file,
            to,
            from,
            temp,
            yes,
        } => {
            let options = commands::ExportOptions {
                config,
                file,
                to,
                from,
                temp,
                yes,
            };
            block_on(commands::run_export(options))
        }
        Commands::Preview { file, to, from } => {
            let options = commands::PreviewOptions {
                config,
                file,
                to,
                from,
            };
            block_on(commands::run_preview(options))
        }
        Commands::View { file, format } => {
            let options = commands::LaunchOptions {
                config,
                file,
                format,
                mode: commands::LaunchMode::View,
            };
            block_on(commands::run_launch(options))
        }
        Commands::Edit { file, format } => {
            let options = commands::LaunchOptions {
                config,
                file,
                format,
                mode: commands::LaunchMode::Edit,
            };
            block_on(commands::run_launch(options))
        }
        Commands::Import { file, from } => {
            let options = commands::ImportOptions { config, file, from };
            block_on(commands::run_import(options))
        }
    };

    if let Err(message) = result {
        output::error(&message);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "docshift", "-v", "export", "paper.tex", "--to", "pdf", "--yes", "--config", "x.yaml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Export { ref to, yes: true, temp: false, .. } if to == "pdf"
        ));
    }
}
