//! [Command-line interface](Cli) (CLI) of the main binary.

#[cfg(test)]
mod tests;

use crate::model::TSModel;
use crate::server::{self, ServerConfig};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Report, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;
use strum::Display;

// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is intended for parsing user input from the command-line in the main function. This is achieved with the `parse` function, which parses the command line arguments from [`std::env::args`](https://doc.rust-lang.org/std/env/fn.args.html).
/// ```no_run
/// use clap::Parser;
/// let args = tsqc::Cli::parse();
/// ```
/// Here is a manual example of setting the command-line input:
/// ```rust
/// # use clap::Parser;
/// let dir  = tempfile::tempdir()?;
/// let path = dir.path().join("example.trees");
/// std::fs::write(&path, tsqc_trees::examples::example_1().to_bytes())?;
///
/// let input = ["tsqc", "serve", path.to_str().unwrap(), "--port", "9000"];
/// let args  = tsqc::Cli::parse_from(input);
/// serde_json::to_string_pretty(&args)?;
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
/// With the following pretty JSON representation:
/// ```json
/// {
///   "command": {
///     "Serve": {
///       "path": "/tmp/.tmpXXXXXX/example.trees",
///       "port": 9000,
///       "host": "127.0.0.1"
///     }
///   },
///   "verbosity": "Info"
/// }
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "tsqc", author, version)]
#[clap(about = "tsqc is a quality-control dashboard for tree sequence files.")]
pub struct Cli {
    #[clap(subcommand)]
    /// Pass CLI arguments to a particular [Command].
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants). Used to decide which runtime [Command](#variants) the CLI arguments should be passed to.
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    /// Pass CLI arguments to [serve].
    #[clap(about = "Run the tsqc server.")]
    Serve(ServeArgs),

    /// Pass CLI arguments to [info].
    #[clap(about = "Print a summary of a tree sequence file.")]
    Info(InfoArgs),
}

// ----------------------------------------------------------------------------
// Arguments
// ----------------------------------------------------------------------------

/// Serve arguments.
#[derive(Clone, Debug, Deserialize, Parser, Serialize)]
#[clap(verbatim_doc_comment)]
pub struct ServeArgs {
    /// Tree sequence file.
    ///
    /// A tskit .trees file, or a zstd-compressed one.
    #[clap(value_parser = existing_file)]
    pub path: PathBuf,

    /// Port to serve on.
    #[clap(short = 'p', long, env = "TSQC_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to listen on.
    #[clap(long, env = "TSQC_HOST", default_value = "127.0.0.1")]
    pub host: String,
}

/// Info arguments.
#[derive(Clone, Debug, Deserialize, Parser, Serialize)]
#[clap(verbatim_doc_comment)]
pub struct InfoArgs {
    /// Tree sequence file.
    #[clap(value_parser = existing_file)]
    pub path: PathBuf,

    /// Output format.
    #[clap(short = 'f', long, value_enum, default_value_t = InfoFormat::default())]
    pub format: InfoFormat,
}

/// Output format of the [info] command.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, PartialEq, Serialize, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum InfoFormat {
    #[default]
    Markdown,
    Json,
}

/// Accepts paths to existing files, not directories.
fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(format!("File does not exist: {value:?}"));
    }
    if path.is_dir() {
        return Err(format!("Path is a directory: {value:?}"));
    }
    Ok(path)
}

// ----------------------------------------------------------------------------
// Verbosity
// ----------------------------------------------------------------------------

/// The output verbosity level.
///
/// Displayed in lowercase, as `RUST_LOG` expects.
///
/// ```rust
/// use tsqc::Verbosity;
/// assert_eq!(Verbosity::default().to_string(), "info");
/// assert_eq!(Verbosity::Debug.to_string(), "debug");
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, PartialEq, Serialize, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Info,
    Warn,
    Debug,
    Error,
}

// ----------------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------------

/// Load the dataset once, then serve it until Ctrl+C.
///
/// A dataset that fails to load is fatal; the server is never started.
pub async fn serve(args: &ServeArgs) -> Result<(), Report> {
    let model = TSModel::load(&args.path)?;
    server::run_server(model, ServerConfig::from(args)).await
}

/// Summarize a tree sequence file.
///
/// ## Examples
///
/// ```rust
/// use tsqc::cli::{info, InfoArgs, InfoFormat};
/// let dir  = tempfile::tempdir()?;
/// let path = dir.path().join("example.trees");
/// std::fs::write(&path, tsqc_trees::examples::example_1().to_bytes())?;
///
/// let args    = InfoArgs { path, format: InfoFormat::Markdown };
/// let summary = info(&args)?;
/// assert!(summary.lines().any(|line| line.contains("Trees") && line.contains(" 2 ")));
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn info(args: &InfoArgs) -> Result<String, Report> {
    let summary = TSModel::load(&args.path)?.summary();
    let output = match args.format {
        InfoFormat::Markdown => summary.to_table().to_markdown(),
        InfoFormat::Json => serde_json::to_string_pretty(&summary)?,
    };
    Ok(output)
}
