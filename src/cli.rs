//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::document::Encoding;
use crate::logging::LogFormat;

/// Top-level CLI parser for `markup-command`.
#[derive(Debug, Parser)]
#[command(
    name = "markup-command",
    version,
    about = "Render markup documents through external converters"
)]
pub struct Cli {
    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Format of log lines.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a document and print the result.
    Render(RenderArgs),
    /// List the configured converters.
    List {
        /// Converter configuration file.
        #[arg(long, env = "MARKUP_COMMAND_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Arguments of `render`.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Converter configuration file.
    #[arg(long, env = "MARKUP_COMMAND_CONFIG")]
    pub config: Option<PathBuf>,
    /// Name of a configured converter.
    #[arg(short, long, conflicts_with = "command")]
    pub converter: Option<String>,
    /// Read the document from this file instead of stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// File name reported to the converter runner (defaults to the input path).
    #[arg(long)]
    pub filename: Option<String>,
    /// Declared encoding of the document.
    #[arg(long, default_value = "UTF-8")]
    pub encoding: Encoding,
    /// Kill the converter after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Record the converter run into this cassette file.
    #[arg(long, env = "MARKUP_COMMAND_RECORD", conflicts_with = "replay")]
    pub record: Option<PathBuf>,
    /// Serve the converter from this cassette file instead of spawning it.
    #[arg(long)]
    pub replay: Option<PathBuf>,
    /// Converter command line, given after `--`.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
