//! Render markup documents by piping them through external converters.
//!
//! [`CommandRunner`] feeds a document to a command on stdin, captures its
//! stdout, strips carriage returns and hands the result to an optional
//! post-processing step. The rest of the crate is the CLI, the converter
//! configuration file, and record/replay support for converter runs.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod logging;
pub mod ports;
pub mod post_process;
pub mod runner;

pub use command::CommandSpec;
pub use document::{Content, Encoding, RenderOptions};
pub use error::RenderError;
pub use post_process::{PostProcess, PostProcessKind};
pub use runner::CommandRunner;

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string().trim_end().to_owned()),
    };
    logging::init(cli.verbose, cli.log_format);
    commands::dispatch(&cli.command)
}
