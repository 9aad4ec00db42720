//! Command dispatch and handlers.

pub mod list;
pub mod render;

use crate::cli::Command;

/// Dispatch a parsed command to its handler, writing results to stdout.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Render(args) => render::run(args, &mut out),
        Command::List { config } => list::run(config.as_deref(), &mut out),
    }
}
