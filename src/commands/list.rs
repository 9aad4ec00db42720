//! Handler for the `list` subcommand.

use std::io::Write;
use std::path::Path;

use crate::config::{self, Config};

/// Print every configured converter as `name<TAB>command`.
///
/// # Errors
///
/// Returns an error string if the configuration cannot be loaded or the
/// listing cannot be written.
pub fn run(config_path: Option<&Path>, out: &mut impl Write) -> Result<(), String> {
    let path = config::resolve_path(config_path);
    let config = Config::load(&path).map_err(|e| e.to_string())?;

    if config.converters.is_empty() {
        writeln!(out, "No converters configured in {}", path.display())
            .map_err(|e| e.to_string())?;
        return Ok(());
    }
    for converter in &config.converters {
        writeln!(out, "{}\t{}", converter.name, converter.command).map_err(|e| e.to_string())?;
    }
    Ok(())
}
