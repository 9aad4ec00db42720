//! Handler for the `render` subcommand.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::adapters::live::LiveProcessExecutor;
use crate::cli::RenderArgs;
use crate::command::CommandSpec;
use crate::config::{self, Config};
use crate::context::ServiceContext;
use crate::document::{Content, RenderOptions};
use crate::runner::CommandRunner;

/// Run the `render` command, writing the rendered document to `out`.
///
/// The converter and the input are resolved before a cassette is opened, so
/// a bad invocation never touches an existing recording. A cassette that
/// cannot be written is logged and does not hold back the rendered output.
///
/// # Errors
///
/// Returns an error string if the converter cannot be resolved, the input
/// cannot be read, or rendering fails.
pub fn run(args: &RenderArgs, out: &mut impl Write) -> Result<(), String> {
    let runner = build_runner(args)?;
    let content = Content::new(read_input(args)?, args.encoding.clone());
    if !content.is_valid() {
        warn!(encoding = %content.encoding(), "input bytes do not match the declared encoding");
    }
    let filename = args
        .filename
        .clone()
        .or_else(|| args.input.as_ref().map(|p| p.display().to_string()))
        .unwrap_or_else(|| "-".to_owned());

    let ctx = context_for(args)?;
    let runner = runner.with_executor(Arc::clone(&ctx.process));
    let result = runner.render(&filename, &content, &RenderOptions::new());
    drop(runner);

    // Write the cassette even when rendering failed.
    match ctx.finish() {
        Ok(Some(path)) => info!(path = %path.display(), "recording saved"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "recording was not saved"),
    }

    let rendered = result.map_err(|e| e.to_string())?;
    out.write_all(rendered.as_bytes())
        .map_err(|e| format!("failed to write output: {e}"))?;
    out.flush()
        .map_err(|e| format!("failed to write output: {e}"))
}

fn context_for(args: &RenderArgs) -> Result<ServiceContext, String> {
    if let Some(path) = &args.replay {
        return ServiceContext::replaying(path).map_err(|e| e.to_string());
    }
    if let Some(path) = &args.record {
        return Ok(ServiceContext::recording(path));
    }
    Ok(ServiceContext::live())
}

fn build_runner(args: &RenderArgs) -> Result<CommandRunner, String> {
    let runner = if let Some(name) = &args.converter {
        let path = config::resolve_path(args.config.as_deref());
        let config = Config::load(&path).map_err(|e| e.to_string())?;
        let converter = config
            .find(name)
            .ok_or_else(|| format!("no converter named `{name}` in {}", path.display()))?;
        converter.runner(Arc::new(LiveProcessExecutor))
    } else {
        let command = CommandSpec::try_from(args.command.clone())
            .map_err(|_| "give --converter <NAME> or a command after `--`".to_owned())?;
        CommandRunner::new(command.program().to_owned(), command)
    };

    Ok(match args.timeout {
        Some(secs) => runner.with_timeout(Duration::from_secs(secs)),
        None => runner,
    })
}

fn read_input(args: &RenderArgs) -> Result<Vec<u8>, String> {
    match &args.input {
        Some(path) => {
            std::fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}
