//! Replaying adapter for the `ProcessExecutor` port.

use std::io;
use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;
use crate::command::CommandSpec;
use crate::ports::process::{ExecuteError, ProcessExecutor, ProcessOutput};

/// Replays recorded converter runs from a cassette.
pub struct ReplayingProcessExecutor {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingProcessExecutor {
    /// Creates a new replaying executor from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self {
            replayer: Mutex::new(replayer),
        }
    }
}

#[derive(Deserialize)]
struct ReplayedOutput {
    exit_code: Option<i32>,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
}

#[derive(Deserialize)]
struct ReplayedError {
    kind: String,
    #[serde(default)]
    program: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    limit_ms: u64,
}

impl ProcessExecutor for ReplayingProcessExecutor {
    fn execute(
        &self,
        command: &CommandSpec,
        _stdin: &[u8],
        _timeout: Option<Duration>,
    ) -> Result<ProcessOutput, ExecuteError> {
        let output = {
            let mut replayer = self
                .replayer
                .lock()
                .map_err(|_| ExecuteError::Replay("replayer lock poisoned".into()))?;
            let interaction = replayer
                .next_interaction("process", "execute")
                .map_err(|e| ExecuteError::Replay(e.to_string()))?;
            interaction.output.clone()
        };

        if let Some(err) = output.get("err") {
            return Err(replayed_error(command, err.clone()));
        }
        let value = output.get("ok").cloned().unwrap_or(output);
        let replayed: ReplayedOutput = serde_json::from_value(value)
            .map_err(|e| ExecuteError::Replay(format!("malformed process output: {e}")))?;
        Ok(ProcessOutput {
            exit_code: replayed.exit_code,
            stdout: replayed.stdout.into_bytes(),
            stderr: replayed.stderr.into_bytes(),
        })
    }
}

fn replayed_error(command: &CommandSpec, err: Value) -> ExecuteError {
    let err: ReplayedError = match serde_json::from_value(err) {
        Ok(err) => err,
        Err(e) => return ExecuteError::Replay(format!("malformed process error: {e}")),
    };
    match err.kind.as_str() {
        "spawn" => ExecuteError::Spawn {
            program: err.program.unwrap_or_else(|| command.program().to_owned()),
            source: io::Error::new(io::ErrorKind::NotFound, err.message),
        },
        "io" => ExecuteError::Io(io::Error::other(err.message)),
        "timed_out" => ExecuteError::TimedOut {
            limit: Duration::from_millis(err.limit_ms),
        },
        _ => ExecuteError::Replay(err.message),
    }
}
