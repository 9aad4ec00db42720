//! Recording adapter for the `ProcessExecutor` port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::command::CommandSpec;
use crate::ports::process::{ExecuteError, ProcessExecutor, ProcessOutput};

/// Records converter runs while delegating to an inner executor.
pub struct RecordingProcessExecutor {
    inner: Arc<dyn ProcessExecutor>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingProcessExecutor {
    /// Creates a new recording executor wrapping the given implementation.
    pub fn new(inner: Arc<dyn ProcessExecutor>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct ExecuteInput<'a> {
    argv: &'a [String],
    stdin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
}

/// Text form of a [`ProcessOutput`] as stored in cassettes.
#[derive(Serialize)]
pub(crate) struct RecordedOutput {
    pub(crate) exit_code: Option<i32>,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl From<&ProcessOutput> for RecordedOutput {
    fn from(output: &ProcessOutput) -> Self {
        Self {
            exit_code: output.exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl ProcessExecutor for RecordingProcessExecutor {
    fn execute(
        &self,
        command: &CommandSpec,
        stdin: &[u8],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, ExecuteError> {
        let result = self.inner.execute(command, stdin, timeout);
        let input = ExecuteInput {
            argv: command.argv(),
            stdin: String::from_utf8_lossy(stdin).into_owned(),
            timeout_ms: timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
        };
        let recorded = result.as_ref().map(RecordedOutput::from);
        record_result(&self.recorder, "process", "execute", &input, &recorded);
        result
    }
}
