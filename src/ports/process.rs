//! Process executor port for running converter commands.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::command::CommandSpec;

/// The captured result of one converter process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Everything the process wrote to standard output.
    pub stdout: Vec<u8>,
    /// Everything the process wrote to standard error.
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Returns `true` if the process exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Failures at the process boundary, before an exit status is available.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The program could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that was being spawned.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// A pipe to or from the child failed.
    #[error("i/o error talking to converter: {0}")]
    Io(#[from] io::Error),
    /// The child outlived its deadline and was killed.
    #[error("converter did not finish within {}ms", .limit.as_millis())]
    TimedOut {
        /// The limit that elapsed.
        limit: Duration,
    },
    /// A replayed interaction was missing or malformed.
    #[error("replay failed: {0}")]
    Replay(String),
}

/// Runs converter commands.
///
/// Abstracting process execution allows deterministic replay by recording
/// and replaying converter outputs.
pub trait ProcessExecutor: Send + Sync {
    /// Runs `command`, feeding `stdin` as its whole standard input, and waits
    /// for it to exit with both output streams drained.
    ///
    /// A `timeout` of `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned, its pipes fail, or
    /// the timeout elapses. A non-zero exit is not an error at this level.
    fn execute(
        &self,
        command: &CommandSpec,
        stdin: &[u8],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, ExecuteError>;
}
