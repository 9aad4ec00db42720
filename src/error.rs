//! Errors surfaced by [`CommandRunner::render`](crate::runner::CommandRunner::render).

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::ports::process::ExecuteError;

/// Why a render call failed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The converter executable could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that was being spawned.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The converter ran but exited unsuccessfully.
    ///
    /// Displays as the converter's trimmed standard error, nothing else.
    #[error("{message}")]
    CommandExecution {
        /// Display name of the converter.
        converter: String,
        /// Exit code, or `None` if the process was killed by a signal.
        exit_code: Option<i32>,
        /// Whitespace-trimmed standard error.
        message: String,
    },
    /// The converter outlived its configured timeout.
    #[error("{converter} did not finish within {}ms", .limit.as_millis())]
    TimedOut {
        /// Display name of the converter.
        converter: String,
        /// The limit that elapsed.
        limit: Duration,
    },
    /// Talking to the converter's pipes failed.
    #[error("i/o error talking to converter: {0}")]
    Io(#[source] io::Error),
    /// A replayed interaction was missing or malformed.
    #[error("replay failed: {0}")]
    Replay(String),
    /// The blocking task running the render did not complete.
    #[error("render task failed: {0}")]
    Task(String),
}

impl RenderError {
    /// Lifts a process-boundary error, naming the converter where useful.
    pub(crate) fn from_execute(converter: &str, err: ExecuteError) -> Self {
        match err {
            ExecuteError::Spawn { program, source } => Self::Spawn { program, source },
            ExecuteError::Io(source) => Self::Io(source),
            ExecuteError::TimedOut { limit } => Self::TimedOut {
                converter: converter.to_owned(),
                limit,
            },
            ExecuteError::Replay(message) => Self::Replay(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_execution_displays_only_the_message() {
        let err = RenderError::CommandExecution {
            converter: "rst".into(),
            exit_code: Some(1),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn timeout_is_attributed_to_the_converter() {
        let err = RenderError::from_execute(
            "asciidoc",
            ExecuteError::TimedOut {
                limit: Duration::from_secs(2),
            },
        );
        assert!(matches!(&err, RenderError::TimedOut { converter, .. } if converter == "asciidoc"));
        assert_eq!(err.to_string(), "asciidoc did not finish within 2000ms");
    }
}
