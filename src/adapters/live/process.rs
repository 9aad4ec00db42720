//! Live process executor using `std::process::Command`.

use std::io::{self, ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::command::CommandSpec;
use crate::ports::process::{ExecuteError, ProcessExecutor, ProcessOutput};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Live executor that spawns real child processes.
///
/// Standard input, output and error are pumped on separate threads so a
/// converter that writes while it is still reading cannot deadlock. With a
/// timeout, the pumps are abandoned at the deadline even if a process the
/// converter left behind still holds its pipes open.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveProcessExecutor;

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    limit: Duration,
}

impl ProcessExecutor for LiveProcessExecutor {
    fn execute(
        &self,
        command: &CommandSpec,
        stdin: &[u8],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, ExecuteError> {
        let started_at = Instant::now();
        let deadline = timeout.map(|limit| Deadline {
            at: started_at + limit,
            limit,
        });
        let mut child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecuteError::Spawn {
                program: command.program().to_owned(),
                source,
            })?;
        debug!(
            program = command.program(),
            pid = child.id(),
            stdin_bytes = stdin.len(),
            "spawned converter"
        );

        let mut child_stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let child_stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let child_stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let input = stdin.to_vec();
        let written = pump(move || {
            // Dropping the handle at the end of the closure closes the pipe.
            match child_stdin.write_all(&input) {
                Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        });
        let stdout = pump(move || drain(child_stdout));
        let stderr = pump(move || drain(child_stderr));

        let status = wait(&mut child, deadline)?;
        collect(&written, deadline)?;
        let output = ProcessOutput {
            exit_code: status.code(),
            stdout: collect(&stdout, deadline)?,
            stderr: collect(&stderr, deadline)?,
        };
        debug!(
            program = command.program(),
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            elapsed_ms = millis(started_at.elapsed()),
            "converter exited"
        );
        Ok(output)
    }
}

fn wait(child: &mut Child, deadline: Option<Deadline>) -> Result<ExitStatus, ExecuteError> {
    let Some(deadline) = deadline else {
        return Ok(child.wait()?);
    };
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(err) => {
                let _ = child.kill();
                return Err(err.into());
            }
        }
        if Instant::now() >= deadline.at {
            warn!(
                pid = child.id(),
                limit_ms = millis(deadline.limit),
                "killing converter after timeout"
            );
            // The child may exit between try_wait and kill.
            let _ = child.kill();
            child.wait()?;
            return Err(ExecuteError::TimedOut {
                limit: deadline.limit,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Runs `task` on its own thread, handing back its result through a channel.
fn pump<T, F>(task: F) -> Receiver<io::Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver is gone when the run already timed out.
        let _ = tx.send(task());
    });
    rx
}

/// Waits for a pump, giving up at the deadline.
fn collect<T>(
    pump: &Receiver<io::Result<T>>,
    deadline: Option<Deadline>,
) -> Result<T, ExecuteError> {
    let received = match deadline {
        None => pump.recv().map_err(|_| pump_panicked()),
        Some(deadline) => pump
            .recv_timeout(deadline.at.saturating_duration_since(Instant::now()))
            .map_err(|err| match err {
                RecvTimeoutError::Timeout => {
                    warn!(
                        limit_ms = millis(deadline.limit),
                        "converter pipes still open after timeout; abandoning them"
                    );
                    ExecuteError::TimedOut {
                        limit: deadline.limit,
                    }
                }
                RecvTimeoutError::Disconnected => pump_panicked(),
            }),
    }?;
    Ok(received?)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn drain(mut pipe: impl Read) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(buf)
}

fn pump_panicked() -> ExecuteError {
    ExecuteError::Io(io::Error::other("pipe thread panicked"))
}

fn missing_pipe(name: &str) -> ExecuteError {
    ExecuteError::Io(io::Error::other(format!("child {name} was not captured")))
}
