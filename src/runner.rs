//! Rendering a document through one external converter.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, debug_span, warn};

use crate::adapters::live::process::LiveProcessExecutor;
use crate::command::CommandSpec;
use crate::document::{Content, RenderOptions};
use crate::error::RenderError;
use crate::ports::process::ProcessExecutor;
use crate::post_process::PostProcess;

/// Renders documents by piping them through an external converter.
///
/// Every [`render`](Self::render) spawns exactly one process and keeps no
/// state afterwards, so a runner can be shared freely between threads.
#[derive(Clone)]
pub struct CommandRunner {
    name: String,
    command: CommandSpec,
    post_process: PostProcess,
    timeout: Option<Duration>,
    executor: Arc<dyn ProcessExecutor>,
}

impl CommandRunner {
    /// Creates a runner using live processes, no post-processing and no timeout.
    pub fn new(name: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            name: name.into(),
            command,
            post_process: PostProcess::None,
            timeout: None,
            executor: Arc::new(LiveProcessExecutor),
        }
    }

    /// Sets the step applied to the sanitized output.
    #[must_use]
    pub fn with_post_process(mut self, post_process: PostProcess) -> Self {
        self.post_process = post_process;
        self
    }

    /// Kills the converter if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Swaps the process executor (recording, replaying, ...).
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn ProcessExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Display name of the converter.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The command this runner spawns.
    #[must_use]
    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// The configured timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Renders `content` through the converter.
    ///
    /// `filename` is only used for diagnostics and `options` are reserved.
    /// Carriage returns are stripped from the output. When the converter
    /// succeeds without printing anything, `content` itself is returned.
    /// The result always carries the encoding of `content`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Spawn`] when the converter cannot be started,
    /// [`RenderError::CommandExecution`] with its trimmed stderr when it exits
    /// unsuccessfully, and [`RenderError::TimedOut`] when a timeout elapses.
    pub fn render(
        &self,
        filename: &str,
        content: &Content,
        options: &RenderOptions,
    ) -> Result<Content, RenderError> {
        let span = debug_span!("render", converter = %self.name, filename);
        let _enter = span.enter();
        if !options.is_empty() {
            debug!(keys = ?options.keys().collect::<Vec<_>>(), "ignoring render options");
        }

        let output = self
            .executor
            .execute(&self.command, content.as_bytes(), self.timeout)
            .map_err(|err| RenderError::from_execute(&self.name, err))?;

        if !output.success() {
            let message = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            debug!(exit_code = ?output.exit_code, %message, "converter failed");
            return Err(RenderError::CommandExecution {
                converter: self.name.clone(),
                exit_code: output.exit_code,
                message,
            });
        }

        let sanitized = sanitize(output.stdout);
        let rendered = if sanitized.is_empty() {
            warn!("converter produced no output; returning the source unchanged");
            content.clone()
        } else {
            Content::new(sanitized, content.encoding().clone())
        };

        let processed = self.post_process.apply(rendered, content);
        Ok(Content::new(processed.into_bytes(), content.encoding().clone()))
    }

    /// Runs [`render`](Self::render) on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`render`](Self::render), plus [`RenderError::Task`] if the
    /// blocking task panics or is cancelled.
    pub async fn render_async(
        &self,
        filename: String,
        content: Content,
        options: RenderOptions,
    ) -> Result<Content, RenderError> {
        let runner = self.clone();
        tokio::task::spawn_blocking(move || runner.render(&filename, &content, &options))
            .await
            .map_err(|err| RenderError::Task(err.to_string()))?
    }
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("post_process", &self.post_process)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn sanitize(mut output: Vec<u8>) -> Vec<u8> {
    output.retain(|&byte| byte != b'\r');
    output
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::document::Encoding;
    use crate::ports::process::{ExecuteError, ProcessOutput};

    /// Executor returning a canned output and remembering what it was fed.
    struct Canned {
        output: ProcessOutput,
        seen: Mutex<Vec<Vec<u8>>>,
    }

    impl Canned {
        fn new(exit_code: i32, stdout: &[u8], stderr: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                output: ProcessOutput {
                    exit_code: Some(exit_code),
                    stdout: stdout.to_vec(),
                    stderr: stderr.to_vec(),
                },
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl ProcessExecutor for Canned {
        fn execute(
            &self,
            _command: &CommandSpec,
            stdin: &[u8],
            _timeout: Option<Duration>,
        ) -> Result<ProcessOutput, ExecuteError> {
            self.seen.lock().unwrap().push(stdin.to_vec());
            Ok(self.output.clone())
        }
    }

    fn runner(executor: Arc<Canned>) -> CommandRunner {
        CommandRunner::new("test", CommandSpec::new("converter", ["--html"]))
            .with_executor(executor)
    }

    #[test]
    fn strips_carriage_returns_and_keeps_source_encoding() {
        let executor = Canned::new(0, b"<p>a</p>\r\n<p>b</p>\r\n", b"");
        let source = Content::new("a\r\n\r\nb", Encoding::Named("iso-8859-1".into()));

        let out = runner(Arc::clone(&executor))
            .render("doc.rst", &source, &RenderOptions::new())
            .unwrap();

        assert_eq!(out.as_bytes(), b"<p>a</p>\n<p>b</p>\n");
        assert_eq!(out.encoding(), source.encoding());
        assert_eq!(executor.seen.lock().unwrap()[0], source.as_bytes());
    }

    #[test]
    fn empty_output_falls_back_to_source() {
        let source = Content::from("plain\r\ntext");
        let out = runner(Canned::new(0, b"", b""))
            .render("x", &source, &RenderOptions::new())
            .unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn output_of_only_carriage_returns_counts_as_empty() {
        let source = Content::from("src");
        let out = runner(Canned::new(0, b"\r\r", b""))
            .render("x", &source, &RenderOptions::new())
            .unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn failure_carries_trimmed_stderr_and_drops_stdout() {
        let err = runner(Canned::new(3, b"partial", b"\n  boom \n"))
            .render("x", &Content::from("src"), &RenderOptions::new())
            .unwrap_err();

        match err {
            RenderError::CommandExecution {
                converter,
                exit_code,
                message,
            } => {
                assert_eq!(converter, "test");
                assert_eq!(exit_code, Some(3));
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn post_process_output_is_restamped_with_source_encoding() {
        let source = Content::new("src", Encoding::Ascii);
        let out = runner(Canned::new(0, b"out", b""))
            .with_post_process(PostProcess::rendered(|_| Content::new("x", Encoding::Binary)))
            .render("x", &source, &RenderOptions::new())
            .unwrap();
        assert_eq!(out, Content::new("x", Encoding::Ascii));
    }

    #[test]
    fn two_argument_post_process_gets_sanitized_output_and_source() {
        let source = Content::from("src");
        let out = runner(Canned::new(0, b"out\r\n", b""))
            .with_post_process(PostProcess::with_source(|rendered, source| {
                let (rendered, source) = (rendered.to_string_lossy(), source.to_string_lossy());
                Content::from(format!("{rendered}+{source}"))
            }))
            .render("x", &source, &RenderOptions::new())
            .unwrap();
        assert_eq!(out.text().unwrap(), "out\n+src");
    }
}
