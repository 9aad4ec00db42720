//! Service context selecting how converter processes are run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::adapters::live::LiveProcessExecutor;
use crate::adapters::recording::RecordingProcessExecutor;
use crate::adapters::replaying::ReplayingProcessExecutor;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::{CassetteReplayer, ReplayError};
use crate::ports::process::ProcessExecutor;

/// Bundles the port implementations used for one session.
///
/// Constructors wire up different adapter implementations (live, replaying,
/// recording).
pub struct ServiceContext {
    /// Executor for converter processes.
    pub process: Arc<dyn ProcessExecutor>,
    /// Cassette recorder; written by [`finish`](Self::finish), or on drop if
    /// anything was recorded.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a live context that spawns real converters.
    #[must_use]
    pub fn live() -> Self {
        Self {
            process: Arc::new(LiveProcessExecutor),
            recorder: None,
        }
    }

    /// Creates a recording context that writes a cassette to `path`.
    ///
    /// Uses live processes for actual work.
    #[must_use]
    pub fn recording(path: &Path) -> Self {
        let name = path.file_stem().map_or_else(
            || "markup-command-session".to_owned(),
            |stem| stem.to_string_lossy().into_owned(),
        );
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, name)));
        let process =
            RecordingProcessExecutor::new(Arc::new(LiveProcessExecutor), Arc::clone(&recorder));
        Self {
            process: Arc::new(process),
            recorder: Some(recorder),
        }
    }

    /// Creates a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, ReplayError> {
        let replayer = CassetteReplayer::load(path)?;
        Ok(Self {
            process: Arc::new(ReplayingProcessExecutor::new(replayer)),
            recorder: None,
        })
    }

    /// Writes the cassette of a recording context.
    ///
    /// Returns the cassette path, or `None` for contexts that do not record.
    ///
    /// # Errors
    ///
    /// Returns an error if runners still hold the recording executor or the
    /// cassette cannot be written.
    pub fn finish(mut self) -> Result<Option<PathBuf>, String> {
        let Some(recorder) = self.recorder.take() else {
            return Ok(None);
        };
        // Release the context's own handle on the recording adapter.
        self.process = Arc::new(LiveProcessExecutor);
        let recorder = Arc::try_unwrap(recorder)
            .map_err(|_| "recording executor is still in use".to_owned())?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        recorder
            .finish()
            .map(Some)
            .map_err(|e| format!("failed to write cassette: {e}"))
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        self.process = Arc::new(LiveProcessExecutor);
        let result = match Arc::try_unwrap(recorder) {
            Ok(recorder) => {
                let recorder = recorder
                    .into_inner()
                    .unwrap_or_else(PoisonError::into_inner);
                // An abandoned session must not clobber an existing cassette.
                if recorder.is_empty() {
                    return;
                }
                recorder.finish().map(drop)
            }
            Err(_) => Err(std::io::Error::other("recording executor is still in use")),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to write cassette");
        }
    }
}
