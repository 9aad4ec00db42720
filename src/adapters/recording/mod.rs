//! Recording adapters that capture interactions to cassettes.

pub mod process;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;
use crate::ports::process::ExecuteError;

pub use process::RecordingProcessExecutor;

/// Record a `Result<T, ExecuteError>` interaction.
///
/// Mirror of `replaying::process` - serializes the result for recording.
///
/// Convention:
/// - `Ok(v)` is serialized as `{"ok": v}`
/// - `Err(e)` is serialized as `{"err": {"kind": ..., "message": ...}}`
pub(crate) fn record_result<T, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, &ExecuteError>,
) where
    T: Serialize,
    I: Serialize,
{
    let input_json = serde_json::to_value(input).unwrap_or(serde_json::Value::Null);

    let output_json = match result {
        Ok(v) => {
            let inner = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
            serde_json::json!({ "ok": inner })
        }
        Err(e) => serde_json::json!({ "err": error_json(e) }),
    };

    // A poisoned lock only means another recording panicked mid-push.
    let mut guard = recorder
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    guard.record(port, method, input_json, output_json);
}

fn error_json(err: &ExecuteError) -> serde_json::Value {
    match err {
        ExecuteError::Spawn { program, source } => serde_json::json!({
            "kind": "spawn",
            "program": program,
            "message": source.to_string(),
        }),
        ExecuteError::Io(source) => serde_json::json!({
            "kind": "io",
            "message": source.to_string(),
        }),
        ExecuteError::TimedOut { limit } => serde_json::json!({
            "kind": "timed_out",
            "limit_ms": u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
        ExecuteError::Replay(message) => serde_json::json!({
            "kind": "replay",
            "message": message,
        }),
    }
}
