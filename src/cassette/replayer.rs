//! Replays recorded interactions from a cassette.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use super::format::{Cassette, Interaction};

/// Why a cassette could not be loaded or served.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The cassette file could not be read.
    #[error("failed to read cassette file {path}: {source}")]
    Read {
        /// Cassette path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The cassette file is not valid cassette YAML.
    #[error("failed to parse cassette file {path}: {source}")]
    Parse {
        /// Cassette path.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },
    /// Nothing was recorded for the requested port/method.
    #[error(
        "cassette exhausted: no interactions recorded for port={port:?} method={method:?}; \
         available: [{available}]"
    )]
    Unknown {
        /// Requested port.
        port: String,
        /// Requested method.
        method: String,
        /// Recorded `port::method` pairs.
        available: String,
    },
    /// Every recorded interaction for the port/method was already served.
    #[error(
        "cassette exhausted: all {count} interactions for port={port:?} method={method:?} \
         have been consumed"
    )]
    Exhausted {
        /// Requested port.
        port: String,
        /// Requested method.
        method: String,
        /// How many were recorded.
        count: usize,
    },
}

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Replays interactions from a loaded cassette, serving them sequentially
/// per port/method pair.
#[derive(Debug)]
pub struct CassetteReplayer {
    /// Per port+method queue of interactions (in order).
    queues: HashMap<PortMethodKey, Vec<Interaction>>,
    /// Per port+method cursor tracking position.
    cursors: HashMap<PortMethodKey, usize>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push(interaction.clone());
        }
        let cursors = queues.keys().map(|k| (k.clone(), 0)).collect();
        Self { queues, cursors }
    }

    /// Read a cassette file and create a replayer for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ReplayError::Read {
                path: display.clone(),
                source,
            })?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|source| ReplayError::Parse {
                path: display,
                source,
            })?;
        Ok(Self::new(&cassette))
    }

    /// Return the next interaction for the given port and method.
    ///
    /// # Errors
    ///
    /// Returns an error naming what was requested when the cassette has no
    /// (more) interactions for the port/method combination.
    pub fn next_interaction(
        &mut self,
        port: &str,
        method: &str,
    ) -> Result<&Interaction, ReplayError> {
        let key = PortMethodKey {
            port: port.to_string(),
            method: method.to_string(),
        };

        let Some(queue) = self.queues.get(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            available.sort();
            return Err(ReplayError::Unknown {
                port: port.to_owned(),
                method: method.to_owned(),
                available: available.join(", "),
            });
        };

        let cursor = self.cursors.entry(key).or_insert(0);
        let Some(interaction) = queue.get(*cursor) else {
            return Err(ReplayError::Exhausted {
                port: port.to_owned(),
                method: method.to_owned(),
                count: queue.len(),
            });
        };
        *cursor += 1;
        Ok(interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            tool_version: "0.1.0".into(),
            interactions,
        }
    }

    fn execute(seq: u64, stdout: &str) -> Interaction {
        Interaction {
            seq,
            port: "process".into(),
            method: "execute".into(),
            input: json!({}),
            output: json!({"ok": {"exit_code": 0, "stdout": stdout, "stderr": ""}}),
        }
    }

    #[test]
    fn serves_interactions_in_order() {
        let cassette = make_cassette(vec![execute(0, "one"), execute(1, "two")]);
        let mut replayer = CassetteReplayer::new(&cassette);

        assert_eq!(replayer.next_interaction("process", "execute").unwrap().seq, 0);
        assert_eq!(replayer.next_interaction("process", "execute").unwrap().seq, 1);
    }

    #[test]
    fn exhausted_replayer_reports_count() {
        let cassette = make_cassette(vec![execute(0, "only")]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_interaction("process", "execute").unwrap();

        let err = replayer.next_interaction("process", "execute").unwrap_err();
        assert!(matches!(err, ReplayError::Exhausted { count: 1, .. }));
        assert!(err.to_string().contains("cassette exhausted"));
    }

    #[test]
    fn unknown_port_lists_available_pairs() {
        let cassette = make_cassette(vec![execute(0, "x")]);
        let mut replayer = CassetteReplayer::new(&cassette);

        let err = replayer.next_interaction("clock", "now").unwrap_err();
        assert!(err.to_string().contains("process::execute"));
    }

    #[test]
    fn load_reports_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.cassette.yaml");
        std::fs::write(&path, "interactions: [").unwrap();

        assert!(matches!(CassetteReplayer::load(&path), Err(ReplayError::Parse { .. })));
    }
}
