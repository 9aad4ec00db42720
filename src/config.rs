//! Converter configuration file.
//!
//! ```yaml
//! converters:
//!   - name: rst
//!     command: ["rst2html.py", "--no-raw"]
//!     timeout_secs: 30
//!     post_process: extract_body
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::CommandSpec;
use crate::ports::process::ProcessExecutor;
use crate::post_process::PostProcessKind;
use crate::runner::CommandRunner;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "MARKUP_COMMAND_CONFIG";

/// File looked up in the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "markup-command.yaml";

/// Problems loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration YAML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// Two converters share a name.
    #[error("converter `{0}` is defined more than once")]
    DuplicateName(String),
    /// A converter has a blank name.
    #[error("converter names must not be empty")]
    EmptyName,
}

/// One named converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterConfig {
    /// Name used to select the converter.
    pub name: String,
    /// Program and arguments.
    pub command: CommandSpec,
    /// Kill the converter after this many seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Built-in post-processing step.
    #[serde(default)]
    pub post_process: PostProcessKind,
}

impl ConverterConfig {
    /// Builds a runner for this converter on top of `executor`.
    #[must_use]
    pub fn runner(&self, executor: Arc<dyn ProcessExecutor>) -> CommandRunner {
        let runner = CommandRunner::new(&self.name, self.command.clone())
            .with_post_process(self.post_process.into())
            .with_executor(executor);
        match self.timeout_secs {
            Some(secs) => runner.with_timeout(Duration::from_secs(secs)),
            None => runner,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Configured converters, in file order.
    #[serde(default)]
    pub converters: Vec<ConverterConfig>,
}

impl Config {
    /// Parses and validates configuration YAML.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed YAML, empty commands, blank or
    /// duplicate converter names.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?;
        Self::from_yaml_str(&yaml)
    }

    /// Looks up a converter by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ConverterConfig> {
        self.converters.iter().find(|c| c.name == name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for converter in &self.converters {
            if converter.name.trim().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !seen.insert(converter.name.as_str()) {
                return Err(ConfigError::DuplicateName(converter.name.clone()));
            }
        }
        Ok(())
    }
}

/// Picks the configuration file: the explicit path, else [`CONFIG_ENV`],
/// else [`DEFAULT_CONFIG_FILE`].
#[must_use]
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_owned();
    }
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
converters:
  - name: rst
    command: ["rst2html.py", "--no-raw"]
    timeout_secs: 30
    post_process: extract_body
  - name: asciidoc
    command: [asciidoctor, -s, -o, "-", "-"]
"#;

    #[test]
    fn parses_converters() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.converters.len(), 2);

        let rst = config.find("rst").unwrap();
        assert_eq!(rst.command.program(), "rst2html.py");
        assert_eq!(rst.timeout_secs, Some(30));
        assert_eq!(rst.post_process, PostProcessKind::ExtractBody);

        let asciidoc = config.find("asciidoc").unwrap();
        assert_eq!(asciidoc.post_process, PostProcessKind::None);
        assert!(config.find("textile").is_none());
    }

    #[test]
    fn runner_carries_timeout() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        let executor: Arc<dyn ProcessExecutor> =
            Arc::new(crate::adapters::live::LiveProcessExecutor);

        let rst = config.find("rst").unwrap().runner(Arc::clone(&executor));
        assert_eq!(rst.name(), "rst");
        assert_eq!(rst.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.find("asciidoc").unwrap().runner(executor).timeout(), None);
    }

    #[test]
    fn rejects_duplicate_names() {
        let yaml = "converters:\n  - {name: a, command: [x]}\n  - {name: a, command: [y]}\n";
        let result = Config::from_yaml_str(yaml);
        assert!(matches!(result, Err(ConfigError::DuplicateName(n)) if n == "a"));
    }

    #[test]
    fn rejects_empty_command() {
        let yaml = "converters:\n  - {name: a, command: []}\n";
        assert!(matches!(Config::from_yaml_str(yaml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_unknown_post_process() {
        let yaml = "converters:\n  - {name: a, command: [x], post_process: shout}\n";
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn explicit_path_wins() {
        assert_eq!(
            resolve_path(Some(Path::new("/etc/conv.yaml"))),
            PathBuf::from("/etc/conv.yaml")
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("none.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
