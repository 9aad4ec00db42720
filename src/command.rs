//! Argument vector of an external converter.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a command is built from an empty argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("converter command must name at least a program")]
pub struct EmptyCommand;

/// The program and arguments of an external converter.
///
/// Always holds at least the program. Arguments are passed as discrete
/// argv elements, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CommandSpec {
    argv: Vec<String>,
}

impl CommandSpec {
    /// Builds a command from a program and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![program.into()];
        argv.extend(args.into_iter().map(Into::into));
        Self { argv }
    }

    /// The executable to spawn.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments following the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    /// The full argument vector, program first.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl TryFrom<Vec<String>> for CommandSpec {
    type Error = EmptyCommand;

    fn try_from(argv: Vec<String>) -> Result<Self, Self::Error> {
        if argv.is_empty() {
            return Err(EmptyCommand);
        }
        Ok(Self { argv })
    }
}

impl From<CommandSpec> for Vec<String> {
    fn from(command: CommandSpec) -> Self {
        command.argv
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}
