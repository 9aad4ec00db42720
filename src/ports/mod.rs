//! Port traits defining external boundaries.
//!
//! The only boundary is the converter process. Implementations live in
//! `src/adapters/`.

pub mod process;

pub use process::{ExecuteError, ProcessExecutor, ProcessOutput};
