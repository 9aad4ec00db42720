//! Adapter implementations of the port traits.
//!
//! - `live`: real child processes.
//! - `recording`: wraps another adapter and writes a cassette.
//! - `replaying`: serves a cassette back without spawning anything.

pub mod live;
pub mod recording;
pub mod replaying;
