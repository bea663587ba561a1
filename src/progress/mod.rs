//! Progress reporting module
//!
//! Live transfer counters for `copy --progress`, drawn on stderr so that
//! stdout stays reserved for command output.

mod reporter;

pub use reporter::*;
