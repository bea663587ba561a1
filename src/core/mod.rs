//! Copy orchestration
//!
//! Endpoint parsing, copy mode resolution, the transfer engine and the
//! report of a finished copy.

mod endpoint;
mod engine;
mod mode;
mod report;

pub use endpoint::*;
pub use engine::*;
pub use mode::*;
pub use report::*;
