//! Command output
//!
//! Every command produces a value that is both `Serialize` and `Display`;
//! `--json` picks the former, plain text the latter.

mod render;

pub use render::*;
