//! Configuration module for GridFile
//!
//! Provides the command-line arguments, the typed settings built from
//! them, and the credentials used to open filesystems.

mod credentials;
mod settings;

pub use credentials::*;
pub use settings::*;
