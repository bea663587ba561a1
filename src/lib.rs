//! # GridFile - One Syntax for Local, Remote and Streamed Files
//!
//! GridFile copies, lists, renames and removes files across heterogeneous
//! filesystems (the local disk, SFTP servers, standard input/output) with a
//! single argument syntax.
//!
//! ## Features
//!
//! - **Uniform Endpoints**: `[adaptor:][location:]path`, or `-` for a stream
//! - **Copy Modes**: single file, recursive tree, stdin to file, file to stdout
//! - **Conflict Policies**: fail, replace or skip existing targets
//! - **Cross-Adaptor Copies**: local disk to SFTP and back
//! - **Scoped Handles**: every opened filesystem is released on every exit path
//! - **Text or JSON Output**: every command result renders both ways
//!
//! ## Quick Start
//!
//! ```no_run
//! use gridfile::config::{AdaptorProperties, Credential};
//! use gridfile::core::{
//!     ConflictPolicy, Connector, CopyOperation, CopyReport, EndpointSpec, TransferEngine,
//! };
//! use gridfile::fs::{AdaptorKind, AdaptorRegistry};
//!
//! let op = CopyOperation {
//!     source: EndpointSpec::parse("/data/input.txt", AdaptorKind::File, None),
//!     target: EndpointSpec::parse("sftp:user@host:/srv/input.txt", AdaptorKind::File, None),
//!     recursive: false,
//!     conflict_policy: ConflictPolicy::Replace,
//! };
//!
//! let connector = Connector::new(
//!     AdaptorRegistry::builtin(),
//!     AdaptorKind::File,
//!     Credential::default(),
//!     Credential::default(),
//!     AdaptorProperties::default(),
//! );
//! let mut engine = TransferEngine::new(
//!     &connector,
//!     Box::new(std::io::stdin()),
//!     Box::new(std::io::stdout()),
//! );
//!
//! let result = engine.run(&op).unwrap();
//! println!("{}", CopyReport::build(&op, &result));
//! ```
//!
//! ## Resolving a Copy Mode
//!
//! ```
//! use gridfile::core::{resolve, ConflictPolicy, CopyMode, CopyOperation, EndpointSpec};
//! use gridfile::fs::AdaptorKind;
//!
//! let op = CopyOperation {
//!     source: EndpointSpec::parse("-", AdaptorKind::File, None),
//!     target: EndpointSpec::parse("notes.txt", AdaptorKind::File, None),
//!     recursive: false,
//!     conflict_policy: ConflictPolicy::default(),
//! };
//! assert_eq!(resolve(&op).unwrap(), CopyMode::StreamIn);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod network;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use crate::config::{CliArgs, CopySettings, Credential};
pub use crate::core::{
    CopyMode, CopyOperation, CopyReport, EndpointSpec, TransferEngine, TransferResult,
};
pub use crate::error::{GridError, Result};
pub use crate::progress::ProgressReporter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use gridfile::prelude::*;
    //! ```

    pub use crate::config::{AdaptorProperties, CopySettings, Credential};
    pub use crate::core::{
        resolve, ConflictPolicy, Connector, CopyMode, CopyOperation, CopyReport, EndpointSpec,
        FileSystemOpener, TransferEngine, TransferResult,
    };
    pub use crate::error::{GridError, Result};
    pub use crate::fs::{AdaptorKind, AdaptorRegistry, FileSystem, FileSystemHandle};
    pub use crate::output::OutputFormat;
    pub use crate::progress::ProgressReporter;
}
