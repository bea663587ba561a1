//! Copy mode resolution
//!
//! Decides which kind of transfer a [`CopyOperation`] is before any
//! filesystem is opened. Resolution only looks at the stream flags of both
//! endpoints and the recursive flag.

use crate::core::EndpointSpec;
use crate::error::{GridError, Result};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// What to do when the target path already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConflictPolicy {
    /// Fail with TargetExists
    #[default]
    Create,
    /// Overwrite the existing target
    Replace,
    /// Leave the target alone and skip the copy
    Ignore,
}

/// Kind of transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CopyMode {
    /// Single file to single file
    File,
    /// Directory tree, recursively
    Tree,
    /// Standard input to a file
    StreamIn,
    /// A file to standard output
    StreamOut,
}

impl fmt::Display for CopyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::File => "FILE",
            Self::Tree => "TREE",
            Self::StreamIn => "STREAM_IN",
            Self::StreamOut => "STREAM_OUT",
        };
        f.write_str(name)
    }
}

/// A validated request to copy `source` to `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOperation {
    /// Where to read from
    pub source: EndpointSpec,
    /// Where to write to
    pub target: EndpointSpec,
    /// Copy directories recursively
    pub recursive: bool,
    /// Behaviour for existing targets
    pub conflict_policy: ConflictPolicy,
}

/// Resolve the copy mode of `op`.
///
/// Recursive copies involving a stream are rejected first, so an invalid
/// request never opens a (possibly remote) filesystem.
pub fn resolve(op: &CopyOperation) -> Result<CopyMode> {
    if op.recursive && op.source.stream {
        return Err(GridError::invalid_combination(
            op.source.adaptor.name(),
            "Unable to do recursive copy from stdin",
        ));
    }
    if op.recursive && op.target.stream {
        return Err(GridError::invalid_combination(
            op.target.adaptor.name(),
            "Unable to do recursive copy to stdout",
        ));
    }

    let mode = if op.source.stream {
        CopyMode::StreamIn
    } else if op.target.stream {
        CopyMode::StreamOut
    } else if op.recursive {
        CopyMode::Tree
    } else {
        CopyMode::File
    };

    debug!("Resolved copy mode {} for {} -> {}", mode, op.source, op.target);
    Ok(mode)
}
