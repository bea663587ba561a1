//! Copy report
//!
//! Outcome of a copy command, ready to be rendered as text or JSON.

use crate::core::{CopyMode, CopyOperation, EndpointSpec, TransferResult};
use serde::Serialize;
use std::fmt;

/// Summary of a finished copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    /// Where the data came from
    pub source: EndpointSpec,
    /// Where the data went
    pub target: EndpointSpec,
    /// Executed mode
    pub mode: CopyMode,
    /// Bytes written
    pub bytes_copied: u64,
    /// Files copied and directories created
    pub entries_copied: u64,
    /// Entries that were left alone
    pub entries_skipped: u64,
}

impl CopyReport {
    /// Build the report of `op` from its transfer result
    pub fn build(op: &CopyOperation, result: &TransferResult) -> Self {
        Self {
            source: op.source.clone(),
            target: op.target.clone(),
            mode: result.mode,
            bytes_copied: result.bytes_copied,
            entries_copied: result.entries_copied,
            entries_skipped: result.entries_skipped,
        }
    }

    /// Check if the command output is the copied data itself
    pub fn is_stream_out(&self) -> bool {
        self.mode == CopyMode::StreamOut
    }
}

impl fmt::Display for CopyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Copied '{}' from location '{}' to '{}' to location '{}'",
            self.source.path,
            self.source.location_label(),
            self.target.path,
            self.target.location_label()
        )
    }
}
