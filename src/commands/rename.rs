//! `rename` command

use crate::error::{GridError, Result};
use crate::fs::FileSystem;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A renamed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutput {
    /// Old path
    pub source: String,
    /// New path
    pub target: String,
    /// Location, or adaptor name
    pub location: String,
}

impl fmt::Display for RenameOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Renamed '{}' to '{}' at location '{}'",
            self.source, self.target, self.location
        )
    }
}

/// Rename `source` to `target` within one filesystem
pub fn rename_path(fs: &dyn FileSystem, source: &str, target: &str) -> Result<RenameOutput> {
    if fs.attributes(Path::new(source))?.is_none() {
        return Err(GridError::source_not_found(fs.adaptor(), source));
    }
    if fs.attributes(Path::new(target))?.is_some() {
        return Err(GridError::target_exists(fs.adaptor(), target));
    }

    fs.rename(Path::new(source), Path::new(target))?;

    Ok(RenameOutput {
        source: source.to_string(),
        target: target.to_string(),
        location: fs.location().unwrap_or(fs.adaptor()).to_string(),
    })
}
