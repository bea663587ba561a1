//! `remove` command

use crate::error::{GridError, Result};
use crate::fs::FileSystem;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A removed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveOutput {
    /// Removed path
    pub path: String,
    /// Location, or adaptor name
    pub location: String,
}

impl fmt::Display for RemoveOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Removed '{}' from location '{}'",
            self.path, self.location
        )
    }
}

/// Remove `path`. Directories must be empty unless `recursive` is set.
pub fn remove_path(fs: &dyn FileSystem, path: &str, recursive: bool) -> Result<RemoveOutput> {
    let target = Path::new(path);
    if fs.attributes(target)?.is_none() {
        return Err(GridError::source_not_found(fs.adaptor(), path));
    }

    if recursive {
        debug!("Removing {} recursively", path);
        fs.delete_recursive(target)?;
    } else {
        fs.delete(target)?;
    }

    Ok(RemoveOutput {
        path: path.to_string(),
        location: fs.location().unwrap_or(fs.adaptor()).to_string(),
    })
}
