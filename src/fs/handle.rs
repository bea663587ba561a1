//! Scoped filesystem handles
//!
//! A [`FileSystemHandle`] owns an opened filesystem and releases it exactly
//! once: explicitly through [`FileSystemHandle::close`], or on drop when the
//! owner leaves early (error, skip, or unwind).

use crate::error::Result;
use crate::fs::FileSystem;
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// Owned, auto-closing filesystem
pub struct FileSystemHandle {
    fs: Box<dyn FileSystem>,
    released: bool,
}

impl FileSystemHandle {
    /// Take ownership of an opened filesystem
    pub fn new(fs: Box<dyn FileSystem>) -> Self {
        debug!(
            "Opened {} filesystem at {}",
            fs.adaptor(),
            fs.location().unwrap_or("<default>")
        );
        Self {
            fs,
            released: false,
        }
    }

    /// Release the filesystem and report close failures
    pub fn close(mut self) -> Result<()> {
        self.released = true;
        debug!("Closing {} filesystem", self.fs.adaptor());
        self.fs.close()
    }
}

impl Deref for FileSystemHandle {
    type Target = dyn FileSystem;

    fn deref(&self) -> &Self::Target {
        self.fs.as_ref()
    }
}

impl DerefMut for FileSystemHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.fs.as_mut()
    }
}

impl Drop for FileSystemHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!("Releasing {} filesystem", self.fs.adaptor());
        if let Err(e) = self.fs.close() {
            warn!("Failed to close filesystem: {}", e);
        }
    }
}

impl std::fmt::Debug for FileSystemHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemHandle")
            .field("adaptor", &self.fs.adaptor())
            .field("location", &self.fs.location())
            .field("released", &self.released)
            .finish()
    }
}
