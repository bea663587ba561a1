//! Filesystem abstraction
//!
//! Every adaptor exposes the same blocking operations so the copy engine
//! and the file commands never depend on a particular backend.

use crate::error::Result;
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Attributes of an existing path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PathAttributes {
    /// Is a directory
    pub is_directory: bool,
    /// Is a regular file
    pub is_regular_file: bool,
    /// Is a symbolic link (attributes describe the link target)
    pub is_symbolic_link: bool,
    /// Size in bytes
    pub size: u64,
}

/// Identity of an existing object.
///
/// Two paths name the same object when their ids are equal, whatever
/// base directory, link or relative form was used to reach them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectId {
    /// Store holding the object (local disk or remote host)
    pub store: String,
    /// Canonical path within the store
    pub path: PathBuf,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name within the listed directory
    pub name: String,
    /// Entry attributes
    pub attributes: PathAttributes,
}

impl DirEntry {
    /// Hidden by Unix convention
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// One entry of a recursive walk, relative to the walk root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Path relative to the walk root
    pub relative_path: PathBuf,
    /// Entry attributes
    pub attributes: PathAttributes,
}

/// Blocking access to one opened filesystem
pub trait FileSystem {
    /// Adaptor name, used to prefix diagnostics
    fn adaptor(&self) -> &str;

    /// Location this filesystem was opened at, if any
    fn location(&self) -> Option<&str>;

    /// Attributes of `path`, or `None` if it does not exist
    fn attributes(&self, path: &Path) -> Result<Option<PathAttributes>>;

    /// Identity of the object at `path`, or `None` if it does not exist
    fn object_id(&self, path: &Path) -> Result<Option<ObjectId>>;

    /// Entries of the directory at `path`, excluding `.` and `..`
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// All entries below `root`, depth-first, parents before children.
    ///
    /// Entries of one directory are sorted by name. Symbolic links to
    /// directories are reported but not descended into.
    fn walk(&self, root: &Path) -> Result<Vec<WalkEntry>> {
        let mut entries = Vec::new();
        walk_into(self, root, Path::new(""), &mut entries)?;
        Ok(entries)
    }

    /// Open `path` for reading
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + '_>>;

    /// Open `path` for writing.
    ///
    /// Without `replace` the file must not exist yet; with `replace` an
    /// existing file is truncated.
    fn open_write(&self, path: &Path, replace: bool) -> Result<Box<dyn Write + '_>>;

    /// Create a single directory
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            if self.attributes(&current)?.is_none() {
                self.create_dir(&current)?;
            }
        }
        Ok(())
    }

    /// Rename `from` to `to` within this filesystem
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a file or an empty directory
    fn delete(&self, path: &Path) -> Result<()>;

    /// Delete a path and everything below it
    fn delete_recursive(&self, path: &Path) -> Result<()> {
        let is_dir = self
            .attributes(path)?
            .map(|attrs| attrs.is_directory && !attrs.is_symbolic_link)
            .unwrap_or(false);
        if is_dir {
            // Children before parents
            for entry in self.walk(path)?.iter().rev() {
                self.delete(&path.join(&entry.relative_path))?;
            }
        }
        self.delete(path)
    }

    /// Release the connection or handle. Further calls are not allowed.
    fn close(&mut self) -> Result<()>;
}

fn walk_into<F: FileSystem + ?Sized>(
    fs: &F,
    root: &Path,
    relative: &Path,
    out: &mut Vec<WalkEntry>,
) -> Result<()> {
    let mut entries = fs.list(&root.join(relative))?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    for entry in entries {
        let relative_path = relative.join(&entry.name);
        let descend = entry.attributes.is_directory && !entry.attributes.is_symbolic_link;
        out.push(WalkEntry {
            relative_path: relative_path.clone(),
            attributes: entry.attributes,
        });
        if descend {
            walk_into(fs, root, &relative_path, out)?;
        }
    }

    Ok(())
}
