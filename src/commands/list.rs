//! `list` command

use crate::error::{GridError, Result};
use crate::fs::FileSystem;
use serde::Serialize;
use std::fmt;
use std::io::{self, ErrorKind};
use std::path::{Component, Path};

/// Entries of a listed directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListOutput {
    /// All entries
    pub objects: Vec<String>,
    /// Entries that are directories
    pub directories: Vec<String>,
    /// Everything else
    pub files: Vec<String>,
}

impl ListOutput {
    fn push(&mut self, name: String, is_directory: bool) {
        if is_directory {
            self.directories.push(name.clone());
        } else {
            self.files.push(name.clone());
        }
        self.objects.push(name);
    }
}

impl fmt::Display for ListOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.objects.join("\n"))
    }
}

/// List the directory at `path`.
///
/// With `recursive` the whole tree is listed as paths relative to `path`.
/// Hidden entries, and everything below hidden directories, are left out
/// unless `hidden` is set.
pub fn list_objects(
    fs: &dyn FileSystem,
    path: &str,
    recursive: bool,
    hidden: bool,
) -> Result<ListOutput> {
    let root = Path::new(path);
    let mut output = ListOutput::default();

    if recursive {
        check_directory(fs, root)?;
        for entry in fs.walk(root)? {
            if !hidden && has_hidden_component(&entry.relative_path) {
                continue;
            }
            output.push(
                entry.relative_path.display().to_string(),
                entry.attributes.is_directory,
            );
        }
    } else {
        // Fails for files and missing paths
        let mut entries = fs.list(root)?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        for entry in entries {
            if hidden || !entry.is_hidden() {
                output.push(entry.name, entry.attributes.is_directory);
            }
        }
    }

    Ok(output)
}

/// A recursive listing needs an existing directory at its root
fn check_directory(fs: &dyn FileSystem, root: &Path) -> Result<()> {
    let source = match fs.attributes(root)? {
        Some(attrs) if attrs.is_directory => return Ok(()),
        Some(_) => io::Error::new(ErrorKind::InvalidInput, "Not a directory"),
        None => io::Error::new(ErrorKind::NotFound, "No such file or directory"),
    };
    Err(GridError::ListFailed {
        adaptor: fs.adaptor().to_string(),
        path: root.display().to_string(),
        source,
    })
}

fn has_hidden_component(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
