//! Local disk filesystem
//!
//! Backs the `file` and `local` adaptors with `std::fs`. A location, when
//! given, is a base directory that relative paths resolve against.

use crate::error::{GridError, IoResultExt, Result};
use crate::fs::{DirEntry, FileSystem, ObjectId, PathAttributes, WalkEntry};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Store shared by every adaptor on the local disk
const LOCAL_STORE: &str = "local";

/// Filesystem on the local disk
#[derive(Debug)]
pub struct LocalFileSystem {
    adaptor: &'static str,
    location: Option<String>,
    base: Option<PathBuf>,
    closed: bool,
}

impl LocalFileSystem {
    /// Open the local filesystem for `adaptor`, optionally rooted at `location`
    pub fn open(adaptor: &'static str, location: Option<&str>) -> Result<Self> {
        let base = location.map(PathBuf::from);

        if let Some(base) = &base {
            match std::fs::metadata(base) {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => {
                    return Err(GridError::DirectoryExpected {
                        adaptor: adaptor.to_string(),
                        path: base.display().to_string(),
                    })
                }
                Err(e) => {
                    return Err(GridError::transfer(
                        adaptor,
                        format!("Invalid location '{}'", base.display()),
                        e,
                    ))
                }
            }
        }

        Ok(Self {
            adaptor,
            location: location.map(str::to_string),
            base,
            closed: false,
        })
    }

    /// Resolve `path` against the base directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn attributes_of(path: &Path) -> std::io::Result<PathAttributes> {
        let link = std::fs::symlink_metadata(path)?;
        let is_symbolic_link = link.file_type().is_symlink();
        // Dangling links have no target metadata
        let meta = if is_symbolic_link {
            std::fs::metadata(path).unwrap_or(link)
        } else {
            link
        };

        Ok(PathAttributes {
            is_directory: meta.is_dir(),
            is_regular_file: meta.is_file(),
            is_symbolic_link,
            size: meta.len(),
        })
    }
}

impl FileSystem for LocalFileSystem {
    fn adaptor(&self) -> &str {
        self.adaptor
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn attributes(&self, path: &Path) -> Result<Option<PathAttributes>> {
        let full = self.resolve(path);
        match Self::attributes_of(&full) {
            Ok(attrs) => Ok(Some(attrs)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GridError::transfer(
                self.adaptor,
                format!("Failed to get attributes of '{}'", path.display()),
                e,
            )),
        }
    }

    fn object_id(&self, path: &Path) -> Result<Option<ObjectId>> {
        match std::fs::canonicalize(self.resolve(path)) {
            Ok(canonical) => Ok(Some(ObjectId {
                store: LOCAL_STORE.to_string(),
                path: canonical,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GridError::transfer(
                self.adaptor,
                format!("Failed to resolve '{}'", path.display()),
                e,
            )),
        }
    }

    fn list(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let full = self.resolve(path);
        let list_failed = |source| GridError::ListFailed {
            adaptor: self.adaptor.to_string(),
            path: path.display().to_string(),
            source,
        };

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&full).map_err(list_failed)? {
            let entry = entry.map_err(list_failed)?;
            let attributes = Self::attributes_of(&entry.path()).map_err(list_failed)?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                attributes,
            });
        }
        Ok(entries)
    }

    fn walk(&self, root: &Path) -> Result<Vec<WalkEntry>> {
        let full = self.resolve(root);
        let mut entries = Vec::new();

        let walker = WalkDir::new(&full)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| GridError::ListFailed {
                adaptor: self.adaptor.to_string(),
                path: e.path().unwrap_or(full.as_path()).display().to_string(),
                source: e.into(),
            })?;

            let relative_path = entry
                .path()
                .strip_prefix(&full)
                .unwrap_or(entry.path())
                .to_path_buf();
            let attributes = Self::attributes_of(entry.path()).with_adaptor(self.adaptor, || {
                format!("Failed to get attributes of '{}'", entry.path().display())
            })?;

            entries.push(WalkEntry {
                relative_path,
                attributes,
            });
        }

        Ok(entries)
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        let file = File::open(self.resolve(path)).with_adaptor(self.adaptor, || {
            format!("Failed to open '{}' for reading", path.display())
        })?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn open_write(&self, path: &Path, replace: bool) -> Result<Box<dyn Write + '_>> {
        let full = self.resolve(path);
        let mut options = OpenOptions::new();
        options.write(true);
        if replace {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let file = match options.open(&full) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(GridError::target_exists(
                    self.adaptor,
                    path.display().to_string(),
                ))
            }
            Err(e) => {
                return Err(GridError::transfer(
                    self.adaptor,
                    format!("Failed to open '{}' for writing", path.display()),
                    e,
                ))
            }
        };

        Ok(Box::new(BufWriter::new(file)))
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        match std::fs::create_dir(self.resolve(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(GridError::target_exists(
                self.adaptor,
                path.display().to_string(),
            )),
            Err(e) => Err(GridError::transfer(
                self.adaptor,
                format!("Failed to create directory '{}'", path.display()),
                e,
            )),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(self.resolve(path)).with_adaptor(self.adaptor, || {
            format!("Failed to create directory '{}'", path.display())
        })
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::rename(self.resolve(from), self.resolve(to)).with_adaptor(self.adaptor, || {
            format!("Failed to rename '{}' to '{}'", from.display(), to.display())
        })
    }

    fn delete(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path);
        let attrs = Self::attributes_of(&full)
            .with_adaptor(self.adaptor, || format!("Failed to delete '{}'", path.display()))?;

        let result = if attrs.is_directory && !attrs.is_symbolic_link {
            std::fs::remove_dir(&full)
        } else {
            std::fs::remove_file(&full)
        };
        result.with_adaptor(self.adaptor, || format!("Failed to delete '{}'", path.display()))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(GridError::unsupported(self.adaptor, "close of a closed filesystem"));
        }
        self.closed = true;
        Ok(())
    }
}
