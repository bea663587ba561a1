//! `mkdir` command

use crate::error::Result;
use crate::fs::FileSystem;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A created directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MkdirOutput {
    /// Created path
    pub path: String,
    /// Location, or adaptor name
    pub location: String,
}

impl fmt::Display for MkdirOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Created directory '{}' at location '{}'",
            self.path, self.location
        )
    }
}

/// Create the directory `path`, and its missing parents with `parents`
pub fn make_directory(fs: &dyn FileSystem, path: &str, parents: bool) -> Result<MkdirOutput> {
    if parents {
        fs.create_dir_all(Path::new(path))?;
    } else {
        fs.create_dir(Path::new(path))?;
    }

    Ok(MkdirOutput {
        path: path.to_string(),
        location: fs.location().unwrap_or(fs.adaptor()).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridError;
    use crate::fs::LocalFileSystem;
    use tempfile::TempDir;

    #[test]
    fn test_mkdir() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::open("file", None).unwrap();
        let path = dir.path().join("new").display().to_string();

        let output = make_directory(&fs, &path, false).unwrap();
        assert!(dir.path().join("new").is_dir());
        assert_eq!(
            output.to_string(),
            format!("Created directory '{}' at location 'file'", path)
        );

        let err = make_directory(&fs, &path, false).unwrap_err();
        assert!(matches!(err, GridError::TargetExists { .. }));
    }

    #[test]
    fn test_mkdir_parents() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::open("local", dir.path().to_str()).unwrap();

        assert!(make_directory(&fs, "a/b/c", false).is_err());
        let output = make_directory(&fs, "a/b/c", true).unwrap();
        assert!(dir.path().join("a/b/c").is_dir());
        assert_eq!(Some(output.location.as_str()), dir.path().to_str());

        // Existing directories are fine with parents
        assert!(make_directory(&fs, "a/b/c", true).is_ok());
    }
}
