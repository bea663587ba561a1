//! Transfer engine
//!
//! Executes a resolved [`CopyMode`]: opens the endpoint filesystems, moves
//! the bytes, applies the [`ConflictPolicy`] and releases every handle it
//! opened, whatever the outcome.
//!
//! Handles are [`FileSystemHandle`] guards. Success paths close them
//! explicitly so close failures are reported; every early return (error or
//! policy skip) releases them on drop.

use crate::config::{AdaptorProperties, Credential, DEFAULT_BUFFER_SIZE};
use crate::core::{resolve, ConflictPolicy, CopyMode, CopyOperation, EndpointSpec};
use crate::error::{GridError, IoResultExt, Result};
use crate::fs::{AdaptorKind, AdaptorRegistry, FileSystem, FileSystemHandle};
use crate::progress::ProgressReporter;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Side of a copy an endpoint is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Read from
    Source,
    /// Written to
    Target,
}

/// Opens the filesystem behind an endpoint
pub trait FileSystemOpener {
    /// Open the filesystem serving `endpoint`
    fn open(&self, endpoint: &EndpointSpec, side: Side) -> Result<FileSystemHandle>;
}

/// Opens endpoints through the adaptor registry with per-side credentials
#[derive(Debug, Clone)]
pub struct Connector {
    registry: AdaptorRegistry,
    command_adaptor: AdaptorKind,
    source_credential: Credential,
    target_credential: Credential,
    properties: AdaptorProperties,
}

impl Connector {
    /// Create a connector.
    ///
    /// `properties` were given for `command_adaptor` and are only passed to
    /// endpoints served by that adaptor.
    pub fn new(
        registry: AdaptorRegistry,
        command_adaptor: AdaptorKind,
        source_credential: Credential,
        target_credential: Credential,
        properties: AdaptorProperties,
    ) -> Self {
        Self {
            registry,
            command_adaptor,
            source_credential,
            target_credential,
            properties,
        }
    }
}

impl FileSystemOpener for Connector {
    fn open(&self, endpoint: &EndpointSpec, side: Side) -> Result<FileSystemHandle> {
        let credential = match side {
            Side::Source => &self.source_credential,
            Side::Target => &self.target_credential,
        };
        let no_properties = AdaptorProperties::default();
        let properties = if endpoint.adaptor == self.command_adaptor {
            &self.properties
        } else {
            &no_properties
        };

        self.registry.open(
            endpoint.adaptor,
            endpoint.location.as_deref(),
            credential,
            properties,
        )
    }
}

/// Outcome of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    /// Mode that was executed
    pub mode: CopyMode,
    /// Bytes written to the target
    pub bytes_copied: u64,
    /// Files copied and directories created
    pub entries_copied: u64,
    /// Entries left alone (existing targets under IGNORE, linked directories)
    pub entries_skipped: u64,
    /// Source location, or adaptor name
    pub source_label: String,
    /// Target location, or adaptor name
    pub target_label: String,
}

impl TransferResult {
    fn new(mode: CopyMode, op: &CopyOperation) -> Self {
        Self {
            mode,
            bytes_copied: 0,
            entries_copied: 0,
            entries_skipped: 0,
            source_label: op.source.location_label().to_string(),
            target_label: op.target.location_label().to_string(),
        }
    }

    /// Bytes for file and stream copies, entries for tree copies
    pub fn count(&self) -> u64 {
        match self.mode {
            CopyMode::Tree => self.entries_copied,
            _ => self.bytes_copied,
        }
    }

    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Copied(bytes) => {
                self.bytes_copied += bytes;
                self.entries_copied += 1;
            }
            FileOutcome::Skipped => self.entries_skipped += 1,
        }
    }
}

enum FileOutcome {
    Copied(u64),
    Skipped,
}

/// What to do with a target path
enum Disposition {
    Write { replace: bool },
    Skip,
}

/// Executes copy operations against opened filesystems and standard streams
pub struct TransferEngine<'a> {
    opener: &'a dyn FileSystemOpener,
    stdin: Box<dyn Read + 'a>,
    stdout: Box<dyn Write + 'a>,
    buffer_size: usize,
    progress: Option<ProgressReporter>,
}

impl<'a> TransferEngine<'a> {
    /// Create an engine reading standard input from `stdin` and writing
    /// standard output to `stdout`
    pub fn new(
        opener: &'a dyn FileSystemOpener,
        stdin: Box<dyn Read + 'a>,
        stdout: Box<dyn Write + 'a>,
    ) -> Self {
        Self {
            opener,
            stdin,
            stdout,
            buffer_size: DEFAULT_BUFFER_SIZE,
            progress: None,
        }
    }

    /// Set the transfer chunk size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Set progress reporter, used for file and tree copies
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Resolve the mode of `op` and execute it
    pub fn run(&mut self, op: &CopyOperation) -> Result<TransferResult> {
        let mode = resolve(op)?;
        self.execute(op, mode)
    }

    /// Execute `op` in `mode`
    pub fn execute(&mut self, op: &CopyOperation, mode: CopyMode) -> Result<TransferResult> {
        info!("Copying {} to {} ({})", op.source, op.target, mode);

        let mut result = TransferResult::new(mode, op);
        let outcome = match mode {
            CopyMode::StreamIn => self.stream_in(op, &mut result),
            CopyMode::StreamOut => self.stream_out(op, &mut result),
            CopyMode::File => self.copy_single(op, &mut result),
            CopyMode::Tree => self.copy_tree(op, &mut result),
        };

        if let Some(progress) = &self.progress {
            progress.finish();
        }
        outcome?;

        info!(
            "Copied {} bytes, {} entries ({} skipped)",
            result.bytes_copied, result.entries_copied, result.entries_skipped
        );
        Ok(result)
    }

    /// Standard input to the target file
    fn stream_in(&mut self, op: &CopyOperation, result: &mut TransferResult) -> Result<()> {
        // '-' on the target side is stdout, not a path
        if op.target.stream {
            return Err(GridError::invalid_combination(
                op.target.adaptor.name(),
                "Unable to copy from stdin to stdout",
            ));
        }

        let target = self.opener.open(&op.target, Side::Target)?;
        let path = Path::new(&op.target.path);

        match resolve_conflict(&*target, path, op.conflict_policy)? {
            Disposition::Skip => result.record(FileOutcome::Skipped),
            Disposition::Write { replace } => {
                let mut writer = target.open_write(path, replace)?;
                let bytes = pipe(
                    &mut self.stdin,
                    &mut writer,
                    self.buffer_size,
                    op.source.adaptor.name(),
                    target.adaptor(),
                    None,
                )?;
                drop(writer);
                result.record(FileOutcome::Copied(bytes));
            }
        }

        target.close()
    }

    /// Source file to standard output
    fn stream_out(&mut self, op: &CopyOperation, result: &mut TransferResult) -> Result<()> {
        let source = self.opener.open(&op.source, Side::Source)?;
        let path = Path::new(&op.source.path);
        check_source_file(&*source, path)?;

        let mut reader = source.open_read(path)?;
        let bytes = pipe(
            &mut reader,
            &mut self.stdout,
            self.buffer_size,
            source.adaptor(),
            op.target.adaptor.name(),
            None,
        )?;
        drop(reader);
        result.record(FileOutcome::Copied(bytes));

        source.close()
    }

    /// One file to one file
    fn copy_single(&self, op: &CopyOperation, result: &mut TransferResult) -> Result<()> {
        let source = self.opener.open(&op.source, Side::Source)?;
        let target = self.opener.open(&op.target, Side::Target)?;

        let outcome = self.copy_file(
            &*source,
            Path::new(&op.source.path),
            &*target,
            Path::new(&op.target.path),
            op.conflict_policy,
        )?;
        result.record(outcome);

        source.close()?;
        target.close()
    }

    /// A directory tree, depth-first, parents before children
    fn copy_tree(&self, op: &CopyOperation, result: &mut TransferResult) -> Result<()> {
        let source = self.opener.open(&op.source, Side::Source)?;
        let target = self.opener.open(&op.target, Side::Target)?;
        let source_root = Path::new(&op.source.path);
        let target_root = Path::new(&op.target.path);

        let root = source
            .attributes(source_root)?
            .ok_or_else(|| GridError::source_not_found(source.adaptor(), &op.source.path))?;

        if !root.is_directory {
            debug!("{} is a file, copying it as a single file", op.source.path);
            let outcome = self.copy_file(
                &*source,
                source_root,
                &*target,
                target_root,
                op.conflict_policy,
            )?;
            result.record(outcome);
        } else {
            if ensure_directory(&*target, target_root)? {
                result.entries_copied += 1;
            }

            for entry in source.walk(source_root)? {
                let source_path = source_root.join(&entry.relative_path);
                let target_path = target_root.join(&entry.relative_path);

                if entry.attributes.is_directory && entry.attributes.is_symbolic_link {
                    warn!("Skipping symbolic link to directory {}", source_path.display());
                    result.entries_skipped += 1;
                } else if entry.attributes.is_directory {
                    if ensure_directory(&*target, &target_path)? {
                        debug!("Created directory {}", target_path.display());
                        result.entries_copied += 1;
                    }
                } else {
                    let outcome = self.copy_file(
                        &*source,
                        &source_path,
                        &*target,
                        &target_path,
                        op.conflict_policy,
                    )?;
                    result.record(outcome);
                }
            }
        }

        source.close()?;
        target.close()
    }

    fn copy_file(
        &self,
        source: &dyn FileSystem,
        source_path: &Path,
        target: &dyn FileSystem,
        target_path: &Path,
        policy: ConflictPolicy,
    ) -> Result<FileOutcome> {
        check_source_file(source, source_path)?;

        let replace = match resolve_conflict(target, target_path, policy)? {
            Disposition::Skip => return Ok(FileOutcome::Skipped),
            Disposition::Write { replace } => replace,
        };
        if replace {
            check_distinct(source, source_path, target, target_path)?;
        }

        debug!(
            "Copying file {} to {}",
            source_path.display(),
            target_path.display()
        );
        if let Some(progress) = &self.progress {
            progress.set_current(&source_path.display().to_string());
        }

        let mut reader = source.open_read(source_path)?;
        let mut writer = target.open_write(target_path, replace)?;
        let bytes = pipe(
            &mut reader,
            &mut writer,
            self.buffer_size,
            source.adaptor(),
            target.adaptor(),
            self.progress.as_ref(),
        )?;
        Ok(FileOutcome::Copied(bytes))
    }
}

/// The source must exist and must not be a directory
fn check_source_file(source: &dyn FileSystem, path: &Path) -> Result<()> {
    let attrs = source
        .attributes(path)?
        .ok_or_else(|| GridError::source_not_found(source.adaptor(), path.display().to_string()))?;

    if attrs.is_directory {
        return Err(GridError::FileExpected {
            adaptor: source.adaptor().to_string(),
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Replacing a file with itself would truncate it before it is read
fn check_distinct(
    source: &dyn FileSystem,
    source_path: &Path,
    target: &dyn FileSystem,
    target_path: &Path,
) -> Result<()> {
    let source_id = source.object_id(source_path)?;
    if source_id.is_some() && source_id == target.object_id(target_path)? {
        return Err(GridError::SameSourceAndTarget {
            adaptor: target.adaptor().to_string(),
            path: target_path.display().to_string(),
        });
    }
    Ok(())
}

/// Apply `policy` to an existing target
fn resolve_conflict(
    target: &dyn FileSystem,
    path: &Path,
    policy: ConflictPolicy,
) -> Result<Disposition> {
    let Some(attrs) = target.attributes(path)? else {
        return Ok(Disposition::Write { replace: false });
    };

    match policy {
        ConflictPolicy::Create => Err(GridError::target_exists(
            target.adaptor(),
            path.display().to_string(),
        )),
        ConflictPolicy::Ignore => {
            info!("Skipping existing target {}", path.display());
            Ok(Disposition::Skip)
        }
        ConflictPolicy::Replace if attrs.is_directory => Err(GridError::FileExpected {
            adaptor: target.adaptor().to_string(),
            path: path.display().to_string(),
        }),
        ConflictPolicy::Replace => Ok(Disposition::Write { replace: true }),
    }
}

/// Make sure `path` is a directory on `target`; true if it had to be created
fn ensure_directory(target: &dyn FileSystem, path: &Path) -> Result<bool> {
    match target.attributes(path)? {
        Some(attrs) if attrs.is_directory => Ok(false),
        Some(_) => Err(GridError::DirectoryExpected {
            adaptor: target.adaptor().to_string(),
            path: path.display().to_string(),
        }),
        None => {
            target.create_dir(path)?;
            Ok(true)
        }
    }
}

/// Copy `reader` to `writer` in chunks of `buffer_size` bytes.
///
/// Read failures are reported against `from`, write failures against `to`.
fn pipe<R, W>(
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
    from: &str,
    to: &str,
    progress: Option<&ProgressReporter>,
) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buffer = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(GridError::transfer(from, "Failed to read source", e)),
        };

        writer
            .write_all(&buffer[..n])
            .with_adaptor(to, || "Failed to write target".to_string())?;

        total += n as u64;
        if let Some(progress) = progress {
            progress.increment_bytes(n as u64);
        }
    }

    writer
        .flush()
        .with_adaptor(to, || "Failed to write target".to_string())?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::CountingFileSystem;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn connector() -> Connector {
        Connector::new(
            AdaptorRegistry::builtin(),
            AdaptorKind::File,
            Credential::default(),
            Credential::default(),
            AdaptorProperties::default(),
        )
    }

    /// Opens local filesystems and counts their releases
    struct CountingOpener {
        opened: AtomicUsize,
        closes: Arc<AtomicUsize>,
    }

    impl CountingOpener {
        fn new() -> Self {
            Self {
                opened: AtomicUsize::new(0),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn all_released(&self) -> bool {
            self.opened.load(Ordering::SeqCst) == self.closes.load(Ordering::SeqCst)
        }
    }

    impl FileSystemOpener for CountingOpener {
        fn open(&self, _endpoint: &EndpointSpec, _side: Side) -> Result<FileSystemHandle> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(FileSystemHandle::new(Box::new(CountingFileSystem::new(
                self.closes.clone(),
            ))))
        }
    }

    fn operation(
        source: &Path,
        target: &Path,
        recursive: bool,
        policy: ConflictPolicy,
    ) -> CopyOperation {
        CopyOperation {
            source: EndpointSpec::parse(&source.display().to_string(), AdaptorKind::File, None),
            target: EndpointSpec::parse(&target.display().to_string(), AdaptorKind::File, None),
            recursive,
            conflict_policy: policy,
        }
    }

    fn stream_operation(source: &str, target: &str) -> CopyOperation {
        CopyOperation {
            source: EndpointSpec::parse(source, AdaptorKind::File, None),
            target: EndpointSpec::parse(target, AdaptorKind::File, None),
            recursive: false,
            conflict_policy: ConflictPolicy::Create,
        }
    }

    fn run(opener: &dyn FileSystemOpener, op: &CopyOperation) -> Result<TransferResult> {
        TransferEngine::new(opener, Box::new(std::io::empty()), Box::new(std::io::sink())).run(op)
    }

    fn source_tree(root: &Path) -> PathBuf {
        let source = root.join("source");
        std::fs::create_dir_all(source.join("dep1")).unwrap();
        std::fs::create_dir_all(source.join("empty")).unwrap();
        std::fs::write(source.join("file1"), b"first file").unwrap();
        std::fs::write(source.join("dep1/file2"), b"second file").unwrap();
        source
    }

    #[test]
    fn test_file_copy_to_new_target() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        let content = vec![0xABu8; 100 * 1024];
        std::fs::write(&source, &content).unwrap();

        let op = operation(&source, &target, false, ConflictPolicy::Create);
        let result = run(&connector(), &op).unwrap();

        assert_eq!(result.mode, CopyMode::File);
        assert_eq!(result.bytes_copied, content.len() as u64);
        assert_eq!(result.count(), content.len() as u64);
        assert_eq!(result.source_label, "file");
        assert!(std::fs::metadata(&target).unwrap().is_file());
        assert_eq!(std::fs::read(&target).unwrap(), content);
    }

    #[test]
    fn test_small_buffer_copies_everything() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        std::fs::write(&source, b"more than seven bytes").unwrap();

        let op = operation(&source, &target, false, ConflictPolicy::Create);
        let opener = connector();
        let stdin = Box::new(std::io::empty());
        let result = TransferEngine::new(&opener, stdin, Box::new(std::io::sink()))
            .with_buffer_size(7)
            .run(&op)
            .unwrap();

        assert_eq!(result.bytes_copied, 21);
        assert_eq!(std::fs::read(&target).unwrap(), b"more than seven bytes");
    }

    #[test]
    fn test_existing_target_fails_and_is_untouched() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&target, b"old").unwrap();

        let op = operation(&source, &target, false, ConflictPolicy::Create);
        let err = run(&connector(), &op).unwrap_err();

        assert!(matches!(err, GridError::TargetExists { .. }));
        assert!(err.to_string().contains("Destination path already exists"));
        assert!(err.to_string().starts_with("file adaptor:"));
        assert_eq!(std::fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_replace_overwrites() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&target, b"much older content").unwrap();

        let op = operation(&source, &target, false, ConflictPolicy::Replace);
        let result = run(&connector(), &op).unwrap();

        assert_eq!(result.bytes_copied, 3);
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_replace_refuses_directory_target() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target");
        std::fs::write(&source, b"new").unwrap();
        std::fs::create_dir(&target).unwrap();

        let op = operation(&source, &target, false, ConflictPolicy::Replace);
        let err = run(&connector(), &op).unwrap_err();
        assert!(matches!(err, GridError::FileExpected { .. }));
    }

    #[test]
    fn test_replace_onto_itself_keeps_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("data.txt");
        std::fs::write(&source, b"precious data").unwrap();

        let op = operation(&source, &source, false, ConflictPolicy::Replace);
        let err = run(&connector(), &op).unwrap_err();
        assert!(matches!(err, GridError::SameSourceAndTarget { .. }));
        assert_eq!(std::fs::read(&source).unwrap(), b"precious data");

        // Same file through another spelling of the path
        let alias = dir.path().join(".").join("data.txt");
        let op = operation(&source, &alias, false, ConflictPolicy::Replace);
        let err = run(&connector(), &op).unwrap_err();
        assert!(matches!(err, GridError::SameSourceAndTarget { .. }));
        assert_eq!(std::fs::read(&source).unwrap(), b"precious data");
    }

    #[test]
    fn test_ignore_skips() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&target, b"old").unwrap();

        let op = operation(&source, &target, false, ConflictPolicy::Ignore);
        let result = run(&connector(), &op).unwrap();

        assert_eq!(result.bytes_copied, 0);
        assert_eq!(result.entries_skipped, 1);
        assert_eq!(std::fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let op = operation(
            &dir.path().join("nope"),
            &dir.path().join("target"),
            false,
            ConflictPolicy::Create,
        );
        let err = run(&connector(), &op).unwrap_err();
        assert!(matches!(err, GridError::SourceNotFound { .. }));
        assert!(!dir.path().join("target").exists());
    }

    #[test]
    fn test_directory_source_needs_recursive() {
        let dir = TempDir::new().unwrap();
        let source = source_tree(dir.path());
        let op = operation(&source, &dir.path().join("target"), false, ConflictPolicy::Create);
        let err = run(&connector(), &op).unwrap_err();
        assert!(matches!(err, GridError::FileExpected { .. }));
    }

    #[test]
    fn test_stream_in() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        let op = stream_operation("-", &target.display().to_string());

        let opener = connector();
        let stdin = Cursor::new(b"my content".to_vec());
        let result = TransferEngine::new(&opener, Box::new(stdin), Box::new(std::io::sink()))
            .run(&op)
            .unwrap();

        assert_eq!(result.mode, CopyMode::StreamIn);
        assert_eq!(result.bytes_copied, 10);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "my content");
    }

    #[test]
    fn test_stream_in_existing_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        std::fs::write(&target, b"old").unwrap();
        let op = stream_operation("-", &target.display().to_string());

        let opener = connector();
        let stdin = Cursor::new(b"my content".to_vec());
        let err = TransferEngine::new(&opener, Box::new(stdin), Box::new(std::io::sink()))
            .run(&op)
            .unwrap_err();

        assert!(err.to_string().contains("Destination path already exists"));
        assert_eq!(std::fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_stream_in_to_stdout_is_refused() {
        let op = stream_operation("-", "-");
        let opener = CountingOpener::new();
        let mut stdout = Vec::new();
        let stdin = Cursor::new(b"piped".to_vec());
        let err = TransferEngine::new(&opener, Box::new(stdin), Box::new(&mut stdout))
            .run(&op)
            .unwrap_err();

        assert!(matches!(err, GridError::InvalidCombination { .. }));
        assert_eq!(err.to_string(), "file adaptor: Unable to copy from stdin to stdout");
        assert_eq!(opener.opened.load(Ordering::SeqCst), 0);
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_stream_out() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        std::fs::write(&source, b"streamed content").unwrap();
        let op = stream_operation(&source.display().to_string(), "-");

        let opener = connector();
        let mut stdout = Vec::new();
        let result = TransferEngine::new(&opener, Box::new(std::io::empty()), Box::new(&mut stdout))
            .run(&op)
            .unwrap();

        assert_eq!(result.mode, CopyMode::StreamOut);
        assert_eq!(stdout, b"streamed content");
    }

    #[test]
    fn test_stream_out_missing_source() {
        let dir = TempDir::new().unwrap();
        let op = stream_operation(&dir.path().join("nope").display().to_string(), "-");
        let err = run(&connector(), &op).unwrap_err();
        assert!(matches!(err, GridError::SourceNotFound { .. }));
    }

    #[test]
    fn test_tree_copy() {
        let dir = TempDir::new().unwrap();
        let source = source_tree(dir.path());
        let target = dir.path().join("target");

        let op = operation(&source, &target, true, ConflictPolicy::Create);
        let result = run(&connector(), &op).unwrap();

        assert_eq!(result.mode, CopyMode::Tree);
        assert!(std::fs::metadata(target.join("file1")).unwrap().is_file());
        assert!(std::fs::metadata(target.join("dep1/file2")).unwrap().is_file());
        assert!(target.join("empty").is_dir());
        assert_eq!(std::fs::read(target.join("dep1/file2")).unwrap(), b"second file");
        // target, dep1, empty, file1, file2
        assert_eq!(result.entries_copied, 5);
        assert_eq!(result.count(), 5);
        assert_eq!(result.bytes_copied, 21);
    }

    #[test]
    fn test_tree_policy_is_per_file() {
        let dir = TempDir::new().unwrap();
        let source = source_tree(dir.path());
        let target = dir.path().join("target");
        std::fs::create_dir_all(target.join("dep1")).unwrap();
        std::fs::write(target.join("dep1/file2"), b"keep me").unwrap();

        let op = operation(&source, &target, true, ConflictPolicy::Ignore);
        let result = run(&connector(), &op).unwrap();
        assert_eq!(result.entries_skipped, 1);
        assert_eq!(std::fs::read(target.join("dep1/file2")).unwrap(), b"keep me");
        assert_eq!(std::fs::read(target.join("file1")).unwrap(), b"first file");

        std::fs::remove_file(target.join("file1")).unwrap();
        let op = operation(&source, &target, true, ConflictPolicy::Create);
        let err = run(&connector(), &op).unwrap_err();
        assert!(matches!(err, GridError::TargetExists { .. }));
    }

    #[test]
    fn test_tree_replace_onto_itself_keeps_source() {
        let dir = TempDir::new().unwrap();
        let source = source_tree(dir.path());

        let op = operation(&source, &source, true, ConflictPolicy::Replace);
        let err = run(&connector(), &op).unwrap_err();
        assert!(matches!(err, GridError::SameSourceAndTarget { .. }));
        assert_eq!(std::fs::read(source.join("file1")).unwrap(), b"first file");
        assert_eq!(std::fs::read(source.join("dep1/file2")).unwrap(), b"second file");
    }

    #[test]
    fn test_tree_into_file_fails() {
        let dir = TempDir::new().unwrap();
        let source = source_tree(dir.path());
        let target = dir.path().join("target");
        std::fs::write(&target, b"not a directory").unwrap();

        let op = operation(&source, &target, true, ConflictPolicy::Replace);
        let err = run(&connector(), &op).unwrap_err();
        assert!(matches!(err, GridError::DirectoryExpected { .. }));
    }

    #[test]
    fn test_recursive_single_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("single.txt");
        let target = dir.path().join("copy.txt");
        std::fs::write(&source, b"alone").unwrap();

        let op = operation(&source, &target, true, ConflictPolicy::Create);
        let result = run(&connector(), &op).unwrap();
        assert_eq!(result.entries_copied, 1);
        assert_eq!(std::fs::read(&target).unwrap(), b"alone");
    }

    #[test]
    fn test_handles_released_on_success() {
        let dir = TempDir::new().unwrap();
        let source = source_tree(dir.path());
        let opener = CountingOpener::new();

        let op = operation(&source, &dir.path().join("target"), true, ConflictPolicy::Create);
        run(&opener, &op).unwrap();
        assert_eq!(opener.opened.load(Ordering::SeqCst), 2);
        assert!(opener.all_released());
    }

    #[test]
    fn test_handles_released_on_error_and_skip() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&target, b"old").unwrap();

        let opener = CountingOpener::new();
        let op = operation(&source, &target, false, ConflictPolicy::Create);
        assert!(run(&opener, &op).is_err());
        assert!(opener.all_released());

        let op = operation(&source, &target, false, ConflictPolicy::Ignore);
        run(&opener, &op).unwrap();
        assert!(opener.all_released());

        let op = stream_operation("-", &target.display().to_string());
        assert!(run(&opener, &op).is_err());
        assert_eq!(opener.opened.load(Ordering::SeqCst), 5);
        assert!(opener.all_released());
    }

    #[test]
    fn test_invalid_combination_opens_nothing() {
        let opener = CountingOpener::new();
        let mut op = stream_operation("-", "/tmp/whatever");
        op.recursive = true;
        let err = run(&opener, &op).unwrap_err();
        assert!(matches!(err, GridError::InvalidCombination { .. }));
        assert_eq!(opener.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_connector_scopes_properties_to_command_adaptor() {
        let props = AdaptorProperties::parse(&["port=2222".to_string()]).unwrap();
        let connector = Connector::new(
            AdaptorRegistry::builtin(),
            AdaptorKind::Sftp,
            Credential::default(),
            Credential::default(),
            props,
        );
        let endpoint = EndpointSpec::parse("file:/tmp", AdaptorKind::Sftp, Some("host"));
        let handle = connector.open(&endpoint, Side::Source).unwrap();
        assert_eq!(handle.adaptor(), "file");
        handle.close().unwrap();
    }
}
