//! `copy` command

use crate::config::{copy_operation_from_cli, target_credential_from_cli, CliArgs, CopyArgs};
use crate::core::{resolve, Connector, CopyMode, CopyReport, TransferEngine};
use crate::error::Result;
use crate::fs::AdaptorRegistry;
use crate::progress::ProgressReporter;
use humansize::{format_size, BINARY};
use std::io::{Read, Write};
use tracing::info;

/// Run a copy and report what was copied.
///
/// `stdin` and `stdout` back the `-` endpoints.
pub fn copy(
    cli: &CliArgs,
    args: &CopyArgs,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> Result<CopyReport> {
    let (operation, settings) = copy_operation_from_cli(cli, args)?;
    let mode = resolve(&operation)?;

    let connector = Connector::new(
        AdaptorRegistry::builtin(),
        cli.adaptor,
        cli.source_credential(),
        target_credential_from_cli(cli, args),
        cli.properties()?,
    );

    let mut engine = TransferEngine::new(&connector, Box::new(stdin), Box::new(stdout))
        .with_buffer_size(settings.buffer_size);
    if settings.progress && matches!(mode, CopyMode::File | CopyMode::Tree) {
        engine = engine.with_progress(ProgressReporter::new());
    }

    let result = engine.execute(&operation, mode)?;
    info!(
        "Transferred {} in {} entries from '{}' to '{}'",
        format_size(result.bytes_copied, BINARY),
        result.entries_copied,
        result.source_label,
        result.target_label
    );

    Ok(CopyReport::build(&operation, &result))
}
