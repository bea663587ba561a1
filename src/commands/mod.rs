//! File commands
//!
//! Dispatches a parsed command line to its command, prints the command
//! output and turns failures into a diagnostic and an exit code.

mod copy;
mod list;
mod mkdir;
mod remove;
mod rename;

pub use copy::*;
pub use list::*;
pub use mkdir::*;
pub use remove::*;
pub use rename::*;

use crate::config::{CliArgs, FileCommand};
use crate::error::{format_diagnostic, Result};
use crate::fs::{AdaptorRegistry, FileSystemHandle};
use crate::output::{print_output, OutputFormat};
use std::io::{Read, Write};

/// Exit code of a successful command
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code of a failed command
pub const EXIT_FAILURE: i32 = 1;

/// Run the command in `cli` and return the process exit code.
///
/// Errors are written to `stderr` as a single line, or with their causal
/// chain when `--stacktrace` is set.
pub fn run(
    cli: &CliArgs,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    match execute(cli, stdin, stdout) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            // Nothing left to report a broken stderr to
            let _ = writeln!(stderr, "{}", format_diagnostic(e, cli.stacktrace));
            EXIT_FAILURE
        }
    }
}

fn execute(cli: &CliArgs, stdin: &mut dyn Read, stdout: &mut dyn Write) -> Result<()> {
    let format = OutputFormat::from_json_flag(cli.json);

    match &cli.command {
        FileCommand::Copy(args) => {
            let report = copy(cli, args, stdin, stdout)?;
            if !report.is_stream_out() {
                print_output(stdout, &report, format)?;
            }
        }
        FileCommand::List {
            path,
            recursive,
            hidden,
        } => {
            let fs = open_filesystem(cli)?;
            let output = list_objects(&*fs, path, *recursive, *hidden)?;
            fs.close()?;
            print_output(stdout, &output, format)?;
        }
        FileCommand::Mkdir { path, parents } => {
            let fs = open_filesystem(cli)?;
            let output = make_directory(&*fs, path, *parents)?;
            fs.close()?;
            print_output(stdout, &output, format)?;
        }
        FileCommand::Remove { path, recursive } => {
            let fs = open_filesystem(cli)?;
            let output = remove_path(&*fs, path, *recursive)?;
            fs.close()?;
            print_output(stdout, &output, format)?;
        }
        FileCommand::Rename { source, target } => {
            let fs = open_filesystem(cli)?;
            let output = rename_path(&*fs, source, target)?;
            fs.close()?;
            print_output(stdout, &output, format)?;
        }
    }

    Ok(())
}

/// Open the command's own filesystem
fn open_filesystem(cli: &CliArgs) -> Result<FileSystemHandle> {
    AdaptorRegistry::builtin().open(
        cli.adaptor,
        cli.location.as_deref(),
        &cli.source_credential(),
        &cli.properties()?,
    )
}
