//! Configuration settings for GridFile
//!
//! Defines the command-line surface and the strongly typed settings
//! derived from it. The rest of the crate never sees raw arguments.

use crate::config::Credential;
use crate::core::{ConflictPolicy, CopyOperation, EndpointSpec};
use crate::error::{GridError, Result};
use crate::fs::{AdaptorDescriptor, AdaptorKind, AdaptorRegistry};
use clap::{ArgGroup, Args, Command, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default chunk size for byte transfers
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Largest accepted chunk size, one chunk is allocated per transfer
pub const MAX_BUFFER_SIZE: u64 = 64 * 1024 * 1024;

/// GridFile - copy, list, and manage files across local and remote filesystems
#[derive(Parser, Debug, Clone)]
#[command(name = "gridfile")]
#[command(author = "GridFile Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Uniform access to local and remote filesystems")]
#[command(long_about = r#"
GridFile gives one argument syntax for files on the local disk, on remote
SFTP servers, and on standard input/output.

Endpoints are written as [adaptor:][location:]path, or '-' for stdin/stdout.

Examples:
  gridfile file copy source.txt target.txt
  gridfile file copy --recursive source/ target/
  cat notes.txt | gridfile file copy - /tmp/notes.txt
  gridfile sftp --location user@host list /home/user
  gridfile file copy report.pdf sftp:user@host:/srv/report.pdf
"#)]
pub struct CliArgs {
    /// Print output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Print the full causal chain of errors
    #[arg(long, global = true)]
    pub stacktrace: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Filesystem adaptor
    #[arg(value_enum, value_name = "ADAPTOR")]
    pub adaptor: AdaptorKind,

    /// Location of the filesystem (host for remote adaptors, base directory for local ones)
    #[arg(long, value_name = "LOCATION")]
    pub location: Option<String>,

    #[command(flatten)]
    pub credential: CredentialArgs,

    /// Adaptor property, can be repeated
    #[arg(long = "prop", value_name = "KEY=VAL")]
    pub props: Vec<String>,

    /// File command
    #[command(subcommand)]
    pub command: FileCommand,
}

/// Credential flags for the main location
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// Username (default: current user)
    #[arg(long, value_name = "USER")]
    pub username: Option<String>,

    /// Password or passphrase
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Certificate private key file
    #[arg(long, value_name = "PATH")]
    pub certfile: Option<PathBuf>,
}

/// Available file commands
#[derive(Subcommand, Debug, Clone)]
pub enum FileCommand {
    /// Copy path from location to other path on target location
    #[command(name = "copy")]
    Copy(CopyArgs),

    /// List objects at path of location
    #[command(name = "list")]
    List {
        /// Path to list
        path: String,
        /// List directories recursively
        #[arg(long)]
        recursive: bool,
        /// Include hidden entries
        #[arg(long)]
        hidden: bool,
    },

    /// Create a directory at path of location
    #[command(name = "mkdir")]
    Mkdir {
        /// Directory to create
        path: String,
        /// Create missing parent directories
        #[arg(long)]
        parents: bool,
    },

    /// Remove path at location
    #[command(name = "remove")]
    Remove {
        /// Path to remove
        path: String,
        /// Remove directories and their contents
        #[arg(long)]
        recursive: bool,
    },

    /// Rename path at location
    #[command(name = "rename")]
    Rename {
        /// Existing path
        source: String,
        /// New path
        target: String,
    },
}

/// Arguments of the copy command
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("copymode").args(["replace", "ignore"])))]
pub struct CopyArgs {
    /// Source path, [adaptor:][location:]path or '-' for stdin
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Target path, [adaptor:][location:]path or '-' for stdout
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Copy directories recursively
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// If a file already exists at the target location, replace it with the source file
    #[arg(long)]
    pub replace: bool,

    /// If a file already exists at the target location, skip copying of that file
    #[arg(long)]
    pub ignore: bool,

    /// Location of the target (default: --location value)
    #[arg(long, value_name = "LOCATION")]
    pub target_location: Option<String>,

    /// Username for target location (default: --username value)
    #[arg(long, value_name = "USER")]
    pub target_username: Option<String>,

    /// Password or passphrase for target location (default: --password value)
    #[arg(long, value_name = "PASSWORD")]
    pub target_password: Option<String>,

    /// Certificate private key file for target location (default: --certfile value)
    #[arg(long, value_name = "PATH")]
    pub target_certfile: Option<PathBuf>,

    /// Transfer chunk size (e.g., 16K, 1M)
    #[arg(short = 'b', long, default_value = "16K", value_name = "SIZE")]
    pub buffer_size: String,

    /// Show transfer progress on stderr
    #[arg(short = 'p', long)]
    pub progress: bool,
}

impl CopyArgs {
    /// Conflict policy selected by --replace / --ignore
    pub fn conflict_policy(&self) -> ConflictPolicy {
        if self.replace {
            ConflictPolicy::Replace
        } else if self.ignore {
            ConflictPolicy::Ignore
        } else {
            ConflictPolicy::Create
        }
    }
}

/// Adaptor properties given with --prop, validated per adaptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdaptorProperties {
    values: BTreeMap<String, String>,
}

impl AdaptorProperties {
    /// Parse a list of KEY=VAL strings
    pub fn parse(items: &[String]) -> Result<Self> {
        let mut values = BTreeMap::new();
        for item in items {
            let (key, value) = parse_key_value(item).map_err(GridError::config)?;
            values.insert(key, value);
        }
        Ok(Self { values })
    }

    /// Reject keys the adaptor does not understand
    pub fn validate(&self, descriptor: &AdaptorDescriptor) -> Result<()> {
        for key in self.values.keys() {
            if !descriptor.properties.contains(&key.as_str()) {
                let allowed = if descriptor.properties.is_empty() {
                    "none".to_string()
                } else {
                    descriptor.properties.join(", ")
                };
                return Err(GridError::InvalidProperty {
                    adaptor: descriptor.name.to_string(),
                    key: key.clone(),
                    allowed,
                });
            }
        }
        Ok(())
    }

    /// Raw property value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Property parsed into `T`, failing with a configuration error
    pub fn get_parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    GridError::config(format!("Invalid value for property '{}': {}", key, raw))
                })
            })
            .transpose()
    }
}

/// Transfer settings that do not change the copy semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopySettings {
    /// Chunk size for byte transfers
    pub buffer_size: usize,
    /// Show a progress bar on stderr
    pub progress: bool,
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("GB") || size.ends_with('G') {
        (size.trim_end_matches(|c| c == 'G' || c == 'B'), 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        (size.trim_end_matches(|c| c == 'M' || c == 'B'), 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        (size.trim_end_matches(|c| c == 'K' || c == 'B'), 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        // Assume bytes if no suffix
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if !num.is_finite() {
        return Err(format!("Invalid number: {}", num_str));
    }
    if num < 0.0 {
        return Err(format!("Negative size: {}", size));
    }

    Ok((num * multiplier as f64) as u64)
}

/// Parse a KEY=VAL argument
pub fn parse_key_value(item: &str) -> std::result::Result<(String, String), String> {
    match item.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Expected KEY=VAL, got '{}'", item)),
    }
}

impl CliArgs {
    /// Command definition with the adaptor reference appended to `--help`
    pub fn command_with_adaptors() -> Command {
        Self::command().after_long_help(AdaptorRegistry::builtin().help())
    }

    /// Adaptor properties from --prop
    pub fn properties(&self) -> Result<AdaptorProperties> {
        AdaptorProperties::parse(&self.props)
    }

    /// Credential for the main location
    pub fn source_credential(&self) -> Credential {
        Credential::from_parts(
            self.credential.username.clone(),
            self.credential.password.clone(),
            self.credential.certfile.clone(),
        )
    }
}

/// Build the copy operation and its transfer settings from the parsed command line
pub fn copy_operation_from_cli(
    cli: &CliArgs,
    args: &CopyArgs,
) -> Result<(CopyOperation, CopySettings)> {
    let source = EndpointSpec::parse(&args.source, cli.adaptor, cli.location.as_deref());
    let target_location = args.target_location.as_deref().or(cli.location.as_deref());
    let target = EndpointSpec::parse(&args.target, cli.adaptor, target_location);

    let buffer_size = parse_size(&args.buffer_size)
        .map_err(|e| GridError::config(format!("Invalid buffer size: {}", e)))?;
    if buffer_size == 0 {
        return Err(GridError::config("Buffer size must be greater than zero"));
    }
    if buffer_size > MAX_BUFFER_SIZE {
        return Err(GridError::config(format!(
            "Buffer size must be at most {}",
            humansize::format_size(MAX_BUFFER_SIZE, humansize::BINARY)
        )));
    }

    let operation = CopyOperation {
        source,
        target,
        recursive: args.recursive,
        conflict_policy: args.conflict_policy(),
    };

    let settings = CopySettings {
        buffer_size: buffer_size as usize,
        progress: args.progress,
    };

    Ok((operation, settings))
}

/// Credential for the copy target, falling back to the main credential flags
pub fn target_credential_from_cli(cli: &CliArgs, args: &CopyArgs) -> Credential {
    Credential::from_parts(
        args.target_username
            .clone()
            .or_else(|| cli.credential.username.clone()),
        args.target_password
            .clone()
            .or_else(|| cli.credential.password.clone()),
        args.target_certfile
            .clone()
            .or_else(|| cli.credential.certfile.clone()),
    )
}
