//! GridFile CLI - copy and manage files across local and remote filesystems

use clap::FromArgMatches;
use gridfile::commands::run;
use gridfile::config::CliArgs;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let matches = CliArgs::command_with_adaptors().get_matches();
    let args = CliArgs::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // Initialize logging on stderr; stdout may carry streamed file content
    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();

    let code = run(
        &args,
        &mut stdin.lock(),
        &mut stdout.lock(),
        &mut stderr.lock(),
    );
    std::process::exit(code);
}
