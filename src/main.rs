use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dirsnap::cli::{
    AssumeYes, Confirm, Mode, Outcome, SnapCommand, StdinPrompt, run_cli_with_config,
};
use dirsnap::output::OutputFormatter;
use tracing_subscriber::EnvFilter;

/// Snapshot a project into one text report, or copy its files into per-extension folders.
#[derive(Parser, Debug)]
#[command(name = "dirsnap", version, about)]
struct Args {
    /// Project directory to read
    source: PathBuf,

    /// Directory that receives the report (single) or the extension folders (separate)
    #[arg(short, long)]
    output: PathBuf,

    /// Export to a single text file, or organize files by extension
    #[arg(short, long, value_enum, default_value_t = Mode::Single)]
    mode: Mode,

    /// Show what would happen without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Continue without asking when the output directory is inside the source
    #[arg(short, long)]
    yes: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    let command = SnapCommand::new(args.mode, args.output, args.dry_run);
    let confirm: &dyn Confirm = if args.yes { &AssumeYes } else { &StdinPrompt };

    let outcome = run_cli_with_config(&command, &args.source, args.config.as_deref(), confirm);
    match &outcome {
        Outcome::Success(message) => OutputFormatter::success(message),
        Outcome::Cancelled(message) => OutputFormatter::warning(message),
        Outcome::Failure { message, .. } => {
            OutputFormatter::error(&format!("Error: {}", message))
        }
    }

    match outcome {
        Outcome::Failure { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
