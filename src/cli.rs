//! Command-line shell around the serializer and the sorter.
//!
//! This module turns a parsed command into one call of a core operation and
//! turns the result into an [`Outcome`]:
//! - Settings loading
//! - Source validation, before anything is created or written
//! - The nested-output confirmation
//! - Dry-run previews
//! - Progress and summary display

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::debug;

use crate::config::Settings;
use crate::error::{ErrorKind, SnapError, SnapResult};
use crate::extension_sorter::ExtensionSorter;
use crate::output::{OutputFormatter, plural};
use crate::serializer::TreeSerializer;
use crate::walker::{is_within, resolve_root};

/// What to do with the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Export the tree and all file contents to a single text file.
    Single,
    /// Copy files into per-extension folders.
    Separate,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapCommand {
    /// Write a single report into `output_dir`.
    Single {
        output_dir: PathBuf,
        /// If true, print the tree listing without writing anything.
        dry_run: bool,
    },
    /// Copy files into extension buckets under `output_dir`.
    Separate {
        output_dir: PathBuf,
        /// If true, print the planned copies without creating anything.
        dry_run: bool,
    },
}

impl SnapCommand {
    pub fn new(mode: Mode, output_dir: PathBuf, dry_run: bool) -> Self {
        match mode {
            Mode::Single => Self::Single {
                output_dir,
                dry_run,
            },
            Mode::Separate => Self::Separate {
                output_dir,
                dry_run,
            },
        }
    }

    pub fn output_dir(&self) -> &Path {
        match self {
            Self::Single { output_dir, .. } | Self::Separate { output_dir, .. } => output_dir,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        match self {
            Self::Single { dry_run, .. } | Self::Separate { dry_run, .. } => *dry_run,
        }
    }
}

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

/// Answers every question with yes.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Asks on stdout and reads the answer from stdin. Anything but `y`/`yes` is no.
pub struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm(&self, message: &str) -> bool {
        OutputFormatter::warning(message);
        print!("Continue? [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Final result of a command, ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    /// The user declined to continue; nothing was written.
    Cancelled(String),
    Failure { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Cancelled(message) => message,
            Self::Failure { message, .. } => message,
        }
    }
}

impl From<SnapError> for Outcome {
    fn from(err: SnapError) -> Self {
        Self::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Runs a command on `source` using settings found in the default locations.
///
/// # Examples
///
/// ```no_run
/// use dirsnap::cli::{run_cli, AssumeYes, Mode, SnapCommand};
/// use std::path::{Path, PathBuf};
///
/// let command = SnapCommand::new(Mode::Single, PathBuf::from("/tmp"), false);
/// let outcome = run_cli(&command, Path::new("/path/to/project"), &AssumeYes);
/// println!("{}", outcome.message());
/// ```
pub fn run_cli(command: &SnapCommand, source: &Path, confirm: &dyn Confirm) -> Outcome {
    run_cli_with_config(command, source, None, confirm)
}

/// Runs a command with an optional explicit configuration file.
pub fn run_cli_with_config(
    command: &SnapCommand,
    source: &Path,
    config_path: Option<&Path>,
    confirm: &dyn Confirm,
) -> Outcome {
    execute(command, source, config_path, confirm).unwrap_or_else(Outcome::from)
}

fn execute(
    command: &SnapCommand,
    source: &Path,
    config_path: Option<&Path>,
    confirm: &dyn Confirm,
) -> SnapResult<Outcome> {
    let settings = Settings::load(config_path)?;
    let root = resolve_root(source)?;
    debug!(?command, root = %root.display(), "running command");

    let output_dir = command.output_dir();
    if is_within(output_dir, &root) {
        let message = format!(
            "The output directory {} is inside the project directory {}. \
             It will be left out of the walk, but this may lead to unexpected results.",
            output_dir.display(),
            root.display()
        );
        if command.is_dry_run() {
            OutputFormatter::warning(&message);
        } else if !settings.prompt.assume_yes && !confirm.confirm(&message) {
            return Ok(Outcome::Cancelled(
                "Operation cancelled. Nothing was written.".to_string(),
            ));
        }
    }

    match command {
        SnapCommand::Single {
            output_dir,
            dry_run: true,
        } => preview_report(&root, &output_dir.join(&settings.report.file_name)),
        SnapCommand::Single { output_dir, .. } => {
            write_report(&root, &output_dir.join(&settings.report.file_name))
        }
        SnapCommand::Separate {
            output_dir,
            dry_run: true,
        } => preview_sort(&root, output_dir),
        SnapCommand::Separate { output_dir, .. } => sort_files(&root, output_dir, &settings),
    }
}

fn write_report(root: &Path, report_path: &Path) -> SnapResult<Outcome> {
    OutputFormatter::info(&format!("Writing project report for: {}", root.display()));

    let serializer = TreeSerializer::new(root, report_path)?;
    let progress = OutputFormatter::create_progress_bar();
    let result = serializer.write_report(&progress);
    progress.finish_and_clear();
    let summary = result?;

    if summary.read_errors > 0 {
        OutputFormatter::warning(&format!(
            "{} {} could not be read. Their blocks in the report carry the error.",
            summary.read_errors,
            plural(summary.read_errors)
        ));
    }

    Ok(Outcome::Success(format!(
        "Project has been saved to {} ({} {})",
        summary.report_path.display(),
        summary.files_written,
        plural(summary.files_written)
    )))
}

fn preview_report(root: &Path, report_path: &Path) -> SnapResult<Outcome> {
    let serializer = TreeSerializer::new(root, report_path)?;

    OutputFormatter::dry_run_notice(&format!(
        "Report would be written to {}",
        serializer.report_path().display()
    ));
    OutputFormatter::header("Project File Structure:");
    for line in serializer.tree_listing() {
        OutputFormatter::plain(&line);
    }

    Ok(Outcome::Success(
        "Dry run complete. No files were written.".to_string(),
    ))
}

fn sort_files(root: &Path, output_dir: &Path, settings: &Settings) -> SnapResult<Outcome> {
    OutputFormatter::info(&format!("Sorting files of: {}", root.display()));

    let sorter = ExtensionSorter::new(root, output_dir)?.with_options(settings.sort_options());
    let progress = OutputFormatter::create_progress_bar();
    let result = sorter.organize(&progress);
    progress.finish_and_clear();
    let report = result?;

    OutputFormatter::summary_table(&report.buckets, report.copied);

    if report.skipped > 0 {
        OutputFormatter::info(&format!(
            "{} {} without an extension left in place.",
            report.skipped,
            plural(report.skipped)
        ));
    }
    if !report.is_complete_success() {
        OutputFormatter::warning(&format!(
            "{} {} could not be copied. Run with -v for details.",
            report.failed,
            plural(report.failed)
        ));
    }

    Ok(Outcome::Success(format!(
        "Files have been organized in {}",
        output_dir.display()
    )))
}

fn preview_sort(root: &Path, output_dir: &Path) -> SnapResult<Outcome> {
    let sorter = ExtensionSorter::new(root, output_dir)?;
    let plan = sorter.plan();

    if plan.is_empty() {
        OutputFormatter::dry_run_notice("No files with an extension found.");
        return Ok(Outcome::Success(
            "Dry run complete. No files were copied.".to_string(),
        ));
    }

    OutputFormatter::dry_run_notice("Files would be copied as follows:");
    let mut bucket_counts: BTreeMap<String, usize> = BTreeMap::new();
    for operation in &plan {
        let shown = operation
            .source
            .strip_prefix(sorter.root())
            .unwrap_or(&operation.source);
        let bucket = operation.bucket.dir_name();
        OutputFormatter::plain(&format!(" - {}", shown.display()));
        OutputFormatter::plain(&format!("   → Would copy to {}/", bucket));
        *bucket_counts.entry(bucket).or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&bucket_counts, plan.len());

    Ok(Outcome::Success(format!(
        "Dry run complete. No files were copied. Run without --dry-run to copy into {}.",
        sorter.output_dir().display()
    )))
}
