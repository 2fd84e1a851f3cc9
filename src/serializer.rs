//! Tree serializer: one text report holding a project's layout and contents.
//!
//! The report starts with an indented listing of the tree, followed by one
//! block per file:
//!
//! ```text
//! Project File Structure:
//! proj/
//!     a.txt
//!     sub/
//!         b.py
//!
//! File: /abs/proj/a.txt
//! ================================================================================
//! <contents of a.txt>
//!
//! File: /abs/proj/sub/b.py
//! ...
//! ```
//!
//! The directory that will hold the report is excluded from the walk, and the
//! report file itself is always skipped, so a report never describes itself.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::error::{SnapError, SnapResult};
use crate::walker::{ExclusionSet, TreeWalker, WalkEntry, normalize, resolve_root};

/// First line of every report.
pub const REPORT_HEADER: &str = "Project File Structure:";

/// Width of the `=` line under each `File:` header.
pub const SEPARATOR_WIDTH: usize = 80;

/// File name used when the caller only picks a directory.
pub const DEFAULT_REPORT_NAME: &str = "project_summary.txt";

const INDENT: &str = "    ";

/// What a finished report contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub report_path: PathBuf,
    /// Number of `File:` blocks written.
    pub files_written: usize,
    /// Blocks whose content was replaced by an `Error reading file:` line.
    pub read_errors: usize,
}

/// Serializes one directory tree into one report file.
#[derive(Debug, Clone)]
pub struct TreeSerializer {
    root: PathBuf,
    report_path: PathBuf,
    exclusions: ExclusionSet,
}

impl TreeSerializer {
    /// Prepares a serializer for `root` writing to `report_path`.
    ///
    /// Fails with `InvalidSourceDirectory` when `root` is not an existing
    /// directory. Nothing is written until [`write_report`](Self::write_report).
    pub fn new(root: &Path, report_path: &Path) -> SnapResult<Self> {
        let root = resolve_root(root)?;

        let parent = match report_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let report_dir = normalize(parent);
        let report_path = match report_path.file_name() {
            Some(name) => report_dir.join(name),
            None => normalize(report_path),
        };

        let mut exclusions = ExclusionSet::new();
        exclusions.insert(&report_dir);

        Ok(Self {
            root,
            report_path,
            exclusions,
        })
    }

    /// Absolute path of the report this serializer writes.
    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    fn walker(&self) -> TreeWalker<'_> {
        TreeWalker::new(&self.root, &self.exclusions).skip_file(&self.report_path)
    }

    /// Builds the indented tree listing without touching the filesystem otherwise.
    pub fn tree_listing(&self) -> Vec<String> {
        self.walker()
            .entries()
            .map(|entry| self.listing_line(&entry))
            .collect()
    }

    fn listing_line(&self, entry: &WalkEntry) -> String {
        let name = if entry.depth() == 0 {
            self.root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| self.root.display().to_string())
        } else {
            entry
                .path()
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string()
        };

        let indent = INDENT.repeat(entry.depth());
        match entry {
            WalkEntry::Directory { .. } => format!("{}{}/", indent, name),
            WalkEntry::File { .. } => format!("{}{}", indent, name),
        }
    }

    /// Creates (or overwrites) the report file and fills it.
    ///
    /// # Errors
    ///
    /// Returns `OutputWrite` if the report cannot be created or written.
    /// Unreadable source files never fail the operation; their blocks carry an
    /// error line instead.
    pub fn write_report(&self, progress: &ProgressBar) -> SnapResult<ReportSummary> {
        info!(
            root = %self.root.display(),
            report = %self.report_path.display(),
            "writing project report"
        );

        let output_error = |source: io::Error| SnapError::OutputWrite {
            path: self.report_path.clone(),
            source,
        };

        let file = File::create(&self.report_path).map_err(output_error)?;
        let mut writer = BufWriter::new(file);
        let summary = self.render(&mut writer, progress).map_err(output_error)?;
        writer.flush().map_err(output_error)?;

        Ok(summary)
    }

    /// Writes the full report to `out`.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        progress: &ProgressBar,
    ) -> io::Result<ReportSummary> {
        // Phase 1: structure.
        let entries: Vec<WalkEntry> = self.walker().entries().collect();
        let listing: Vec<String> = entries.iter().map(|e| self.listing_line(e)).collect();
        progress.set_length(entries.iter().filter(|e| e.is_file()).count() as u64);

        writeln!(out, "{}", REPORT_HEADER)?;
        out.write_all(listing.join("\n").as_bytes())?;
        out.write_all(b"\n\n")?;

        // Phase 2: contents, from a fresh walk.
        let separator = "=".repeat(SEPARATOR_WIDTH);
        let mut files_written = 0;
        let mut read_errors = 0;

        for path in self.walker().files() {
            progress.set_message(display_name(&path));

            writeln!(out, "File: {}", path.display())?;
            writeln!(out, "{}", separator)?;
            match fs::read_to_string(&path) {
                Ok(text) => out.write_all(text.as_bytes())?,
                Err(source) => {
                    write!(out, "Error reading file: {}", source)?;
                    read_errors += 1;
                    let err = SnapError::FileRead {
                        path: path.clone(),
                        source,
                    };
                    warn!(error = %err, "embedding read error in report");
                }
            }
            out.write_all(b"\n\n")?;

            files_written += 1;
            progress.inc(1);
        }

        debug!(files_written, read_errors, "report body complete");

        Ok(ReportSummary {
            report_path: self.report_path.clone(),
            files_written,
            read_errors,
        })
    }
}

/// Serializes `root` into `report_path` without progress display.
pub fn serialize(root: &Path, report_path: &Path) -> SnapResult<ReportSummary> {
    TreeSerializer::new(root, report_path)?.write_report(&ProgressBar::hidden())
}

// Keeps long names from wrapping the progress line.
fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let count = name.chars().count();
    if count > 40 {
        let tail: String = name.chars().skip(count - 37).collect();
        format!("...{}", tail)
    } else {
        name
    }
}
