//! Extension sorter: copies every file of a tree into per-extension buckets.
//!
//! Files are copied, never moved. `notes.TXT` found anywhere below the root
//! ends up at `<output>/txt_files/notes.TXT`; files without an extension are
//! left alone. The output directory is excluded from the walk, so sorting into
//! a folder inside the source tree never copies earlier results again.
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::bucket::Bucket;
use crate::error::{SnapError, SnapResult};
use crate::walker::{ExclusionSet, TreeWalker, normalize, resolve_root};

/// A single planned or performed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOperation {
    /// The file found in the source tree.
    pub source: PathBuf,
    /// Where the copy lands, inside the bucket folder.
    pub destination: PathBuf,
    /// The bucket the file belongs to.
    pub bucket: Bucket,
}

impl CopyOperation {
    /// Plans the copy of `file` into `output_dir`, or `None` if it has no extension.
    pub fn for_file(output_dir: &Path, file: PathBuf) -> Option<Self> {
        let bucket = Bucket::for_path(&file)?;
        let file_name = file.file_name()?.to_owned();
        let destination = output_dir.join(bucket.dir_name()).join(file_name);

        Some(Self {
            source: file,
            destination,
            bucket,
        })
    }

    /// Creates the bucket folder if needed and copies the file into it.
    ///
    /// An existing file at the destination is overwritten. Permissions are
    /// always carried over; access and modification times only when
    /// `preserve_timestamps` is set, and failing to set them is only logged.
    ///
    /// # Errors
    ///
    /// Returns `FileCopy` if the bucket cannot be created or the copy fails.
    pub fn execute(&self, preserve_timestamps: bool) -> SnapResult<()> {
        let bucket_dir = self.destination.parent().unwrap_or(Path::new("."));

        if !bucket_dir.is_dir() {
            fs::create_dir_all(bucket_dir).map_err(|source| SnapError::FileCopy {
                from: self.source.clone(),
                to: bucket_dir.to_path_buf(),
                source,
            })?;
        }

        fs::copy(&self.source, &self.destination).map_err(|source| SnapError::FileCopy {
            from: self.source.clone(),
            to: self.destination.clone(),
            source,
        })?;

        if preserve_timestamps && let Err(e) = copy_times(&self.source, &self.destination) {
            warn!(
                path = %self.destination.display(),
                error = %e,
                "could not preserve timestamps"
            );
        }

        Ok(())
    }
}

fn copy_times(source: &Path, destination: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    filetime::set_file_times(
        destination,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
}

/// Tally of one sorting run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortReport {
    /// Files copied into a bucket.
    pub copied: usize,
    /// Files left alone: no extension, or already sitting in their bucket.
    pub skipped: usize,
    /// Files whose bucket or copy failed.
    pub failed: usize,
    /// Copies per bucket folder name.
    pub buckets: BTreeMap<String, usize>,
}

impl SortReport {
    fn record(&mut self, bucket: &Bucket) {
        self.copied += 1;
        *self.buckets.entry(bucket.dir_name()).or_insert(0) += 1;
    }

    /// Returns the total number of files visited.
    pub fn total_seen(&self) -> usize {
        self.copied + self.skipped + self.failed
    }

    /// Returns true if no file failed to copy.
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

/// Options for a sorting run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOptions {
    /// Carry access and modification times onto the copies.
    pub preserve_timestamps: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            preserve_timestamps: true,
        }
    }
}

/// Copies the files of one tree into extension buckets under an output directory.
pub struct ExtensionSorter {
    root: PathBuf,
    output_dir: PathBuf,
    options: SortOptions,
}

impl ExtensionSorter {
    /// Prepares a sorter for `root`.
    ///
    /// Fails with `InvalidSourceDirectory` when `root` is not an existing
    /// directory. Nothing is created until [`organize`](Self::organize).
    pub fn new(root: &Path, output_dir: &Path) -> SnapResult<Self> {
        Ok(Self {
            root: resolve_root(root)?,
            output_dir: output_dir.to_path_buf(),
            options: SortOptions::default(),
        })
    }

    pub fn with_options(mut self, options: SortOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Lists the copies a run would perform, without creating anything.
    pub fn plan(&self) -> Vec<CopyOperation> {
        let output_dir = normalize(&self.output_dir);
        let exclusions: ExclusionSet = [output_dir.clone()].into_iter().collect();

        TreeWalker::new(&self.root, &exclusions)
            .files()
            .filter_map(|file| CopyOperation::for_file(&output_dir, file))
            .collect()
    }

    /// Creates the output directory and copies every file into its bucket.
    ///
    /// # Errors
    ///
    /// Only `OutputDirectoryCreate` is returned. A file that cannot be copied
    /// is logged, counted in [`SortReport::failed`], and the run moves on.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsnap::extension_sorter::ExtensionSorter;
    /// use indicatif::ProgressBar;
    /// use std::path::Path;
    ///
    /// let sorter = ExtensionSorter::new(Path::new("project"), Path::new("sorted")).unwrap();
    /// match sorter.organize(&ProgressBar::hidden()) {
    ///     Ok(report) => println!("Copied {} files", report.copied),
    ///     Err(e) => eprintln!("Sorting failed: {}", e),
    /// }
    /// ```
    pub fn organize(&self, progress: &ProgressBar) -> SnapResult<SortReport> {
        fs::create_dir_all(&self.output_dir).map_err(|source| {
            SnapError::OutputDirectoryCreate {
                path: self.output_dir.clone(),
                source,
            }
        })?;

        // Normalized after creation so the exclusion matches walked paths exactly.
        let output_dir = normalize(&self.output_dir);
        let exclusions: ExclusionSet = [output_dir.clone()].into_iter().collect();

        info!(
            root = %self.root.display(),
            output = %output_dir.display(),
            "sorting files by extension"
        );

        let files: Vec<PathBuf> = TreeWalker::new(&self.root, &exclusions).files().collect();
        progress.set_length(files.len() as u64);

        let mut report = SortReport::default();
        for file in files {
            progress.inc(1);

            let Some(operation) = CopyOperation::for_file(&output_dir, file.clone()) else {
                debug!(path = %file.display(), "no extension, skipping");
                report.skipped += 1;
                continue;
            };

            // Only possible when the output directory is the root itself.
            if operation.source == operation.destination {
                debug!(path = %file.display(), "already in its bucket, skipping");
                report.skipped += 1;
                continue;
            }

            progress.set_message(operation.bucket.dir_name());
            match operation.execute(self.options.preserve_timestamps) {
                Ok(()) => report.record(&operation.bucket),
                Err(e) => {
                    warn!(error = %e, "copy failed, continuing with next file");
                    report.failed += 1;
                }
            }
        }

        info!(
            copied = report.copied,
            skipped = report.skipped,
            failed = report.failed,
            "sorting finished"
        );

        Ok(report)
    }
}

/// Sorts `root` into `output_dir` with default options and no progress display.
pub fn organize(root: &Path, output_dir: &Path) -> SnapResult<SortReport> {
    ExtensionSorter::new(root, output_dir)?.organize(&ProgressBar::hidden())
}
