//! Directory traversal shared by the serializer and the sorter.
//!
//! The walk is pre-order and deterministic: a directory is yielded before its
//! contents, its files come before its subdirectories, and each group is sorted
//! by name. Directories in the [`ExclusionSet`] are pruned before descent, so
//! nothing below them is ever visited.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{SnapError, SnapResult};

/// Turns `path` into an absolute path suitable for exact comparison.
///
/// Existing paths are canonicalized. Paths that do not exist yet fall back to
/// a lexically absolute form.
pub fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Checks that `path` is an existing directory and returns its canonical form.
pub fn resolve_root(path: &Path) -> SnapResult<PathBuf> {
    let invalid = |reason: String| SnapError::InvalidSourceDirectory {
        path: path.to_path_buf(),
        reason,
    };

    if !path.exists() {
        return Err(invalid("path does not exist".to_string()));
    }
    if !path.is_dir() {
        return Err(invalid("path is not a directory".to_string()));
    }

    fs::canonicalize(path).map_err(|e| invalid(e.to_string()))
}

/// Returns true if `path` is `root` itself or lies somewhere below it.
pub fn is_within(path: &Path, root: &Path) -> bool {
    normalize(path).starts_with(normalize(root))
}

/// Absolute directory paths that must never be descended into.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    paths: HashSet<PathBuf>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory, normalized so later comparisons are exact.
    pub fn insert(&mut self, path: &Path) {
        self.paths.insert(normalize(path));
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }
}

impl FromIterator<PathBuf> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut set = Self::new();
        for path in iter {
            set.insert(&path);
        }
        set
    }
}

/// A directory or file reached during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    Directory { path: PathBuf, depth: usize },
    File { path: PathBuf, depth: usize },
}

impl WalkEntry {
    pub fn path(&self) -> &Path {
        match self {
            Self::Directory { path, .. } | Self::File { path, .. } => path,
        }
    }

    /// Number of path components between the walk root and this entry.
    pub fn depth(&self) -> usize {
        match self {
            Self::Directory { depth, .. } | Self::File { depth, .. } => *depth,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

/// Pre-order walker over a canonical root with directory pruning.
pub struct TreeWalker<'a> {
    root: PathBuf,
    exclusions: &'a ExclusionSet,
    skipped_file: Option<PathBuf>,
}

impl<'a> TreeWalker<'a> {
    /// Creates a walker rooted at `root`, which should come from [`resolve_root`].
    pub fn new(root: &Path, exclusions: &'a ExclusionSet) -> Self {
        Self {
            root: root.to_path_buf(),
            exclusions,
            skipped_file: None,
        }
    }

    /// Leaves out a single file, typically the report being written.
    pub fn skip_file(mut self, path: &Path) -> Self {
        self.skipped_file = Some(normalize(path));
        self
    }

    /// Yields every directory and file that survives pruning.
    ///
    /// Unreadable directories are logged and skipped.
    pub fn entries(&self) -> impl Iterator<Item = WalkEntry> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by(files_first)
            .into_iter()
            .filter_entry(move |entry| self.keeps(entry))
            .filter_map(move |result| match result {
                Ok(entry) => self.classify(entry),
                Err(err) => {
                    warn!(error = %err, "skipping entry that could not be read");
                    None
                }
            })
    }

    /// Only the files, in walk order.
    pub fn files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.entries().filter_map(|entry| match entry {
            WalkEntry::File { path, .. } => Some(path),
            WalkEntry::Directory { .. } => None,
        })
    }

    // Runs before descent, which is what keeps excluded subtrees unvisited.
    fn keeps(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if entry.file_type().is_dir() {
            if self.exclusions.contains(entry.path()) {
                debug!(path = %entry.path().display(), "pruning excluded directory");
                return false;
            }
            return true;
        }
        self.skipped_file.as_deref() != Some(entry.path())
    }

    fn classify(&self, entry: DirEntry) -> Option<WalkEntry> {
        let depth = entry.depth();
        let file_type = entry.file_type();

        if depth == 0 || file_type.is_dir() {
            return Some(WalkEntry::Directory {
                path: entry.into_path(),
                depth,
            });
        }

        // Symlinks count only when they resolve to a regular file.
        if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            return Some(WalkEntry::File {
                path: entry.into_path(),
                depth,
            });
        }

        debug!(path = %entry.path().display(), "skipping non-regular entry");
        None
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}
