//! Extension buckets for the sorter.
//!
//! A bucket is the destination folder for every file sharing one lowercased
//! extension: `report.TXT` and `notes.txt` both land in `txt_files/`.
//!
//! # Examples
//!
//! ```
//! use dirsnap::bucket::Bucket;
//! use std::path::Path;
//!
//! let bucket = Bucket::for_path(Path::new("photos/Holiday.JPG")).unwrap();
//! assert_eq!(bucket.extension(), "jpg");
//! assert_eq!(bucket.dir_name(), "jpg_files");
//!
//! assert!(Bucket::for_path(Path::new("Makefile")).is_none());
//! ```
use std::fmt;
use std::path::Path;

/// Suffix appended to the extension to form the bucket folder name.
pub const BUCKET_SUFFIX: &str = "_files";

/// Destination folder for files of one extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bucket {
    extension: String,
}

impl Bucket {
    /// Returns the bucket for `path`, or `None` when the file has no extension.
    ///
    /// Leading dots do not start an extension, so `.bashrc` has none, and a
    /// trailing dot (`notes.`) yields an empty extension, which also counts as none.
    pub fn for_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy();
        let (_, extension) = name.trim_start_matches('.').rsplit_once('.')?;
        if extension.is_empty() {
            return None;
        }

        Some(Self {
            extension: extension.to_lowercase(),
        })
    }

    /// The lowercased extension, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Folder name of this bucket, e.g. `txt_files`.
    pub fn dir_name(&self) -> String {
        format!("{}{}", self.extension, BUCKET_SUFFIX)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dir_name())
    }
}
