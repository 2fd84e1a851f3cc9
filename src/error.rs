//! Error types shared by the serializer, the sorter and the CLI shell.
//!
//! Only some of these are fatal. `FileRead` and `FileCopy` describe a single
//! file and are recovered where they happen; the rest abort the operation and
//! reach the caller as the failure half of an [`Outcome`](crate::cli::Outcome).

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while snapshotting or sorting a directory tree.
#[derive(Error, Debug)]
pub enum SnapError {
    /// The source path is missing or is not a directory.
    #[error("Invalid source directory {}: {reason}", path.display())]
    InvalidSourceDirectory { path: PathBuf, reason: String },

    /// A file could not be read or decoded as UTF-8.
    #[error("Error reading file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be copied into its bucket, or the bucket could not be created.
    #[error("Error copying {} to {}: {source}", from.display(), to.display())]
    FileCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report file could not be created or written.
    #[error("Failed to write report {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sorter's output directory could not be created.
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Discriminant of a [`SnapError`], for callers that only need to branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidSourceDirectory,
    FileRead,
    FileCopy,
    OutputWrite,
    OutputDirectoryCreate,
    Config,
}

impl SnapError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSourceDirectory { .. } => ErrorKind::InvalidSourceDirectory,
            Self::FileRead { .. } => ErrorKind::FileRead,
            Self::FileCopy { .. } => ErrorKind::FileCopy,
            Self::OutputWrite { .. } => ErrorKind::OutputWrite,
            Self::OutputDirectoryCreate { .. } => ErrorKind::OutputDirectoryCreate,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns true for errors that stop the whole operation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::FileRead | ErrorKind::FileCopy)
    }
}

/// Result type for dirsnap operations.
pub type SnapResult<T> = Result<T, SnapError>;
