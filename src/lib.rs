//! dirsnap - project snapshots and extension sorting
//!
//! This library walks a directory tree in one of two ways: serializing its
//! layout and every file's text into a single report, or copying every file
//! into a folder named after its extension. Both walks skip their own output.

pub mod bucket;
pub mod cli;
pub mod config;
pub mod error;
pub mod extension_sorter;
pub mod output;
pub mod serializer;
pub mod walker;

pub use bucket::Bucket;
pub use config::{ConfigError, Settings};
pub use error::{ErrorKind, SnapError, SnapResult};
pub use extension_sorter::{ExtensionSorter, SortReport, organize};
pub use serializer::{ReportSummary, TreeSerializer, serialize};
pub use walker::{ExclusionSet, TreeWalker, WalkEntry};

pub use cli::{Mode, Outcome, SnapCommand, run_cli};
