//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored
//! output, progress tracking, and the per-bucket summary table. The library
//! operations never print; only the binary goes through this module.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for operations
/// - Summary tables with statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsnap::output::OutputFormatter;
    /// OutputFormatter::success("Report written");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar whose length is set once the walk knows it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsnap::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar();
    /// pb.set_length(10);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a summary table with copy counts by bucket.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsnap::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("rs_files".to_string(), 15);
    /// counts.insert("md_files".to_string(), 3);
    /// OutputFormatter::summary_table(&counts, 18);
    /// ```
    pub fn summary_table(bucket_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_bucket_len = bucket_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(6); // At least "Bucket" width

        println!(
            "{:<width$} | {}",
            "Bucket".bold(),
            "Files".bold(),
            width = max_bucket_len
        );
        println!("{}", "-".repeat(max_bucket_len + 10));

        for (bucket, count) in bucket_counts {
            println!(
                "{:<width$} | {} {}",
                bucket,
                count.to_string().green(),
                plural(*count),
                width = max_bucket_len
            );
        }

        println!("{}", "-".repeat(max_bucket_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = max_bucket_len
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

/// "file" or "files" depending on `count`.
pub fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
