use dirsnap::cli::{AssumeYes, Mode, Outcome, SnapCommand, run_cli_with_config};
use dirsnap::{ErrorKind, SnapError, organize, serialize};
/// Integration tests for dirsnap
///
/// These tests drive the library the way the binary does, against real
/// temporary directory trees.
///
/// Test categories:
/// 1. Single-file report
/// 2. Sorting by extension
/// 3. Dry-run mode
/// 4. Edge cases and error scenarios
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture with a project tree under `proj/` and room for outputs
/// next to it.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty `proj/` directory.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("proj")).expect("Failed to create project dir");
        TestFixture { temp_dir }
    }

    /// Base of the fixture, parent of `proj/`.
    fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The project directory.
    fn proj(&self) -> PathBuf {
        self.base().join("proj")
    }

    /// Canonical project directory, as it appears in report headers.
    fn canonical_proj(&self) -> PathBuf {
        fs::canonicalize(self.proj()).expect("Failed to canonicalize project dir")
    }

    /// Create a file under `proj/`, creating parent directories as needed.
    fn create_file(&self, rel_path: &str, content: &[u8]) {
        let file_path = self.proj().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    /// Create a text file under `proj/`.
    fn create_text_file(&self, rel_path: &str, content: &str) {
        self.create_file(rel_path, content.as_bytes());
    }

    /// Create a directory relative to the fixture base.
    fn create_dir(&self, rel_path: &str) -> PathBuf {
        let dir_path = self.base().join(rel_path);
        fs::create_dir_all(&dir_path).expect("Failed to create directory");
        dir_path
    }

    /// Write an empty config file so tests never pick up user settings.
    fn config(&self) -> PathBuf {
        let path = self.base().join("dirsnap.toml");
        if !path.exists() {
            fs::write(&path, "").expect("Failed to write config");
        }
        path
    }

    fn run(&self, command: SnapCommand) -> Outcome {
        run_cli_with_config(&command, &self.proj(), Some(&self.config()), &AssumeYes)
    }

    /// Assert that a file exists at the given path relative to the fixture base.
    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.base().join(rel_path);
        assert!(
            path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    /// Assert that nothing exists at the given path relative to the fixture base.
    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.base().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    /// List all files below `dir` recursively.
    fn list_files_recursive(dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(dir, &mut files);
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }
}

/// The `File:` header lines of a report, in order.
fn file_headers(report: &str) -> Vec<String> {
    report
        .lines()
        .filter_map(|line| line.strip_prefix("File: "))
        .map(str::to_string)
        .collect()
}

/// The tree listing section of a report (between the first line and the first blank line).
fn listing_section(report: &str) -> Vec<String> {
    report
        .lines()
        .skip(1)
        .take_while(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Test Suite 1: Single-File Report
// ============================================================================

#[test]
fn test_report_scenario_structure_and_order() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "first file\n");
    fixture.create_text_file("sub/b.py", "def b():\n    pass\n");
    let out = fixture.create_dir("out");

    let outcome = fixture.run(SnapCommand::new(Mode::Single, out.clone(), false));

    assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
    fixture.assert_file_exists("out/project_summary.txt");

    let report = fs::read_to_string(out.join("project_summary.txt")).unwrap();
    assert!(report.starts_with("Project File Structure:\n"));
    assert_eq!(
        listing_section(&report),
        vec!["proj/", "    a.txt", "    sub/", "        b.py"]
    );

    let root = fixture.canonical_proj();
    assert_eq!(
        file_headers(&report),
        vec![
            root.join("a.txt").display().to_string(),
            root.join("sub/b.py").display().to_string(),
        ]
    );
    assert!(report.contains(&format!("{}\nfirst file\n", "=".repeat(80))));
    assert!(report.contains("def b():\n    pass\n"));
}

#[test]
fn test_report_is_byte_identical_across_runs() {
    let fixture = TestFixture::new();
    fixture.create_text_file("README.md", "# Title\n");
    fixture.create_text_file("src/main.rs", "fn main() {}\n");
    fixture.create_text_file("src/util/mod.rs", "pub mod x;\n");
    fixture.create_text_file("docs/guide.txt", "guide");

    let first = fixture.base().join("first.txt");
    let second = fixture.base().join("second.txt");
    serialize(&fixture.proj(), &first).expect("First run failed");
    serialize(&fixture.proj(), &second).expect("Second run failed");

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_listed_files_match_headers_in_order() {
    let fixture = TestFixture::new();
    fixture.create_text_file("z.txt", "z");
    fixture.create_text_file("a/y.txt", "y");
    fixture.create_text_file("a/b/x.txt", "x");
    fixture.create_text_file("c/w.txt", "w");
    fixture.create_text_file("m.txt", "m");
    let report_path = fixture.base().join("report.txt");

    serialize(&fixture.proj(), &report_path).expect("Failed to serialize");
    let report = fs::read_to_string(&report_path).unwrap();

    let listed_files: Vec<String> = listing_section(&report)
        .into_iter()
        .filter(|line| !line.ends_with('/'))
        .map(|line| line.trim_start().to_string())
        .collect();
    let header_names: Vec<String> = file_headers(&report)
        .iter()
        .map(|h| {
            Path::new(h)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string()
        })
        .collect();

    assert_eq!(listed_files, header_names);
    assert_eq!(listed_files, vec!["m.txt", "z.txt", "y.txt", "x.txt", "w.txt"]);
}

#[test]
fn test_report_output_inside_project_is_excluded() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("exports/old/previous.txt", "previous report");
    let exports = fixture.proj().join("exports");

    let outcome = fixture.run(SnapCommand::new(Mode::Single, exports.clone(), false));
    assert!(outcome.is_success());

    let report = fs::read_to_string(exports.join("project_summary.txt")).unwrap();
    let excluded = fs::canonicalize(&exports).unwrap();

    assert!(listing_section(&report).iter().all(|l| !l.contains("exports")));
    assert!(
        file_headers(&report)
            .iter()
            .all(|h| !Path::new(h).starts_with(&excluded))
    );
    assert!(!report.contains("previous report"));
}

#[test]
fn test_report_with_undecodable_file() {
    let fixture = TestFixture::new();
    fixture.create_text_file("good.txt", "readable content");
    fixture.create_file("image.png", &[0x89, 0x50, 0x4E, 0x47, 0xFF, 0xFE, 0x00]);
    let report_path = fixture.base().join("report.txt");

    let summary = serialize(&fixture.proj(), &report_path).expect("Failed to serialize");
    let report = fs::read_to_string(&report_path).unwrap();

    assert_eq!(summary.read_errors, 1);
    assert!(report.contains("Error reading file: "));
    assert!(report.contains("readable content"));
}

#[cfg(unix)]
#[test]
fn test_report_with_permission_denied_file() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new();
    fixture.create_text_file("open.txt", "visible");
    fixture.create_text_file("locked.txt", "secret");
    let locked = fixture.proj().join("locked.txt");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read it anyway; nothing to check then.
    if fs::read(&locked).is_ok() {
        return;
    }

    let report_path = fixture.base().join("report.txt");
    let summary = serialize(&fixture.proj(), &report_path).expect("Failed to serialize");
    let report = fs::read_to_string(&report_path).unwrap();

    assert_eq!(summary.read_errors, 1);
    assert_eq!(summary.files_written, 2);
    assert!(report.contains("Error reading file: "));
    assert!(report.contains("visible"));
    assert!(!report.contains("secret"));
}

#[test]
fn test_custom_report_name_from_config() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    let config = fixture.base().join("custom.toml");
    fs::write(&config, "[report]\nfile_name = \"snapshot.txt\"\n").unwrap();
    let out = fixture.create_dir("out");

    let command = SnapCommand::new(Mode::Single, out, false);
    let outcome = run_cli_with_config(&command, &fixture.proj(), Some(&config), &AssumeYes);

    assert!(outcome.is_success());
    fixture.assert_file_exists("out/snapshot.txt");
    fixture.assert_not_exists("out/project_summary.txt");
}

#[test]
fn test_report_into_missing_directory_fails() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    let outcome = fixture.run(SnapCommand::new(
        Mode::Single,
        fixture.base().join("does/not/exist"),
        false,
    ));

    assert!(matches!(
        outcome,
        Outcome::Failure {
            kind: ErrorKind::OutputWrite,
            ..
        }
    ));
}

// ============================================================================
// Test Suite 2: Sorting by Extension
// ============================================================================

#[test]
fn test_sort_scenario() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "text");
    fixture.create_file("b.jpg", &[0xFF, 0xD8, 0xFF, 0xE0]);
    fixture.create_text_file("c", "no extension");
    let sorted = fixture.base().join("sorted");

    let outcome = fixture.run(SnapCommand::new(Mode::Separate, sorted.clone(), false));

    assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
    fixture.assert_file_exists("sorted/txt_files/a.txt");
    fixture.assert_file_exists("sorted/jpg_files/b.jpg");
    assert_eq!(
        TestFixture::list_files_recursive(&sorted),
        vec![
            sorted.join("jpg_files/b.jpg"),
            sorted.join("txt_files/a.txt"),
        ]
    );
}

#[test]
fn test_sorted_copies_are_byte_identical() {
    let fixture = TestFixture::new();
    let payloads: [(&str, &[u8]); 4] = [
        ("notes.md", b"# notes\n"),
        ("deep/nested/data.JSON", b"{\"k\": 1}"),
        ("deep/blob.bin", &[0, 1, 2, 3, 254, 255]),
        ("Archive.Tar.GZ", &[0x1f, 0x8b, 0x08]),
    ];
    for (name, content) in payloads {
        fixture.create_file(name, content);
    }
    let sorted = fixture.base().join("sorted");

    let report = organize(&fixture.proj(), &sorted).expect("Failed to organize");

    assert_eq!(report.copied, 4);
    for (name, content) in payloads {
        let file_name = Path::new(name).file_name().unwrap();
        let ext = Path::new(name)
            .extension()
            .unwrap()
            .to_string_lossy()
            .to_lowercase();
        let copy = sorted.join(format!("{}_files", ext)).join(file_name);
        assert_eq!(fs::read(&copy).unwrap(), content, "{}", copy.display());
        // Source untouched.
        assert_eq!(fs::read(fixture.proj().join(name)).unwrap(), content);
    }
}

#[test]
fn test_sort_skips_extensionless_files_without_error() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Makefile", "all:");
    fixture.create_text_file(".gitignore", "target");
    fixture.create_text_file("bin/run", "#!/bin/sh");
    let sorted = fixture.base().join("sorted");

    let report = organize(&fixture.proj(), &sorted).expect("Failed to organize");

    assert_eq!(report.copied, 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.failed, 0);
    assert!(TestFixture::list_files_recursive(&sorted).is_empty());
}

#[test]
fn test_sort_merges_case_variants_into_one_bucket() {
    let fixture = TestFixture::new();
    fixture.create_text_file("upper.TXT", "1");
    fixture.create_text_file("lower.txt", "2");
    fixture.create_text_file("mixed.Txt", "3");
    let sorted = fixture.base().join("sorted");

    let report = organize(&fixture.proj(), &sorted).expect("Failed to organize");

    assert_eq!(report.buckets.len(), 1);
    assert_eq!(report.buckets.get("txt_files"), Some(&3));
    fixture.assert_file_exists("sorted/txt_files/upper.TXT");
}

#[test]
fn test_sort_same_name_overwrites() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a/readme.md", "from a");
    fixture.create_text_file("b/readme.md", "from b");
    let sorted = fixture.base().join("sorted");

    organize(&fixture.proj(), &sorted).expect("Failed to organize");

    // Walk order is a/ then b/, so b's copy lands last.
    assert_eq!(
        fs::read_to_string(sorted.join("md_files/readme.md")).unwrap(),
        "from b"
    );
    assert_eq!(TestFixture::list_files_recursive(&sorted).len(), 1);
}

#[test]
fn test_sort_output_inside_project_never_recurses() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("src/lib.rs", "lib");
    let sorted = fixture.proj().join("sorted");

    for _ in 0..3 {
        let outcome = fixture.run(SnapCommand::new(Mode::Separate, sorted.clone(), false));
        assert!(outcome.is_success());
    }

    assert_eq!(
        TestFixture::list_files_recursive(&sorted),
        vec![sorted.join("rs_files/lib.rs"), sorted.join("txt_files/a.txt")]
    );
}

#[test]
fn test_sort_continues_after_copy_failure() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("b.txt", "b");
    fixture.create_text_file("c.toml", "c");
    let sorted = fixture.create_dir("sorted");
    fs::write(sorted.join("txt_files"), "not a directory").unwrap();

    let outcome = fixture.run(SnapCommand::new(Mode::Separate, sorted.clone(), false));

    assert!(outcome.is_success());
    fixture.assert_file_exists("sorted/toml_files/c.toml");
    assert!(sorted.join("txt_files").is_file());
}

// ============================================================================
// Test Suite 3: Dry-Run Mode
// ============================================================================

#[test]
fn test_dry_run_single_writes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    let out = fixture.create_dir("out");

    let outcome = fixture.run(SnapCommand::new(Mode::Single, out.clone(), true));

    assert!(outcome.is_success());
    fixture.assert_not_exists("out/project_summary.txt");
}

#[test]
fn test_dry_run_separate_creates_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("b.rs", "b");

    let outcome = fixture.run(SnapCommand::new(
        Mode::Separate,
        fixture.base().join("sorted"),
        true,
    ));

    assert!(outcome.is_success());
    fixture.assert_not_exists("sorted");
}

// ============================================================================
// Test Suite 4: Edge Cases and Error Scenarios
// ============================================================================

#[test]
fn test_missing_source_fails_before_any_output() {
    let fixture = TestFixture::new();
    let missing = fixture.base().join("missing");
    let sorted = fixture.base().join("sorted");

    let command = SnapCommand::new(Mode::Separate, sorted, false);
    let outcome = run_cli_with_config(&command, &missing, Some(&fixture.config()), &AssumeYes);

    assert!(matches!(
        outcome,
        Outcome::Failure {
            kind: ErrorKind::InvalidSourceDirectory,
            ..
        }
    ));
    fixture.assert_not_exists("sorted");

    let report_path = fixture.base().join("report.txt");
    let result = serialize(&missing, &report_path);
    assert!(matches!(
        result,
        Err(SnapError::InvalidSourceDirectory { .. })
    ));
    fixture.assert_not_exists("report.txt");
}

#[test]
fn test_source_that_is_a_file_is_rejected() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    let result = organize(&fixture.proj().join("a.txt"), &fixture.base().join("sorted"));

    assert!(matches!(
        result.map_err(|e| e.kind()),
        Err(ErrorKind::InvalidSourceDirectory)
    ));
    fixture.assert_not_exists("sorted");
}

#[test]
fn test_empty_project() {
    let fixture = TestFixture::new();
    let report_path = fixture.base().join("report.txt");

    let summary = serialize(&fixture.proj(), &report_path).expect("Failed to serialize");
    let report = fs::read_to_string(&report_path).unwrap();
    let sort = organize(&fixture.proj(), &fixture.base().join("sorted")).unwrap();

    assert_eq!(summary.files_written, 0);
    assert_eq!(report, "Project File Structure:\nproj/\n\n");
    assert_eq!(sort.total_seen(), 0);
    fixture.assert_not_exists("sorted/txt_files");
}
