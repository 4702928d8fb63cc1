// Log tree discovery

mod common;

use common::write_logs_tree;
use sarview::SarError;
use sarview::logs::{self, BUNDLE_DIR, DatedPath};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_list_log_dirs_skips_hidden_and_files() {
    let root = TempDir::new().unwrap();
    write_logs_tree(root.path());
    fs::write(root.path().join("README"), "x").unwrap();
    assert_eq!(
        logs::list_log_dirs(root.path()).unwrap(),
        vec!["host-a", "host-b"]
    );
}

#[test]
fn test_missing_root_lists_nothing() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("nope");
    assert!(logs::list_log_dirs(&missing).unwrap().is_empty());
}

#[test]
fn test_bundle_dates_require_a_date_name() {
    let root = TempDir::new().unwrap();
    write_logs_tree(root.path());
    let csv = root.path().join("host-a").join(BUNDLE_DIR);
    fs::create_dir_all(csv.join("latest")).unwrap();
    fs::create_dir_all(csv.join("2025-01-01")).unwrap();
    fs::write(csv.join("2025-01-03"), "not a dir").unwrap();

    let index = logs::index_bundle_dates(&root.path().join("host-a")).unwrap();
    assert_eq!(logs::dates(&index), vec!["2025-01-01", "2025-01-02"]);
    assert_eq!(index[1].path, csv.join("2025-01-02"));
}

#[test]
fn test_has_bundle_needs_a_cpu_file() {
    let root = TempDir::new().unwrap();
    write_logs_tree(root.path());
    assert!(logs::has_bundle(&root.path().join("host-a")));
    assert!(!logs::has_bundle(&root.path().join("host-b")));

    let c = root.path().join("host-c").join(BUNDLE_DIR).join("2025-01-05");
    fs::create_dir_all(&c).unwrap();
    fs::write(c.join("memory.csv"), "timestamp,memfree\n").unwrap();
    assert!(!logs::has_bundle(&root.path().join("host-c")));
}

#[test]
fn test_sar_files_by_name_header_or_fallback() {
    let dir = TempDir::new().unwrap();
    for name in ["sa20250102", "sa20250101", "with-header", "no-header", "broken"] {
        fs::write(dir.path().join(name), "bin").unwrap();
    }
    fs::create_dir_all(dir.path().join("csv")).unwrap();

    let mut asked = Vec::new();
    let index = logs::index_sar_files(dir.path(), |path: &Path| {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        asked.push(name.clone());
        match name.as_str() {
            "with-header" => Ok(Some("2024-12-31".to_string())),
            "no-header" => Ok(None),
            _ => Err(SarError::ExternalToolFailure {
                invocation: "sadf -d".into(),
                diagnostic: "Invalid system activity file".into(),
            }),
        }
    })
    .unwrap();

    let dates: Vec<_> = index.iter().map(|d: &DatedPath| d.date.as_str()).collect();
    assert_eq!(
        dates,
        vec!["no-header", "2025-01-01", "2025-01-02", "2024-12-31"]
    );
    asked.sort();
    assert_eq!(asked, vec!["broken", "no-header", "with-header"]);
}
