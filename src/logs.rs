// Discovery of log directories, SAR binaries and CSV bundle dates under the logs root
//
// Layout: `<root>/<dir>/saYYYYMMDD` (or any other file sadf accepts) for binaries and
// `<root>/<dir>/csv/YYYY-MM-DD/{cpu,memory,disk,network,fs}.csv` for bundles.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::SarError;
use crate::models::Domain;

/// Subdirectory of a log directory that holds dated CSV bundles.
pub const BUNDLE_DIR: &str = "csv";

const BUNDLE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A date label and the file or directory it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedPath {
    pub date: String,
    pub path: PathBuf,
}

/// Date labels of an index, in index order.
pub fn dates(index: &[DatedPath]) -> Vec<String> {
    index.iter().map(|d| d.date.clone()).collect()
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Ok(name) = entry.file_name().into_string() {
            out.push((name, entry.path()));
        }
    }
    out.sort();
    Ok(out)
}

/// Sorted names of the non-hidden subdirectories of `root`. A missing root lists nothing.
pub fn list_log_dirs(root: &Path) -> io::Result<Vec<String>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    Ok(sorted_entries(root)?
        .into_iter()
        .filter(|(name, path)| !name.starts_with('.') && path.is_dir())
        .map(|(name, _)| name)
        .collect())
}

fn is_bundle_date(name: &str) -> bool {
    name.len() == 10 && NaiveDate::parse_from_str(name, BUNDLE_DATE_FORMAT).is_ok()
}

/// Dated bundle directories under `<dir>/csv`, by date.
pub fn index_bundle_dates(dir: &Path) -> io::Result<Vec<DatedPath>> {
    let root = dir.join(BUNDLE_DIR);
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    Ok(sorted_entries(&root)?
        .into_iter()
        .filter(|(name, path)| is_bundle_date(name) && path.is_dir())
        .map(|(date, path)| DatedPath { date, path })
        .collect())
}

/// Whether `dir` holds at least one bundle date with a CPU file.
pub fn has_bundle(dir: &Path) -> bool {
    index_bundle_dates(dir).is_ok_and(|index| {
        index
            .iter()
            .any(|d| d.path.join(Domain::Cpu.bundle_file()).is_file())
    })
}

/// `saYYYYMMDD` → `YYYY-MM-DD`.
fn date_from_sa_name(name: &str) -> Option<String> {
    let digits = name.strip_prefix("sa")?;
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &digits[..4], &digits[4..6], &digits[6..]))
}

/// SAR binaries in `dir`, labelled by date.
///
/// `saYYYYMMDD` names give the date directly. Other files are passed to `file_date`; its
/// answer is used when it has one, the file name otherwise. Files for which `file_date` fails
/// are left out of the index.
pub fn index_sar_files<F>(dir: &Path, mut file_date: F) -> io::Result<Vec<DatedPath>>
where
    F: FnMut(&Path) -> Result<Option<String>, SarError>,
{
    let mut out = Vec::new();
    for (name, path) in sorted_entries(dir)? {
        if !path.is_file() {
            continue;
        }
        if let Some(date) = date_from_sa_name(&name) {
            out.push(DatedPath { date, path });
            continue;
        }
        match file_date(&path) {
            Ok(Some(date)) => out.push(DatedPath { date, path }),
            Ok(None) => out.push(DatedPath { date: name, path }),
            Err(_) => continue,
        }
    }
    Ok(out)
}
