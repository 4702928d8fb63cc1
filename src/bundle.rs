// CSV bundles: pre-normalized per-domain files under a dated directory
//
// A bundle is `<dir>/cpu.csv`, `<dir>/memory.csv`, ... written with normalized column names.
// Loading one skips the converter entirely but yields the same table shape.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, SarError};
use crate::models::{Domain, FieldKind, NormalizedTable, SourceFormat, TableBuilder};
use crate::parsers::parse_naive_timestamp;

pub fn bundle_path(date_dir: &Path, domain: Domain) -> PathBuf {
    date_dir.join(domain.bundle_file())
}

/// Read the `domain` file of a dated bundle directory.
///
/// A missing file is `MissingBundleFile`, never an empty table; a file with a header and no
/// rows is an empty table.
pub fn load_bundle(date_dir: &Path, domain: Domain) -> Result<NormalizedTable> {
    let path = bundle_path(date_dir, domain);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SarError::MissingBundleFile { domain, path });
        }
        Err(e) => return Err(e.into()),
    };
    parse_bundle(&text, domain)
}

/// Parse bundle text. Columns are matched by exact normalized name. Columns outside the domain
/// schema are dropped from the table (and logged at debug level), so a bundle yields the same
/// shape as a sadf source. Only `timestamp` is reinterpreted, as a naive datetime with no zone
/// handling.
pub fn parse_bundle(text: &str, domain: Domain) -> Result<NormalizedTable> {
    let fail = |reason: String| SarError::malformed(domain, SourceFormat::Bundle, reason);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers().map_err(|e| fail(e.to_string()))?.clone();

    let mut builder = TableBuilder::new(domain, SourceFormat::Bundle);
    let schema = builder.schema();
    let mut timestamp_col = None;
    let mut key_col = None;
    let mut metric_cols = Vec::new();
    let mut ignored = Vec::new();
    for (col, name) in headers.iter().enumerate() {
        match schema.field(name).map(|f| f.kind) {
            Some(FieldKind::Timestamp) => {
                timestamp_col.get_or_insert(col);
            }
            Some(FieldKind::Key) => {
                key_col.get_or_insert(col);
            }
            Some(_) => {
                if let Some(index) = schema.metric_index(name) {
                    builder.declare(index);
                    metric_cols.push((col, index));
                }
            }
            None => ignored.push(name.to_string()),
        }
    }
    if !ignored.is_empty() {
        tracing::debug!(%domain, ?ignored, "ignoring bundle columns outside the schema");
    }
    let timestamp_col = timestamp_col.ok_or_else(|| fail("no `timestamp` column".into()))?;
    if let Some(key) = domain.key_column()
        && key_col.is_none()
    {
        return Err(fail(format!("no `{key}` column")));
    }

    let specs: Vec<_> = schema.metric_fields().copied().collect();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| fail(e.to_string()))?;
        let field = |col: usize| record.get(col).unwrap_or("");
        let raw_ts = field(timestamp_col);
        let timestamp = parse_naive_timestamp(raw_ts)
            .ok_or_else(|| fail(format!("record {}: bad timestamp {raw_ts:?}", line + 1)))?;
        let key = key_col.map(|col| field(col).to_string());
        let mut cells = vec![None; builder.width()];
        for (col, index) in &metric_cols {
            cells[*index] = specs[*index]
                .parse_text(field(*col))
                .map_err(|e| fail(format!("record {}: {e}", line + 1)))?;
        }
        builder.push(timestamp, key, cells);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;

    #[test]
    fn extra_columns_are_dropped_and_order_follows_the_schema() {
        let text = "idle,cpu,timestamp,user,steal\n\
                    90.0,all,2025-01-01 00:10:00,10.0,0.0\n";
        let table = parse_bundle(text, Domain::Cpu).unwrap();
        assert_eq!(table.columns(), vec!["timestamp", "cpu", "user", "idle"]);
        assert_eq!(table.value(0, "idle"), Some(Metric::Float(90.0)));
    }

    #[test]
    fn header_only_is_an_empty_table() {
        let table = parse_bundle("timestamp,memfree\n", Domain::Memory).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), vec!["timestamp", "memfree"]);
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let err = parse_bundle("timestamp,memfree\nyesterday,1\n", Domain::Memory).unwrap_err();
        assert!(matches!(
            err,
            SarError::MalformedInput {
                format: SourceFormat::Bundle,
                ..
            }
        ));
    }
}
