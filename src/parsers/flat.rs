// Reader for `sadf -d` output: `;`-separated, one header row, `#` comment lines.
//
// sadf prints its header as a comment (`# hostname;interval;timestamp;...`). Such a line is taken
// as the header when no header has been seen yet; later copies of the header are skipped.
// Restart and comment records (`host;-1;<ts>;LINUX-RESTART ...`, `host;-1;<ts>;COM ...`) are
// shorter than the header and carry interval `-1`; they mark events, not samples, and are skipped.
// A metric becomes a column only once some record has a value for it.

use super::{DomainRules, Target, parse_flat_timestamp};
use crate::error::{Result, SarError};
use crate::models::{NormalizedTable, SourceFormat, TableBuilder};

const DELIMITER: u8 = b';';

/// `interval` of restart and comment records.
const EVENT_INTERVAL: &str = "-1";

/// Drop comments, blank lines and repeated headers; the first remaining line is the header.
fn clean(text: &str) -> Option<String> {
    let mut header: Option<&str> = None;
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            let body = comment.trim();
            if header.is_none() && body.split(';').any(|f| f.trim() == "timestamp") {
                header = Some(body);
                out.push_str(body);
                out.push('\n');
            }
            continue;
        }
        match header {
            None => header = Some(line),
            Some(h) if h.trim() == line.trim() => continue,
            Some(_) => {}
        }
        out.push_str(line);
        out.push('\n');
    }
    header.map(|_| out)
}

pub(crate) fn parse(text: &str, rules: &DomainRules) -> Result<NormalizedTable> {
    let domain = rules.domain;
    let fail = |reason: String| SarError::malformed(domain, SourceFormat::Flat, reason);

    let cleaned = clean(text).ok_or_else(|| fail("no header row".into()))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(cleaned.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| fail(e.to_string()))?
        .clone();

    let mut builder = TableBuilder::new(domain, SourceFormat::Flat);
    let mut timestamp_col = None;
    let mut interval_col = None;
    let mut key_col = None;
    let mut metric_cols = Vec::new();
    for (col, name) in headers.iter().enumerate() {
        if name == "timestamp" {
            timestamp_col.get_or_insert(col);
            continue;
        }
        if name == "interval" {
            interval_col.get_or_insert(col);
            continue;
        }
        match rules.resolve(name) {
            Some(Target::Key) => {
                key_col.get_or_insert(col);
            }
            Some(Target::Metric { index, scale }) => {
                let spec = builder
                    .schema()
                    .metric_fields()
                    .nth(index)
                    .copied()
                    .ok_or_else(|| fail(format!("no metric #{index}")))?;
                metric_cols.push((col, index, scale, spec));
            }
            None => {}
        }
    }
    let timestamp_col = timestamp_col.ok_or_else(|| fail("no `timestamp` column".into()))?;
    if domain.key_column().is_some() && key_col.is_none() {
        return Err(fail(format!(
            "no `{}` column",
            rules.key_aliases.first().copied().unwrap_or("key")
        )));
    }

    let width = headers.len();
    let mut skipped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| fail(e.to_string()))?;
        let field = |col: usize| record.get(col).unwrap_or("");
        if record.len() < width || interval_col.is_some_and(|col| field(col) == EVENT_INTERVAL) {
            skipped += 1;
            continue;
        }
        let timestamp = parse_flat_timestamp(field(timestamp_col))
            .map_err(|e| fail(format!("record {}: {e}", line + 1)))?;
        let key = key_col.map(|col| (rules.normalize_key)(field(col).to_string()));
        let mut cells = vec![None; builder.width()];
        for (col, index, scale, spec) in &metric_cols {
            let value = spec
                .parse_text(field(*col))
                .map_err(|e| fail(format!("record {}: {e}", line + 1)))?;
            if let Some(m) = value {
                builder.declare(*index);
                cells[*index] = Some(m.scaled(*scale));
            }
        }
        builder.push(timestamp, key, cells);
    }
    if skipped > 0 {
        tracing::debug!(%domain, skipped, "skipped restart and comment records");
    }
    builder.finish()
}
