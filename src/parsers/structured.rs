// Reader for `sadf -j` documents.
//
// Only the first host of a document is read. sadf writes one host per binary log, and a
// multi-host document is treated as its first host rather than merged.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{DomainRules, Target, parse_structured_timestamp};
use crate::error::{Result, SarError};
use crate::models::{Metric, NormalizedTable, SourceFormat, TableBuilder};

pub(crate) type Entry = Map<String, Value>;

#[derive(Debug, Deserialize)]
struct Document {
    sysstat: Sysstat,
}

#[derive(Debug, Deserialize)]
struct Sysstat {
    #[serde(default)]
    hosts: Vec<Host>,
}

#[derive(Debug, Deserialize)]
struct Host {
    #[serde(rename = "file-date", default)]
    file_date: Option<String>,
    #[serde(default)]
    statistics: Vec<Statistics>,
}

#[derive(Debug, Deserialize)]
struct Statistics {
    timestamp: Option<SampleTime>,
    #[serde(flatten)]
    activities: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SampleTime {
    date: String,
    time: String,
}

/// `file-date` of the first host, if the text is a structured document that carries one.
pub fn file_date(text: &str) -> Option<String> {
    let doc: Document = serde_json::from_str(text).ok()?;
    doc.sysstat.hosts.into_iter().next()?.file_date
}

/// Shared structured path: for every statistics record, `entries` picks the per-dimension
/// objects (or the single host-global object) and each becomes one row.
pub(crate) fn parse(
    text: &str,
    rules: &DomainRules,
    entries: fn(&Map<String, Value>) -> Vec<&Entry>,
) -> Result<NormalizedTable> {
    let domain = rules.domain;
    let fail = |reason: String| SarError::malformed(domain, SourceFormat::Structured, reason);

    let doc: Document = serde_json::from_str(text).map_err(|e| fail(e.to_string()))?;
    let host = doc
        .sysstat
        .hosts
        .into_iter()
        .next()
        .ok_or_else(|| fail("document has no hosts".into()))?;

    let mut builder = TableBuilder::new(domain, SourceFormat::Structured);
    let keyed = domain.key_column().is_some();
    for (i, stat) in host.statistics.iter().enumerate() {
        let Some(when) = &stat.timestamp else {
            return Err(fail(format!("statistics[{i}] has no timestamp")));
        };
        let timestamp = parse_structured_timestamp(&when.date, &when.time).map_err(&fail)?;

        for entry in entries(&stat.activities) {
            let mut key = None;
            let mut cells = vec![None; builder.width()];
            for (raw, value) in entry {
                match rules.resolve(raw) {
                    Some(Target::Key) => {
                        if key.is_none() || rules.key_aliases.first() == Some(&raw.as_str()) {
                            key = Some(key_text(value));
                        }
                    }
                    Some(Target::Metric { index, scale }) => {
                        let spec = builder
                            .schema()
                            .metric_fields()
                            .nth(index)
                            .copied()
                            .ok_or_else(|| fail(format!("no metric #{index}")))?;
                        if let Some(m) = spec.parse_json(value).map_err(&fail)? {
                            builder.declare(index);
                            cells[index] = Some(Metric::scaled(m, scale));
                        }
                    }
                    None => {}
                }
            }
            let key = match (keyed, key) {
                (true, Some(k)) => Some((rules.normalize_key)(k)),
                (true, None) => {
                    return Err(fail(format!(
                        "statistics[{i}] has an entry without `{}`",
                        rules.key_aliases.first().copied().unwrap_or("key")
                    )));
                }
                (false, _) => None,
            };
            builder.push(timestamp, key, cells);
        }
    }
    builder.finish()
}

fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Entries of an array-valued activity, e.g. `disk`.
pub(crate) fn array_entries<'a>(activities: &'a Map<String, Value>, name: &str) -> Vec<&'a Entry> {
    activities
        .get(name)
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}
