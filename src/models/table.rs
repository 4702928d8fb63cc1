// Normalized per-domain tables

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::domain::{Domain, SourceFormat};
use super::schema::DomainSchema;
use crate::error::{Result, SarError};

/// Rendering of timestamps in JSON records and CSV exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Float(f64),
    Int(i64),
}

impl Metric {
    pub fn as_f64(self) -> f64 {
        match self {
            Metric::Float(v) => v,
            Metric::Int(v) => v as f64,
        }
    }

    pub(crate) fn scaled(self, factor: f64) -> Metric {
        if factor == 1.0 {
            self
        } else {
            Metric::Float(self.as_f64() * factor)
        }
    }

    fn to_json(self) -> Value {
        match self {
            Metric::Float(v) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Metric::Int(v) => Value::from(v),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            Metric::Float(v) => serializer.serialize_f64(v),
            Metric::Int(v) => serializer.serialize_i64(v),
        }
    }
}

/// One sample of one entity. `values` is aligned with `NormalizedTable::metric_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub timestamp: NaiveDateTime,
    pub key: Option<String>,
    pub values: Vec<Option<Metric>>,
}

/// Rows of one domain from one source. The column set depends only on which schema fields the
/// source carried, never on the source format.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    domain: Domain,
    metrics: Vec<&'static str>,
    rows: Vec<Row>,
}

impl NormalizedTable {
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// All column names in contract order: `timestamp`, key (if any), metrics.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut out = vec!["timestamp"];
        out.extend(self.domain.key_column());
        out.extend(self.metrics.iter().copied());
        out
    }

    pub fn metric_columns(&self) -> &[&'static str] {
        &self.metrics
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns().contains(&name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Metric cell at `row` for `column`; `None` for unknown columns or missing cells.
    pub fn value(&self, row: usize, column: &str) -> Option<Metric> {
        let idx = self.metrics.iter().position(|m| *m == column)?;
        self.rows.get(row)?.values.get(idx).copied().flatten()
    }

    /// All values of one metric column, in row order.
    pub fn column(&self, column: &str) -> Option<Vec<Option<Metric>>> {
        let idx = self.metrics.iter().position(|m| *m == column)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Distinct dimension keys: `all` first, then numeric ids by value, then names.
    pub fn keys(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().filter_map(|r| r.key.as_deref()).collect();
        let mut keys: Vec<String> = set.into_iter().map(str::to_string).collect();
        keys.sort_by(|a, b| key_order(a, b));
        keys
    }

    /// Copy of this table restricted to rows whose key is in `wanted`. Tables without a
    /// dimension key, and an empty `wanted`, are returned unchanged.
    pub fn with_keys<S: AsRef<str>>(&self, wanted: &[S]) -> NormalizedTable {
        if wanted.is_empty() || self.domain.key_column().is_none() {
            return self.clone();
        }
        let rows = self
            .rows
            .iter()
            .filter(|r| {
                r.key
                    .as_deref()
                    .is_some_and(|k| wanted.iter().any(|w| w.as_ref() == k))
            })
            .cloned()
            .collect();
        NormalizedTable {
            domain: self.domain,
            metrics: self.metrics.clone(),
            rows,
        }
    }

    /// Rows as JSON objects keyed by column name; missing cells are `null`.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        let key_column = self.domain.key_column();
        self.rows
            .iter()
            .map(|row| {
                let mut rec = Map::new();
                rec.insert(
                    "timestamp".into(),
                    Value::String(row.timestamp.format(TIMESTAMP_FORMAT).to_string()),
                );
                if let (Some(name), Some(key)) = (key_column, &row.key) {
                    rec.insert(name.into(), Value::String(key.clone()));
                }
                for (name, value) in self.metrics.iter().zip(&row.values) {
                    rec.insert(
                        (*name).into(),
                        value.map(Metric::to_json).unwrap_or(Value::Null),
                    );
                }
                rec
            })
            .collect()
    }

    /// Comma-separated export in bundle form, readable by `bundle::parse_bundle`.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.columns()).map_err(csv_io)?;
        for row in &self.rows {
            let mut record = vec![row.timestamp.format(TIMESTAMP_FORMAT).to_string()];
            record.extend(row.key.clone());
            record.extend(row.values.iter().map(|v| match v {
                Some(Metric::Float(f)) => f.to_string(),
                Some(Metric::Int(i)) => i.to_string(),
                None => String::new(),
            }));
            writer.write_record(&record).map_err(csv_io)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SarError::Io(std::io::Error::other(e.to_string())))?;
        String::from_utf8(bytes).map_err(|e| SarError::Io(std::io::Error::other(e)))
    }
}

fn csv_io(e: csv::Error) -> SarError {
    SarError::Io(std::io::Error::other(e))
}

fn key_order(a: &str, b: &str) -> Ordering {
    let rank = |k: &str| match (k, k.parse::<i64>()) {
        ("all", _) => (0, 0),
        (_, Ok(n)) => (1, n),
        _ => (2, 0),
    };
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

/// Accumulates rows against a domain schema and yields a validated table.
///
/// Metric cells are indexed by position in `DomainSchema::metric_fields`. A metric becomes a
/// column once it is declared: sadf readers declare a metric when some row has a value for it,
/// in either format, and the bundle reader declares its header.
pub(crate) struct TableBuilder {
    schema: &'static DomainSchema,
    format: SourceFormat,
    present: Vec<bool>,
    rows: Vec<Row>,
}

impl TableBuilder {
    pub(crate) fn new(domain: Domain, format: SourceFormat) -> Self {
        let schema = domain.schema();
        Self {
            schema,
            format,
            present: vec![false; schema.metric_fields().count()],
            rows: Vec::new(),
        }
    }

    pub(crate) fn schema(&self) -> &'static DomainSchema {
        self.schema
    }

    pub(crate) fn width(&self) -> usize {
        self.present.len()
    }

    pub(crate) fn declare(&mut self, metric: usize) {
        self.present[metric] = true;
    }

    /// `cells` must be `width()` long.
    pub(crate) fn push(
        &mut self,
        timestamp: NaiveDateTime,
        key: Option<String>,
        cells: Vec<Option<Metric>>,
    ) {
        self.rows.push(Row {
            timestamp,
            key,
            values: cells,
        });
    }

    pub(crate) fn finish(self) -> Result<NormalizedTable> {
        let keep: Vec<usize> = (0..self.present.len())
            .filter(|i| self.present[*i])
            .collect();
        let metrics = self
            .schema
            .metric_fields()
            .enumerate()
            .filter(|(i, _)| self.present[*i])
            .map(|(_, f)| f.name)
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| Row {
                values: keep
                    .iter()
                    .map(|i| row.values.get(*i).copied().flatten())
                    .collect(),
                ..row
            })
            .collect();
        let table = NormalizedTable {
            domain: self.schema.domain,
            metrics,
            rows,
        };
        self.schema.validate(&table, self.format)?;
        Ok(table)
    }
}
