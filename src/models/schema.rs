// Per-domain column contract.
//
// Every table producer (structured parser, flat parser, bundle loader) builds toward these
// declarations through `TableBuilder`, which drops undeclared columns, orders the kept ones as
// declared here and validates the result before handing it out.

use serde::Serialize;
use serde_json::Value;

use super::domain::{Domain, SourceFormat};
use super::table::{Metric, NormalizedTable};
use crate::error::{Result, SarError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Timestamp,
    /// Dimension key (CPU id, device, interface, filesystem).
    Key,
    Float,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    None,
    Percent,
    Kilobytes,
    KilobytesPerSec,
    Megabytes,
    PerSec,
    Milliseconds,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub unit: Unit,
}

const fn field(name: &'static str, kind: FieldKind, unit: Unit) -> FieldSpec {
    FieldSpec { name, kind, unit }
}

const TIMESTAMP: FieldSpec = field("timestamp", FieldKind::Timestamp, Unit::None);

const fn key(name: &'static str) -> FieldSpec {
    field(name, FieldKind::Key, Unit::None)
}

const fn pct(name: &'static str) -> FieldSpec {
    field(name, FieldKind::Float, Unit::Percent)
}

const fn float(name: &'static str, unit: Unit) -> FieldSpec {
    field(name, FieldKind::Float, unit)
}

const fn int(name: &'static str, unit: Unit) -> FieldSpec {
    field(name, FieldKind::Integer, unit)
}

/// Ordered column declaration of one domain: `timestamp`, then the dimension key (if any),
/// then the metrics.
#[derive(Debug, Serialize)]
pub struct DomainSchema {
    pub domain: Domain,
    pub fields: &'static [FieldSpec],
}

pub static CPU: DomainSchema = DomainSchema {
    domain: Domain::Cpu,
    fields: &[
        TIMESTAMP,
        key("cpu"),
        pct("user"),
        pct("system"),
        pct("iowait"),
        pct("idle"),
    ],
};

pub static MEMORY: DomainSchema = DomainSchema {
    domain: Domain::Memory,
    fields: &[
        TIMESTAMP,
        int("memfree", Unit::Kilobytes),
        int("avail", Unit::Kilobytes),
        int("memused", Unit::Kilobytes),
        pct("memused_pct"),
        int("buffers", Unit::Kilobytes),
        int("cached", Unit::Kilobytes),
        int("commit", Unit::Kilobytes),
        pct("commit_pct"),
        int("active", Unit::Kilobytes),
        int("inactive", Unit::Kilobytes),
        int("dirty", Unit::Kilobytes),
    ],
};

pub static DISK: DomainSchema = DomainSchema {
    domain: Domain::Disk,
    fields: &[
        TIMESTAMP,
        key("dev"),
        float("tps", Unit::PerSec),
        float("rkB_s", Unit::KilobytesPerSec),
        float("wkB_s", Unit::KilobytesPerSec),
        float("dkB_s", Unit::KilobytesPerSec),
        float("areq_sz", Unit::Kilobytes),
        float("aqu_sz", Unit::None),
        float("await", Unit::Milliseconds),
        pct("util_pct"),
    ],
};

pub static NETWORK: DomainSchema = DomainSchema {
    domain: Domain::Network,
    fields: &[
        TIMESTAMP,
        key("iface"),
        float("rxpck_s", Unit::PerSec),
        float("txpck_s", Unit::PerSec),
        float("rxkB_s", Unit::KilobytesPerSec),
        float("txkB_s", Unit::KilobytesPerSec),
        float("rxcmp_s", Unit::PerSec),
        float("txcmp_s", Unit::PerSec),
        float("rxmcst_s", Unit::PerSec),
        pct("ifutil_pct"),
    ],
};

pub static FILESYSTEM: DomainSchema = DomainSchema {
    domain: Domain::Filesystem,
    fields: &[
        TIMESTAMP,
        key("filesystem"),
        float("mb_free", Unit::Megabytes),
        float("mb_used", Unit::Megabytes),
        pct("fsused_pct"),
        pct("ufsused_pct"),
        int("inodes_free", Unit::Count),
        int("inodes_used", Unit::Count),
        pct("inodes_used_pct"),
    ],
};

impl DomainSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn key_field(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.kind == FieldKind::Key)
    }

    pub fn metric_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Float | FieldKind::Integer))
    }

    /// Position of a metric among `metric_fields()`.
    pub fn metric_index(&self, name: &str) -> Option<usize> {
        self.metric_fields().position(|f| f.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Check that a table honors this contract: `timestamp` first, the key column next when the
    /// domain has one, then declared metrics in declared order; every row carries a key exactly
    /// when the domain has one and one cell per metric column.
    pub fn validate(&self, table: &NormalizedTable, format: SourceFormat) -> Result<()> {
        let fail = |reason: String| Err(SarError::malformed(self.domain, format, reason));
        if table.domain() != self.domain {
            return fail(format!("table belongs to {}", table.domain()));
        }
        let mut declared = self.metric_fields().map(|f| f.name);
        for name in table.metric_columns() {
            if !declared.any(|d| d == *name) {
                return fail(format!("column `{name}` is undeclared or out of order"));
            }
        }
        let keyed = self.key_field().is_some();
        let width = table.metric_columns().len();
        for (i, row) in table.rows().iter().enumerate() {
            if row.key.is_some() != keyed {
                return fail(format!("row {i} has an unexpected dimension key"));
            }
            if row.values.len() != width {
                return fail(format!(
                    "row {i} has {} cells for {width} columns",
                    row.values.len()
                ));
            }
        }
        Ok(())
    }
}

impl FieldSpec {
    /// Convert a text cell; empty cells are missing values.
    pub(crate) fn parse_text(&self, raw: &str) -> std::result::Result<Option<Metric>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let value: f64 = match self.kind {
            FieldKind::Integer => {
                if let Ok(v) = raw.parse::<i64>() {
                    return Ok(Some(Metric::Int(v)));
                }
                raw.parse()
                    .map_err(|_| format!("`{}`: not a number: {raw:?}", self.name))?
            }
            _ => raw
                .parse()
                .map_err(|_| format!("`{}`: not a number: {raw:?}", self.name))?,
        };
        self.from_f64(value).map(Some)
    }

    /// Convert a JSON value; `null` is a missing value.
    pub(crate) fn parse_json(&self, raw: &Value) -> std::result::Result<Option<Metric>, String> {
        match raw {
            Value::Null => Ok(None),
            Value::Number(n) => {
                if self.kind == FieldKind::Integer
                    && let Some(v) = n.as_i64()
                {
                    return Ok(Some(Metric::Int(v)));
                }
                let v = n
                    .as_f64()
                    .ok_or_else(|| format!("`{}`: number out of range", self.name))?;
                self.from_f64(v).map(Some)
            }
            Value::String(s) => self.parse_text(s),
            other => Err(format!("`{}`: expected a number, got {other}", self.name)),
        }
    }

    fn from_f64(&self, v: f64) -> std::result::Result<Metric, String> {
        match self.kind {
            FieldKind::Integer if v.fract() == 0.0 && v.is_finite() => Ok(Metric::Int(v as i64)),
            FieldKind::Integer => Err(format!("`{}`: expected an integer, got {v}", self.name)),
            _ => Ok(Metric::Float(v)),
        }
    }
}
