// CPU utilization (`sar -u -P ALL`)

use serde_json::{Map, Value};

use super::structured::{self, Entry};
use super::{DomainRules, flat, rename};
use crate::converter::Converted;
use crate::error::Result;
use crate::models::{Domain, NormalizedTable};

/// Aggregate-row marker as emitted by sadf.
pub const RAW_AGGREGATE: &str = "-1";
/// Aggregate-row marker in normalized tables.
pub const AGGREGATE: &str = "all";

pub(crate) static RULES: DomainRules = DomainRules {
    domain: Domain::Cpu,
    key_aliases: &["cpu", "CPU"],
    renames: &[
        rename("%user", "user"),
        rename("%usr", "user"),
        rename("usr", "user"),
        rename("%system", "system"),
        rename("%sys", "system"),
        rename("sys", "system"),
        rename("%iowait", "iowait"),
        rename("%idle", "idle"),
    ],
    normalize_key: normalize_cpu,
};

/// `-1` is the all-CPU aggregate in both sadf formats and becomes `all`; every other id is kept.
pub fn normalize_cpu(raw: String) -> String {
    if raw.trim() == RAW_AGGREGATE {
        AGGREGATE.to_string()
    } else {
        raw
    }
}

fn entries(activities: &Map<String, Value>) -> Vec<&Entry> {
    let plain = structured::array_entries(activities, "cpu-load");
    if plain.is_empty() {
        structured::array_entries(activities, "cpu-load-all")
    } else {
        plain
    }
}

pub fn parse_structured(text: &str) -> Result<NormalizedTable> {
    structured::parse(text, &RULES, entries)
}

pub fn parse_flat(text: &str) -> Result<NormalizedTable> {
    flat::parse(text, &RULES)
}

pub fn load(converted: &Converted) -> Result<NormalizedTable> {
    match converted {
        Converted::Structured(text) => parse_structured(text),
        Converted::Flat(text) => parse_flat(text),
    }
}
