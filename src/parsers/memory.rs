// Memory utilization (`sar -r`). Host-global: no dimension key.

use serde_json::{Map, Value};

use super::structured::{self, Entry};
use super::{DomainRules, flat, keep_key, rename};
use crate::converter::Converted;
use crate::error::Result;
use crate::models::{Domain, NormalizedTable};

pub(crate) static RULES: DomainRules = DomainRules {
    domain: Domain::Memory,
    key_aliases: &[],
    renames: &[
        rename("kbmemfree", "memfree"),
        rename("kbavail", "avail"),
        rename("kbmemused", "memused"),
        rename("%memused", "memused_pct"),
        rename("kbbuffers", "buffers"),
        rename("kbcached", "cached"),
        rename("kbcommit", "commit"),
        rename("%commit", "commit_pct"),
        rename("kbactive", "active"),
        rename("kbinact", "inactive"),
        rename("kbdirty", "dirty"),
    ],
    normalize_key: keep_key,
};

/// The `memory` object of a record; records without one (or with an empty one) yield no row.
fn entries(activities: &Map<String, Value>) -> Vec<&Entry> {
    activities
        .get("memory")
        .and_then(Value::as_object)
        .filter(|m| !m.is_empty())
        .into_iter()
        .collect()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;

    const FLAT: &str = "# hostname;interval;timestamp;kbmemfree;kbavail;kbmemused;%memused;kbbuffers;kbcached;kbcommit;%commit;kbactive;kbinact;kbdirty\n\
        host;600;2025-01-01 00:10:00 UTC;1024000;2048000;512000;33.33;1000;200000;300000;12.50;400000;100000;64\n";

    #[test]
    fn flat_restart_and_comment_records_are_skipped() {
        let text = "# hostname;interval;timestamp;kbmemfree;kbmemused;%memused\n\
            host;-1;2025-01-01 00:00:00 UTC;LINUX-RESTART\t(4 CPU)\n\
            host;600;2025-01-01 00:10:00 UTC;1024000;512000;33.33\n\
            host;-1;2025-01-01 00:15:00 UTC;COM some comment\n\
            host;600;2025-01-01 00:20:00 UTC;1000000;536000;34.90\n";
        let table = parse_flat(text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "memfree"), Some(Metric::Int(1_024_000)));
        assert_eq!(table.value(1, "memused_pct"), Some(Metric::Float(34.9)));
    }

    #[test]
    fn flat_columns_come_from_values_not_the_header() {
        let text = "# hostname;interval;timestamp;kbmemfree;kbdirty\n\
            host;600;2025-01-01 00:10:00 UTC;1024000;\n";
        let table = parse_flat(text).unwrap();
        assert!(table.has_column("memfree"));
        assert!(!table.has_column("dirty"));
    }

    #[test]
    fn flat_strips_kb_and_percent_prefixes() {
        let table = parse_flat(FLAT).unwrap();
        assert_eq!(table.len(), 1);
        for col in table.columns() {
            assert!(!col.starts_with("kb"), "residual kb column {col}");
            assert!(!col.starts_with('%'), "residual % column {col}");
        }
        assert_eq!(table.value(0, "memfree"), Some(Metric::Int(1_024_000)));
        assert_eq!(table.value(0, "memused_pct"), Some(Metric::Float(33.33)));
        assert_eq!(table.value(0, "inactive"), Some(Metric::Int(100_000)));
        assert_eq!(table.value(0, "dirty"), Some(Metric::Int(64)));
        assert!(table.rows()[0].key.is_none());
    }

    #[test]
    fn structured_percent_suffix_and_empty_records() {
        let text = r#"{"sysstat": {"hosts": [{"statistics": [
            {"timestamp": {"date": "2025-01-01", "time": "00:10:00"},
             "memory": {"memfree": 1024000, "avail": 2048000, "memused": 512000, "memused-percent": 33.33,
                        "buffers": 1000, "cached": 200000, "commit": 300000, "commit-percent": 12.5,
                        "active": 400000, "inactive": 100000, "dirty": 64, "anonpg": 5}},
            {"timestamp": {"date": "2025-01-01", "time": "00:20:00"}, "memory": {}},
            {"timestamp": {"date": "2025-01-01", "time": "00:30:00"}}
        ]}]}}"#;
        let table = parse_structured(text).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.has_column("memused_pct"));
        assert!(table.has_column("commit_pct"));
        assert!(!table.has_column("anonpg"));
        assert_eq!(table.value(0, "cached"), Some(Metric::Int(200_000)));
    }

    #[test]
    fn both_formats_yield_the_same_columns() {
        let text = r#"{"sysstat": {"hosts": [{"statistics": [
            {"timestamp": {"date": "2025-01-01", "time": "00:10:00"},
             "memory": {"memfree": 1024000, "avail": 2048000, "memused": 512000, "memused-percent": 33.33,
                        "buffers": 1000, "cached": 200000, "commit": 300000, "commit-percent": 12.5,
                        "active": 400000, "inactive": 100000, "dirty": 64}}
        ]}]}}"#;
        let structured = parse_structured(text).unwrap();
        let flat = parse_flat(FLAT).unwrap();
        assert_eq!(structured.columns(), flat.columns());
        assert_eq!(structured.rows()[0].timestamp, flat.rows()[0].timestamp);
    }
}
