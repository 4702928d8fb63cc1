// Domain parsers: sadf structured/flat text → normalized tables.
//
// Each domain module declares its column rules (`DomainRules`) and, for structured input, where
// its entries live in a statistics record. The shared `structured` and `flat` readers do the
// rest, so both paths of a domain resolve raw names through the same table.

pub mod cpu;
pub mod disk;
pub mod filesystem;
mod flat;
pub mod memory;
pub mod network;
pub mod structured;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::converter::Converted;
use crate::error::Result;
use crate::models::{Domain, NormalizedTable};

/// Raw column name → normalized name, with a unit factor applied to the value.
#[derive(Debug, Clone, Copy)]
pub struct Rename {
    pub from: &'static str,
    pub to: &'static str,
    pub scale: f64,
}

pub(crate) const fn rename(from: &'static str, to: &'static str) -> Rename {
    Rename {
        from,
        to,
        scale: 1.0,
    }
}

/// 512-byte sectors → kilobytes.
pub(crate) const SECTORS_TO_KB: f64 = 0.5;

pub(crate) const fn rescale(from: &'static str, to: &'static str, scale: f64) -> Rename {
    Rename { from, to, scale }
}

/// What a raw column becomes in the normalized table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Target {
    Key,
    Metric { index: usize, scale: f64 },
}

pub(crate) struct DomainRules {
    pub domain: Domain,
    /// Raw names of the dimension key, in order of preference.
    pub key_aliases: &'static [&'static str],
    /// Renames layered on top of `normalize_field_name`, covering both formats.
    pub renames: &'static [Rename],
    pub normalize_key: fn(String) -> String,
}

impl DomainRules {
    pub(crate) fn resolve(&self, raw: &str) -> Option<Target> {
        if self.key_aliases.contains(&raw) {
            return Some(Target::Key);
        }
        let (name, scale) = match self.renames.iter().find(|r| r.from == raw) {
            Some(r) => (r.to.to_string(), r.scale),
            None => (normalize_field_name(raw), 1.0),
        };
        self.domain
            .schema()
            .metric_index(&name)
            .map(|index| Target::Metric { index, scale })
    }
}

pub(crate) fn keep_key(key: String) -> String {
    key
}

fn rules(domain: Domain) -> &'static DomainRules {
    match domain {
        Domain::Cpu => &cpu::RULES,
        Domain::Memory => &memory::RULES,
        Domain::Disk => &disk::RULES,
        Domain::Network => &network::RULES,
        Domain::Filesystem => &filesystem::RULES,
    }
}

/// Generic sadf field-name rule: `-percent` → `_pct`, then every `-` → `_`.
pub fn normalize_field_name(raw: &str) -> String {
    raw.replace("-percent", "_pct").replace('-', "_")
}

/// Normalized column name for a raw sadf column of `domain`, or `None` when the column is not
/// part of the domain's contract. Already-normalized names map to themselves.
pub fn normalize_column(domain: Domain, raw: &str) -> Option<&'static str> {
    match rules(domain).resolve(raw)? {
        Target::Key => domain.key_column(),
        Target::Metric { index, .. } => domain.schema().metric_fields().nth(index).map(|f| f.name),
    }
}

/// Route converter output to the parser of `domain`.
pub fn load(domain: Domain, converted: &Converted) -> Result<NormalizedTable> {
    match domain {
        Domain::Cpu => cpu::load(converted),
        Domain::Memory => memory::load(converted),
        Domain::Disk => disk::load(converted),
        Domain::Network => network::load(converted),
        Domain::Filesystem => filesystem::load(converted),
    }
}

/// Structured timestamps: separate `date` (`YYYY-MM-DD`) and `time` (`HH:MM:SS`) fields in UTC.
pub(crate) fn parse_structured_timestamp(
    date: &str,
    time: &str,
) -> std::result::Result<NaiveDateTime, String> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("bad date {date:?}: {e}"))?;
    let time = chrono::NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
        .map_err(|e| format!("bad time {time:?}: {e}"))?;
    Ok(date.and_time(time))
}

/// Flat timestamps: `YYYY-MM-DD HH:MM:SS [zone]`, converted to UTC with the zone dropped.
/// The zone may be absent, `UTC`/`GMT`/`Z`, or a numeric offset such as `+0100`.
pub(crate) fn parse_flat_timestamp(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    let mut parts = raw.split_whitespace();
    let (Some(date), Some(time)) = (parts.next(), parts.next()) else {
        return Err(format!("bad timestamp {raw:?}"));
    };
    let local = parse_naive_timestamp(&format!("{date} {time}"))
        .ok_or_else(|| format!("bad timestamp {raw:?}"))?;
    let offset = match parts.next() {
        None => 0,
        Some(zone) => zone_offset_secs(zone).ok_or_else(|| format!("unsupported zone {zone:?}"))?,
    };
    if parts.next().is_some() {
        return Err(format!("bad timestamp {raw:?}"));
    }
    Ok(local - Duration::seconds(offset))
}

/// Naive timestamp as written by exports: space or `T` separator, optional fraction.
pub(crate) fn parse_naive_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn zone_offset_secs(zone: &str) -> Option<i64> {
    let zone = zone
        .strip_prefix("UTC")
        .or_else(|| zone.strip_prefix("GMT"))
        .unwrap_or(zone);
    if zone.is_empty() || zone == "Z" {
        return Some(0);
    }
    let (sign, digits) = match zone.as_bytes()[0] {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i64 = digits[..2].parse().ok()?;
    let minutes: i64 = digits[2..].parse().ok()?;
    Some(sign * (hours * 3600 + minutes * 60))
}
