// Filesystem usage (`sar -F`). Keyed by filesystem device, or mount point when sadf was asked
// for `MOUNT` names.

use serde_json::{Map, Value};

use super::structured::{self, Entry};
use super::{DomainRules, flat, keep_key, rename};
use crate::converter::Converted;
use crate::error::Result;
use crate::models::{Domain, NormalizedTable};

pub(crate) static RULES: DomainRules = DomainRules {
    domain: Domain::Filesystem,
    key_aliases: &["filesystem", "FILESYSTEM", "mountpoint", "MOUNTPOINT"],
    renames: &[
        rename("MBfsfree", "mb_free"),
        rename("MBfsused", "mb_used"),
        rename("%fsused", "fsused_pct"),
        rename("%ufsused", "ufsused_pct"),
        rename("Ifree", "inodes_free"),
        rename("Iused", "inodes_used"),
        rename("%Iused", "inodes_used_pct"),
        rename("Iused-percent", "inodes_used_pct"),
    ],
    normalize_key: keep_key,
};

fn entries(activities: &Map<String, Value>) -> Vec<&Entry> {
    structured::array_entries(activities, "filesystems")
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
