// Block device activity (`sar -d`)
//
// sysstat 12 reports kilobytes; sysstat 11 reports 512-byte sectors (`rd_sec/s`, `wr_sec/s`,
// `avgrq-sz`), which are converted here so both land in the same kB columns.

use serde_json::{Map, Value};

use super::structured::{self, Entry};
use super::{DomainRules, SECTORS_TO_KB, flat, keep_key, rename, rescale};
use crate::converter::Converted;
use crate::error::Result;
use crate::models::{Domain, NormalizedTable};

pub(crate) static RULES: DomainRules = DomainRules {
    domain: Domain::Disk,
    key_aliases: &["dev", "DEV", "disk-device"],
    renames: &[
        rename("%util", "util_pct"),
        rename("rkB/s", "rkB_s"),
        rename("wkB/s", "wkB_s"),
        rename("dkB/s", "dkB_s"),
        rename("rkB", "rkB_s"),
        rename("wkB", "wkB_s"),
        rename("dkB", "dkB_s"),
        rename("avgqu-sz", "aqu_sz"),
        rescale("rd_sec/s", "rkB_s", SECTORS_TO_KB),
        rescale("wr_sec/s", "wkB_s", SECTORS_TO_KB),
        rescale("rd_sec", "rkB_s", SECTORS_TO_KB),
        rescale("wr_sec", "wkB_s", SECTORS_TO_KB),
        rescale("avgrq-sz", "areq_sz", SECTORS_TO_KB),
    ],
    normalize_key: keep_key,
};

fn entries(activities: &Map<String, Value>) -> Vec<&Entry> {
    structured::array_entries(activities, "disk")
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
