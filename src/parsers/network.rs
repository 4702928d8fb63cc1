// Network interface traffic (`sar -n DEV`)

use serde_json::{Map, Value};

use super::structured::{self, Entry};
use super::{DomainRules, flat, keep_key, rename};
use crate::converter::Converted;
use crate::error::Result;
use crate::models::{Domain, NormalizedTable};

pub(crate) static RULES: DomainRules = DomainRules {
    domain: Domain::Network,
    key_aliases: &["iface", "IFACE"],
    renames: &[
        rename("rxpck/s", "rxpck_s"),
        rename("txpck/s", "txpck_s"),
        rename("rxkB/s", "rxkB_s"),
        rename("txkB/s", "txkB_s"),
        rename("rxcmp/s", "rxcmp_s"),
        rename("txcmp/s", "txcmp_s"),
        rename("rxmcst/s", "rxmcst_s"),
        rename("rxpck", "rxpck_s"),
        rename("txpck", "txpck_s"),
        rename("rxkB", "rxkB_s"),
        rename("txkB", "txkB_s"),
        rename("rxcmp", "rxcmp_s"),
        rename("txcmp", "txcmp_s"),
        rename("rxmcst", "rxmcst_s"),
        rename("%ifutil", "ifutil_pct"),
    ],
    normalize_key: keep_key,
};

/// Interfaces live one level down, under `network.net-dev`.
fn entries(activities: &Map<String, Value>) -> Vec<&Entry> {
    activities
        .get("network")
        .and_then(Value::as_object)
        .map(|network| structured::array_entries(network, "net-dev"))
        .unwrap_or_default()
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
