// Metric domains and source formats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::schema::{self, DomainSchema};

/// One metric category of a SAR log. Serializes to lowercase JSON (e.g. "cpu").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Cpu,
    Memory,
    Disk,
    Network,
    #[serde(alias = "fs")]
    Filesystem,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Cpu,
        Domain::Memory,
        Domain::Disk,
        Domain::Network,
        Domain::Filesystem,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Domain::Cpu => "cpu",
            Domain::Memory => "memory",
            Domain::Disk => "disk",
            Domain::Network => "network",
            Domain::Filesystem => "filesystem",
        }
    }

    /// sar activity arguments passed to sadf after `--`.
    pub fn sar_args(self) -> &'static [&'static str] {
        match self {
            Domain::Cpu => &["-u", "-P", "ALL"],
            Domain::Memory => &["-r"],
            Domain::Disk => &["-d"],
            Domain::Network => &["-n", "DEV"],
            Domain::Filesystem => &["-F"],
        }
    }

    /// File name of this domain inside a dated CSV bundle directory.
    pub fn bundle_file(self) -> &'static str {
        match self {
            Domain::Cpu => "cpu.csv",
            Domain::Memory => "memory.csv",
            Domain::Disk => "disk.csv",
            Domain::Network => "network.csv",
            Domain::Filesystem => "fs.csv",
        }
    }

    pub fn schema(self) -> &'static DomainSchema {
        match self {
            Domain::Cpu => &schema::CPU,
            Domain::Memory => &schema::MEMORY,
            Domain::Disk => &schema::DISK,
            Domain::Network => &schema::NETWORK,
            Domain::Filesystem => &schema::FILESYSTEM,
        }
    }

    /// Name of the dimension key column; memory is host-global and has none.
    pub fn key_column(self) -> Option<&'static str> {
        self.schema().key_field().map(|f| f.name)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Domain::Cpu),
            "memory" | "mem" => Ok(Domain::Memory),
            "disk" => Ok(Domain::Disk),
            "network" | "net" => Ok(Domain::Network),
            "filesystem" | "fs" => Ok(Domain::Filesystem),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

/// Where a normalized table came from; only used as a display caption by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// `sadf -j` output.
    Structured,
    /// `sadf -d` output.
    Flat,
    /// A pre-normalized CSV bundle file.
    Bundle,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Structured => "structured",
            SourceFormat::Flat => "flat",
            SourceFormat::Bundle => "bundle",
        })
    }
}
