// sar binary log → text conversion through sadf, structured output first with a flat fallback.

mod sadf;

pub use sadf::SadfCommand;

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, SarError};
use crate::models::SourceFormat;

/// sadf flag requesting JSON output.
pub const STRUCTURED_FLAG: &str = "-j";
/// sadf flag requesting `;`-delimited output.
pub const FLAT_FLAG: &str = "-d";
/// Environment pinned for flat output so decimals always use `.`.
pub const FLAT_ENV: &[(&str, &str)] = &[("LC_ALL", "C")];

/// Which output format the caller wants. `Auto` tries structured and falls back to flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    #[default]
    Auto,
    #[serde(alias = "json", alias = "12")]
    Structured,
    #[serde(alias = "csv", alias = "11")]
    Flat,
}

impl FromStr for Preference {
    type Err = String;

    /// Accepts the names as well as the sysstat major versions that produce each format.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Preference::Auto),
            "structured" | "json" | "12" => Ok(Preference::Structured),
            "flat" | "csv" | "11" => Ok(Preference::Flat),
            other => Err(format!("unknown format preference: {other}")),
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Preference::Auto => "auto",
            Preference::Structured => "structured",
            Preference::Flat => "flat",
        })
    }
}

/// Converter output: exactly one format, tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converted {
    Structured(String),
    Flat(String),
}

impl Converted {
    pub fn format(&self) -> SourceFormat {
        match self {
            Converted::Structured(_) => SourceFormat::Structured,
            Converted::Flat(_) => SourceFormat::Flat,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Converted::Structured(text) | Converted::Flat(text) => text,
        }
    }
}

/// Captured result of one finished tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the external converter. `Err` means the tool could not be run to completion (spawn
/// failure, timeout) and carries the diagnostic.
pub trait ToolRunner: Send + Sync {
    fn program(&self) -> &str;

    fn run(
        &self,
        args: &[OsString],
        env: &[(&str, &str)],
    ) -> std::result::Result<ToolOutput, String>;
}

pub struct Converter {
    runner: Arc<dyn ToolRunner>,
}

impl Converter {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    /// Convert `path` for the given sar activity arguments.
    ///
    /// Spawns one process, or two when `Auto` falls back to flat output. Nothing is retried.
    pub fn convert<S: AsRef<str>>(
        &self,
        path: &Path,
        sar_args: &[S],
        preference: Preference,
    ) -> Result<Converted> {
        if preference != Preference::Flat {
            match self.attempt(STRUCTURED_FLAG, path, sar_args, &[]) {
                Ok(text) => return Ok(Converted::Structured(text)),
                Err(diagnostic) if preference == Preference::Structured => {
                    return Err(SarError::ForcedFormatUnavailable { diagnostic });
                }
                Err(_) => {}
            }
        }
        self.attempt(FLAT_FLAG, path, sar_args, FLAT_ENV)
            .map(Converted::Flat)
            .map_err(|diagnostic| SarError::ExternalToolFailure {
                invocation: format!("{} {FLAT_FLAG}", self.runner.program()),
                diagnostic,
            })
    }

    fn attempt<S: AsRef<str>>(
        &self,
        flag: &str,
        path: &Path,
        sar_args: &[S],
        env: &[(&str, &str)],
    ) -> std::result::Result<String, String> {
        let mut args: Vec<OsString> = vec![flag.into(), path.as_os_str().to_owned(), "--".into()];
        args.extend(sar_args.iter().map(|a| OsString::from(a.as_ref())));

        let output = self.runner.run(&args, env)?;
        if output.success && !output.stdout.trim().is_empty() {
            return Ok(output.stdout);
        }
        let stderr = output.stderr.trim();
        Err(if !stderr.is_empty() {
            stderr.to_string()
        } else if output.success {
            format!("{} {flag} produced no output", self.runner.program())
        } else {
            format!("{} {flag} exited with an error", self.runner.program())
        })
    }
}
