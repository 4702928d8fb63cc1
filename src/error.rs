// Error taxonomy for conversion, parsing and bundle loading.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::{Domain, SourceFormat};

/// Every failure the normalization core can report. None of these are retried or logged by
/// the core; the caller decides how to present them.
#[derive(Error, Debug)]
pub enum SarError {
    /// Non-zero exit, empty output, spawn failure or timeout of the conversion tool.
    #[error("{invocation} failed: {diagnostic}")]
    ExternalToolFailure {
        invocation: String,
        diagnostic: String,
    },

    /// Structured output was pinned by the caller and the structured conversion failed, so no
    /// flat fallback was attempted.
    #[error("structured output was requested but is unavailable: {diagnostic}")]
    ForcedFormatUnavailable { diagnostic: String },

    /// The per-domain file of a CSV bundle does not exist.
    #[error("{domain} bundle file not found: {}", path.display())]
    MissingBundleFile { domain: Domain, path: PathBuf },

    /// Text that does not match the structured or flat grammar of a domain.
    #[error("malformed {format} input for {domain}: {reason}")]
    MalformedInput {
        domain: Domain,
        format: SourceFormat,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SarError {
    pub(crate) fn malformed(
        domain: Domain,
        format: SourceFormat,
        reason: impl Into<String>,
    ) -> Self {
        SarError::MalformedInput {
            domain,
            format,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SarError>;
