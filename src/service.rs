// Composition root: config, converter and conversion cache behind async entry points
//
// The core (converter, parsers, bundle loader) is blocking; every public async method here moves
// the work onto tokio's blocking pool.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use crate::bundle;
use crate::cache::{CacheKey, ConversionCache};
use crate::config::AppConfig;
use crate::converter::{Converted, Converter, Preference, SadfCommand};
use crate::error::SarError;
use crate::logs::{self, DatedPath};
use crate::models::{Domain, NormalizedTable, SourceFormat};
use crate::parsers;

/// sar arguments used to read the header of a binary when its name carries no date.
const FILE_DATE_ARGS: &[&str] = &["-u"];

/// Where tables are read from: SAR binaries through sadf, or CSV bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Sar,
    Csv,
}

#[derive(Debug, Clone)]
pub struct TableRequest {
    pub dir: String,
    pub date: String,
    pub domain: Domain,
    pub source: Source,
    /// `None` uses the configured preference.
    pub preference: Option<Preference>,
    /// Dimension keys to keep; empty keeps every row.
    pub keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: NormalizedTable,
    pub format: SourceFormat,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid directory name: {0:?}")]
    InvalidName(String),

    #[error("unknown domain: {0:?}")]
    UnknownDomain(String),

    #[error("no such log directory: {0}")]
    UnknownDir(String),

    #[error("no {date} in {dir}")]
    UnknownDate { dir: String, date: String },

    #[error(transparent)]
    Sar(#[from] SarError),

    #[error("worker task failed: {0}")]
    Join(String),
}

#[derive(Clone)]
pub struct SarService {
    inner: Arc<Inner>,
}

struct Inner {
    logs_root: PathBuf,
    preference: Preference,
    converter: Converter,
    cache: Option<ConversionCache>,
}

impl SarService {
    /// Service backed by the configured sadf program.
    pub fn new(config: &AppConfig) -> Self {
        let runner = SadfCommand::new(config.converter.program.clone(), config.converter.timeout());
        Self::with_converter(config, Converter::new(Arc::new(runner)))
    }

    pub fn with_converter(config: &AppConfig, converter: Converter) -> Self {
        Self {
            inner: Arc::new(Inner {
                logs_root: config.logs.root.clone(),
                preference: config.converter.preference,
                converter,
                cache: config.cache.enabled.then(ConversionCache::new),
            }),
        }
    }

    pub fn logs_root(&self) -> &Path {
        &self.inner.logs_root
    }

    pub fn preference(&self) -> Preference {
        self.inner.preference
    }

    /// Conversions currently memoized (0 when caching is disabled).
    pub fn cached_conversions(&self) -> usize {
        self.inner.cache.as_ref().map_or(0, ConversionCache::len)
    }

    #[instrument(skip(self), fields(service = "sar", operation = "list_dirs"))]
    pub async fn list_dirs(&self, source: Source) -> Result<Vec<String>, ServiceError> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.list_dirs(source))
            .await
            .map_err(|e| ServiceError::Join(e.to_string()))?
    }

    #[instrument(skip(self), fields(service = "sar", operation = "list_dates"))]
    pub async fn list_dates(&self, dir: &str, source: Source) -> Result<Vec<String>, ServiceError> {
        let inner = self.inner.clone();
        let dir = dir.to_string();
        tokio::task::spawn_blocking(move || {
            let index = inner.index(&dir, source)?;
            Ok(logs::dates(&index))
        })
        .await
        .map_err(|e| ServiceError::Join(e.to_string()))?
    }

    #[instrument(skip(self, request), fields(service = "sar", operation = "load_table", dir = %request.dir, date = %request.date, domain = %request.domain))]
    pub async fn load_table(&self, request: TableRequest) -> Result<LoadedTable, ServiceError> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.load_table(&request))
            .await
            .map_err(|e| ServiceError::Join(e.to_string()))?
    }
}

fn check_name(name: &str) -> Result<(), ServiceError> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(ServiceError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl Inner {
    fn dir_path(&self, dir: &str) -> Result<PathBuf, ServiceError> {
        check_name(dir)?;
        let path = self.logs_root.join(dir);
        if !path.is_dir() {
            return Err(ServiceError::UnknownDir(dir.to_string()));
        }
        Ok(path)
    }

    fn list_dirs(&self, source: Source) -> Result<Vec<String>, ServiceError> {
        let dirs = logs::list_log_dirs(&self.logs_root).map_err(SarError::from)?;
        Ok(match source {
            Source::Sar => dirs,
            Source::Csv => dirs
                .into_iter()
                .filter(|d| logs::has_bundle(&self.logs_root.join(d)))
                .collect(),
        })
    }

    fn index(&self, dir: &str, source: Source) -> Result<Vec<DatedPath>, ServiceError> {
        let path = self.dir_path(dir)?;
        let index = match source {
            Source::Csv => logs::index_bundle_dates(&path),
            Source::Sar => logs::index_sar_files(&path, |file| self.file_date(file)),
        }
        .map_err(SarError::from)?;
        tracing::debug!(dir, ?source, entries = index.len(), "indexed log directory");
        Ok(index)
    }

    fn file_date(&self, path: &Path) -> Result<Option<String>, SarError> {
        let converted = self
            .convert(path, FILE_DATE_ARGS, Preference::Auto)
            .inspect_err(|e| tracing::warn!(path = %path.display(), error = %e, "skipping unreadable log"))?;
        Ok(match converted.as_ref() {
            Converted::Structured(text) => parsers::structured::file_date(text),
            Converted::Flat(_) => None,
        })
    }

    fn convert(
        &self,
        path: &Path,
        args: &[&str],
        preference: Preference,
    ) -> Result<Arc<Converted>, SarError> {
        let run = || -> Result<Converted, SarError> {
            let started = std::time::Instant::now();
            let converted = self.converter.convert(path, args, preference)?;
            tracing::info!(
                path = %path.display(),
                args = ?args,
                %preference,
                format = %converted.format(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "converted sar log"
            );
            Ok(converted)
        };
        match &self.cache {
            Some(cache) => cache.get_or_try_insert_with(CacheKey::new(path, args, preference), run),
            None => run().map(Arc::new),
        }
    }

    fn load_table(&self, request: &TableRequest) -> Result<LoadedTable, ServiceError> {
        let index = self.index(&request.dir, request.source)?;
        let entry = index
            .iter()
            .find(|d| d.date == request.date)
            .ok_or_else(|| ServiceError::UnknownDate {
                dir: request.dir.clone(),
                date: request.date.clone(),
            })?;

        let loaded = match request.source {
            Source::Csv => LoadedTable {
                table: bundle::load_bundle(&entry.path, request.domain)?,
                format: SourceFormat::Bundle,
            },
            Source::Sar => {
                let preference = request.preference.unwrap_or(self.preference);
                let converted =
                    self.convert(&entry.path, request.domain.sar_args(), preference)?;
                LoadedTable {
                    table: parsers::load(request.domain, &converted)?,
                    format: converted.format(),
                }
            }
        };
        let table = loaded.table.with_keys(&request.keys);
        tracing::debug!(rows = table.len(), format = %loaded.format, "loaded table");
        Ok(LoadedTable {
            table,
            format: loaded.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_names_cannot_escape_the_root() {
        assert!(check_name("host-a").is_ok());
        for bad in ["", ".", "..", ".hidden", "a/b", "..\\x"] {
            assert!(matches!(check_name(bad), Err(ServiceError::InvalidName(_))), "{bad}");
        }
    }
}
