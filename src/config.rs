use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::converter::Preference;

/// Environment variable that overrides `converter.preference` (`auto`, `12`, `11`, ...).
pub const VERSION_ENV: &str = "SAR_VERSION";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logs: LogsConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    /// Directory whose subdirectories hold SAR binaries and `csv/` bundles.
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default)]
    pub preference: Preference,
    /// Upper bound on one sadf run; 0 disables the limit.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_program() -> String {
    "sadf".into()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            preference: Preference::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConverterConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        let mut config = Self::load_from_str(&s)?;
        if let Ok(version) = std::env::var(VERSION_ENV) {
            config.apply_version_override(&version)?;
        }
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the converter preference with a `SAR_VERSION`-style value.
    pub fn apply_version_override(&mut self, value: &str) -> anyhow::Result<()> {
        self.converter.preference = value
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{VERSION_ENV}: {e}"))?;
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            !self.logs.root.as_os_str().is_empty(),
            "logs.root must be non-empty"
        );
        anyhow::ensure!(
            !self.converter.program.trim().is_empty(),
            "converter.program must be non-empty"
        );
        Ok(())
    }
}
