//! Pipeline configuration, loaded from TOML.
//!
//! Every section has defaults, so an empty file (or no file at all) yields a
//! working configuration against the public FDIC endpoint with the nine-bank
//! roster.

use crate::data::provider::DataError;
use crate::domain::{DateWindow, Roster};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Page size requested on every query. Only one page is read.
    pub page_limit: u32,
    pub accept_invalid_certs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://banks.data.fdic.gov/api".into(),
            timeout_secs: 30,
            page_limit: 10_000,
            accept_invalid_certs: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: "data_cache".into(),
        }
    }
}

/// Outer retry loop of the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Delay before attempt `n` (n ≥ 2) is `base_delay_ms * 2^(n-2)`.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

impl RetryConfig {
    /// No delay between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
        }
    }

    /// Backoff before the given 1-based attempt. The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.base_delay_ms == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (attempt - 2).min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// Default reporting window, as `YYYYMMDD` or `YYYY-MM-DD` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: "20000331".into(),
            end: "20250331".into(),
        }
    }
}

impl WindowConfig {
    pub fn to_window(&self) -> Result<DateWindow, DataError> {
        DateWindow::parse(&self.start, &self.end)
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub synthetic: SyntheticConfig,
    pub window: WindowConfig,
    pub roster: Roster,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            synthetic: SyntheticConfig::default(),
            window: WindowConfig::default(),
            roster: Roster::default_us(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.roster.validate().map_err(ConfigError::Invalid)?;
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.api.page_limit == 0 {
            return Err(ConfigError::Invalid("api.page_limit must be positive".into()));
        }
        self.window
            .to_window()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// The configured default window.
    pub fn default_window(&self) -> Result<DateWindow, ConfigError> {
        self.window
            .to_window()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusinessMix, SizeTier};

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = PipelineConfig::from_toml("").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.roster.len(), 9);
        assert_eq!(cfg.api.page_limit, 10_000);
        assert_eq!(cfg.default_window().unwrap().cache_key(), "20000331_20250331");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = PipelineConfig::from_toml(
            r#"
            [api]
            timeout_secs = 5

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.api.timeout_secs, 5);
        assert_eq!(cfg.api.base_url, ApiConfig::default().base_url);
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.base_delay_ms, 500);
    }

    #[test]
    fn roster_from_toml() {
        let cfg = PipelineConfig::from_toml(
            r#"
            [[roster]]
            name = "Goldman Sachs Bank USA"
            cert = "33124"
            display_name = "Goldman Sachs"
            tier = "medium"
            mix = "differentiated"

            [[roster]]
            name = "Truist Bank"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.roster.len(), 2);
        let gs = &cfg.roster.entries()[0];
        assert_eq!(gs.tier, SizeTier::Medium);
        assert_eq!(gs.mix, BusinessMix::Differentiated);
        let truist = &cfg.roster.entries()[1];
        assert_eq!(truist.cert, None);
        assert_eq!(truist.tier, SizeTier::Other);
        assert_eq!(truist.display(), "Truist Bank");
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(matches!(
            PipelineConfig::from_toml("[retry]\nmax_attempts = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml("[window]\nstart = \"20250101\"\nend = \"20200101\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml("[[roster]]\nname = \"A\"\n[[roster]]\nname = \"A\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml("api = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn retry_delay_doubles() {
        let r = RetryConfig::default();
        assert_eq!(r.delay_before(1), Duration::ZERO);
        assert_eq!(r.delay_before(2), Duration::from_millis(500));
        assert_eq!(r.delay_before(3), Duration::from_millis(1000));
        assert_eq!(RetryConfig::immediate(3).delay_before(3), Duration::ZERO);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/peerbank.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
