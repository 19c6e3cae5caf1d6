use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::feed::RetryPolicy;
use crate::filter::DEFAULT_MIN_HUMAN_SCORE;
use crate::rules::Ruleset;
use crate::{Error, Result};

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "reply-guard.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_human_score: f64,
    /// Optional ruleset file; the built-in ruleset is used when unset.
    pub rules: Option<PathBuf>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_human_score: DEFAULT_MIN_HUMAN_SCORE,
            rules: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_results: u32,
    pub max_attempts: u32,
    pub rate_limit_backoff_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_results: 20,
            max_attempts: 2,
            rate_limit_backoff_secs: 900,
        }
    }
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_secs(self.rate_limit_backoff_secs),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub filter: FilterConfig,
    pub fetch: FetchConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_min_human_score(self.filter.min_human_score)
    }

    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists, or fall
    /// back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// The ruleset named in `[filter]`, or the built-in one.
    pub fn ruleset(&self) -> Result<Ruleset> {
        match &self.filter.rules {
            Some(path) => Ruleset::from_file(path),
            None => Ok(Ruleset::default()),
        }
    }
}

/// Human scores live in [0, 1], so the threshold must too.
pub fn validate_min_human_score(score: f64) -> Result<()> {
    if (0.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "filter.min_human_score must be within [0, 1], got {score}"
        )))
    }
}
