//! Fetching posts to filter.
//!
//! The network client lives outside this crate; it plugs in through
//! [`Fetcher`]. What lives here is the query model, the error classification
//! the retry logic keys on, a bounded retry wrapper and an offline source that
//! reads JSON snapshots.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::record::Record;

/// Page bounds of the search API.
pub const MIN_RESULTS: u32 = 10;
pub const MAX_RESULTS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedQuery {
    /// Free-text search.
    Keyword(String),
    /// A user's own timeline, stored without the leading `@`.
    Handle(String),
}

impl FeedQuery {
    /// `@name` selects a timeline, anything else is a keyword search.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match input.strip_prefix('@') {
            Some(handle) => FeedQuery::Handle(handle.to_string()),
            None => FeedQuery::Keyword(input.to_string()),
        }
    }
}

impl fmt::Display for FeedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedQuery::Keyword(keyword) => f.write_str(keyword),
            FeedQuery::Handle(handle) => write!(f, "@{handle}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub query: FeedQuery,
    pub max_results: u32,
}

impl FetchRequest {
    pub fn new(query: FeedQuery, max_results: u32) -> Self {
        Self {
            query,
            max_results: max_results.clamp(MIN_RESULTS, MAX_RESULTS),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("unauthorized, check the bearer token")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }
}

pub trait Fetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Record>, FetchError>;
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed wait after a rate-limited attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(15 * 60),
        }
    }
}

/// Retries rate-limited fetches with a fixed backoff. Every other error is
/// returned as soon as it happens.
pub struct RetryingFetcher<F, S = ThreadSleeper> {
    inner: F,
    policy: RetryPolicy,
    sleeper: S,
}

impl<F: Fetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self::with_sleeper(inner, policy, ThreadSleeper)
    }
}

impl<F: Fetcher, S: Sleeper> RetryingFetcher<F, S> {
    pub fn with_sleeper(inner: F, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            inner,
            policy,
            sleeper,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<F: Fetcher, S: Sleeper> Fetcher for RetryingFetcher<F, S> {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Record>, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.fetch(request) {
                Ok(records) => {
                    debug!(query = %request.query, attempt, count = records.len(), "fetched records");
                    return Ok(records);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        "Attempt {}/{}: rate limited fetching {}, waiting {:?}",
                        attempt, max_attempts, request.query, self.policy.backoff
                    );
                    self.sleeper.sleep(self.policy.backoff);
                    attempt += 1;
                }
                Err(e) => {
                    warn!(query = %request.query, attempt, "fetch failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON snapshots
// ---------------------------------------------------------------------------

/// Serves records from a JSON array on disk, as saved by [`save_records`].
#[derive(Debug, Clone)]
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Record>, FetchError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound(self.path.display().to_string()),
            _ => FetchError::Other(format!("reading {}: {e}", self.path.display())),
        })?;
        serde_json::from_str(&content)
            .map_err(|e| FetchError::Other(format!("parsing {}: {e}", self.path.display())))
    }
}

impl Fetcher for JsonFileFeed {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Record>, FetchError> {
        let records = self.load()?;
        let matched: Vec<Record> = match &request.query {
            FeedQuery::Keyword(keyword) => {
                let keyword = keyword.to_lowercase();
                records
                    .into_iter()
                    .filter(|r| r.content.to_lowercase().contains(&keyword))
                    .collect()
            }
            FeedQuery::Handle(handle) => records
                .into_iter()
                .filter(|r| {
                    r.username
                        .as_deref()
                        .is_some_and(|u| u.eq_ignore_ascii_case(handle))
                })
                .filter(|r| !r.is_reply_to_other())
                .collect(),
        };

        let fetched: Vec<Record> = matched
            .into_iter()
            .take(request.max_results as usize)
            .collect();
        info!("Fetched {} records for {}", fetched.len(), request.query);
        Ok(fetched)
    }
}

/// Write records as pretty-printed JSON.
pub fn save_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> crate::Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}
