//! Filter a social feed down to posts that are worth a human-sounding reply.
//!
//! Each post runs through four checks: a promotional detector, a bot detector,
//! a human-score estimate and a reply-worthiness gate. [`filter_for_replies`]
//! chains them and returns the survivors ranked by score.
//!
//! The functions at the crate root use the built-in ruleset. Build a
//! [`ReplyFilter`] from a custom [`Ruleset`] to tune phrases and thresholds.

pub mod config;
pub mod error;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod record;
pub mod reply;
pub mod rules;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use feed::{
    save_records, FeedQuery, FetchError, FetchRequest, Fetcher, JsonFileFeed, RetryPolicy,
    RetryingFetcher, Sleeper, ThreadSleeper,
};
pub use filter::{
    ContentAnalysis, FilterOutcome, FilterStats, ReplyFilter, Signals, Worthiness,
    DEFAULT_MIN_HUMAN_SCORE,
};
pub use record::{AnnotatedRecord, Record, RecordId};
pub use reply::{
    Failure, GenerationReport, PostReport, Publisher, ReplyGenerator, ReplySession, ReplyStyle,
};
pub use rules::Ruleset;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn is_promotional(record: &Record) -> bool {
    ReplyFilter::builtin().is_promotional(record)
}

pub fn is_bot_content(record: &Record) -> bool {
    ReplyFilter::builtin().is_bot_content(record)
}

/// Heuristic estimate in [0, 1] of how human-written the post reads.
pub fn calculate_human_score(record: &Record) -> f64 {
    ReplyFilter::builtin().calculate_human_score(record)
}

pub fn is_reply_worthy(record: &Record) -> bool {
    ReplyFilter::builtin().is_reply_worthy(record)
}

pub fn analyze(text: &str) -> ContentAnalysis {
    ReplyFilter::builtin().analyze(text)
}

/// Keep the records that are neither promotional nor bot-like, score at least
/// `min_human_score` and invite a reply, most human first.
pub fn filter_for_replies<I>(records: I, min_human_score: f64) -> Vec<AnnotatedRecord>
where
    I: IntoIterator<Item = Record>,
{
    ReplyFilter::builtin().filter_for_replies(records, min_human_score)
}
