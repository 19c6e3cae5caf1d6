//! Drafting and posting replies.
//!
//! The language model and the posting API sit behind [`ReplyGenerator`] and
//! [`Publisher`]. Callers build those handles once and pass them in;
//! [`ReplySession`] only tracks which record got which reply and reports
//! failures record by record.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::record::{AnnotatedRecord, RecordId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStyle {
    #[default]
    Friendly,
    Professional,
    Funny,
}

impl ReplyStyle {
    pub const ALL: [ReplyStyle; 3] = [
        ReplyStyle::Friendly,
        ReplyStyle::Professional,
        ReplyStyle::Funny,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReplyStyle::Friendly => "friendly",
            ReplyStyle::Professional => "professional",
            ReplyStyle::Funny => "funny",
        }
    }
}

impl fmt::Display for ReplyStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplyStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ReplyStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Config(format!("unknown reply style: {s}")))
    }
}

pub trait ReplyGenerator {
    fn generate_reply(&self, content: &str, style: ReplyStyle) -> Result<String>;
}

pub trait Publisher {
    fn publish(&self, reply: &str, in_reply_to: &RecordId) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub generated: usize,
    /// Records that already had a reply.
    pub skipped: usize,
    pub failed: Vec<Failure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostReport {
    pub posted: Vec<RecordId>,
    pub failed: Vec<Failure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub id: RecordId,
    pub error: String,
}

/// Filtered records plus the replies drafted for them so far.
#[derive(Debug, Clone, Default)]
pub struct ReplySession {
    records: Vec<AnnotatedRecord>,
    replies: HashMap<RecordId, String>,
    style: ReplyStyle,
}

impl ReplySession {
    pub fn new(records: Vec<AnnotatedRecord>, style: ReplyStyle) -> Self {
        Self {
            records,
            replies: HashMap::new(),
            style,
        }
    }

    pub fn records(&self) -> &[AnnotatedRecord] {
        &self.records
    }

    pub fn style(&self) -> ReplyStyle {
        self.style
    }

    pub fn set_style(&mut self, style: ReplyStyle) {
        self.style = style;
    }

    pub fn reply_for(&self, id: &RecordId) -> Option<&str> {
        self.replies.get(id).map(String::as_str)
    }

    /// Replace the records, keeping replies for ids that are still present.
    pub fn replace_records(&mut self, records: Vec<AnnotatedRecord>) {
        self.replies
            .retain(|id, _| records.iter().any(|r| r.id() == id));
        self.records = records;
    }

    /// Draft a reply for every record that does not have one yet.
    pub fn generate_replies(&mut self, generator: &dyn ReplyGenerator) -> GenerationReport {
        let mut report = GenerationReport::default();

        for record in &self.records {
            if self.replies.contains_key(record.id()) {
                report.skipped += 1;
                continue;
            }
            match generator.generate_reply(record.content(), self.style) {
                Ok(reply) => {
                    self.replies.insert(record.id().clone(), reply.trim().to_string());
                    report.generated += 1;
                }
                Err(e) => {
                    warn!("Failed to generate reply for {}: {}", record.id(), e);
                    report.failed.push(Failure {
                        id: record.id().clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            generated = report.generated,
            skipped = report.skipped,
            failed = report.failed.len(),
            style = %self.style,
            "generated replies"
        );
        report
    }

    /// Post every drafted reply in record order. A failed post is recorded
    /// and the batch carries on.
    pub fn post_replies(&self, publisher: &dyn Publisher) -> PostReport {
        let mut report = PostReport::default();

        for record in &self.records {
            let Some(reply) = self.replies.get(record.id()) else {
                continue;
            };
            match publisher.publish(reply, record.id()) {
                Ok(()) => report.posted.push(record.id().clone()),
                Err(e) => {
                    warn!("Failed to reply to {}: {}", record.id(), e);
                    report.failed.push(Failure {
                        id: record.id().clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            posted = report.posted.len(),
            failed = report.failed.len(),
            "posted replies"
        );
        report
    }
}
