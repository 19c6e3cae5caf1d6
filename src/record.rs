//! Post records as they flow through the filter.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Opaque post identifier. Feeds hand out either numeric or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
    /// Any other JSON number (floats, integers past `i64`), kept as written.
    Number(Number),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
            RecordId::Number(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Text(id)
    }
}

/// One post. Only `content` is read by the filter; everything else is carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<RecordId>,
    /// Engagement counts, display names and any other feed-specific fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            created_at: None,
            username: None,
            url: None,
            conversation_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<RecordId>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// A mention-led post that belongs to somebody else's conversation.
    pub fn is_reply_to_other(&self) -> bool {
        self.content.starts_with('@')
            && self
                .conversation_id
                .as_ref()
                .is_some_and(|conversation| *conversation != self.id)
    }
}

/// A record that survived the filter, with the two annotation fields attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub human_score: f64,
    pub reply_worthy: bool,
}

impl AnnotatedRecord {
    pub(crate) fn new(mut record: Record, human_score: f64, reply_worthy: bool) -> Self {
        // Re-filtering an earlier snapshot must not leave stale copies behind.
        record.extra.remove("human_score");
        record.extra.remove("reply_worthy");
        Self {
            record,
            human_score,
            reply_worthy,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.record.id
    }

    pub fn content(&self) -> &str {
        &self.record.content
    }
}
