//! Wire models for wall posts, comments and name lookups

use serde::Deserialize;
use serde_json::Value;

/// One page of a paginated collection
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Total size of the collection as reported by the service
    #[serde(default)]
    pub count: u64,
    pub items: Vec<T>,
}

/// A wall post
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A wall comment, possibly carrying one level of inline replies
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub thread: Option<Thread>,
}

/// Replies nested under a top-level comment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub items: Vec<Comment>,
}

/// An opaque attachment record
///
/// The payload is kept as received. Only the type tag and the nested
/// `owner_id`/`id` (plus `access_key` when present) are read, to refer back
/// to the same object when an edit is committed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Attachment(Value);

impl Attachment {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// The type tag, e.g. `photo`, `video`, `doc`
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Serialized reference such as `photo-123_456` or `doc1_2_abcdef`
    ///
    /// Returns `None` for attachments without an owner/id pair (links,
    /// polls created inline and the like).
    pub fn reference(&self) -> Option<String> {
        let kind = self.kind()?;
        let body = self.0.get(kind)?;
        let owner_id = body.get("owner_id").and_then(Value::as_i64)?;
        let id = body.get("id").and_then(Value::as_i64)?;

        match body.get("access_key").and_then(Value::as_str) {
            Some(key) if !key.is_empty() => Some(format!("{}{}_{}_{}", kind, owner_id, id, key)),
            _ => Some(format!("{}{}_{}", kind, owner_id, id)),
        }
    }
}

/// Reply of a screen-name lookup
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedName {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub object_id: Option<i64>,
}

impl ResolvedName {
    /// True for object types that own a community wall
    pub fn is_community(&self) -> bool {
        matches!(self.kind.as_deref(), Some("group" | "page" | "event"))
    }
}
