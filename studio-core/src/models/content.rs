use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Open, caller-supplied key/value map stored verbatim (key order preserved).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// One gallery entry as stored in the content file.
///
/// `created_at` is kept as written: new records get an RFC 3339 UTC timestamp,
/// older files may carry naive local ISO timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Metadata, D::Error> {
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}

impl ContentRecord {
    /// Fresh record with a random v4 id and the current timestamp.
    pub fn new(
        content_type: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        metadata: Option<Metadata>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content_type: content_type.into(),
            title: title.into(),
            content: content.into(),
            created_at: Utc::now().to_rfc3339(),
            metadata: metadata.unwrap_or_default(),
        }
    }

    /// `query_lower` must already be lower-cased.
    pub fn matches(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self.content.to_lowercase().contains(query_lower)
    }
}
