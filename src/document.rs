//! Retrieved documents and the typed update shapes accepted by the
//! documents channel.
//!
//! A [`Document`] carries its dedup identity in `dedup_key`. The key is
//! assigned exactly once, at the moment the document first enters the
//! system, and is preserved on every subsequent merge; it is the only
//! dedup criterion. Two documents with identical text but different keys
//! are both kept — content-equality dedup is deliberately not attempted.
//!
//! Across process boundaries a document serializes as
//! `{"page_content": ..., "metadata": {...}}` with the dedup key carried
//! inside `metadata` under [`DEDUP_KEY_FIELD`], and the layout round-trips.
//!
//! [`DocumentUpdate`] is the tagged union of every update shape the
//! documents channel accepts, so the reducer can match exhaustively
//! instead of inspecting types at run time.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata key under which the dedup identity travels when a document is
/// serialized across a process boundary.
pub const DEDUP_KEY_FIELD: &str = "dedup_key";

/// A retrieved document with content, source metadata, and a stable dedup
/// identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// The document text.
    pub content: String,
    /// Source metadata (e.g., `source`, `title`) as supplied by the
    /// retriever.
    pub metadata: Map<String, Value>,
    /// Identity assigned at first sight; never regenerated.
    pub dedup_key: String,
}

impl Document {
    /// Creates a document from bare text with a freshly generated dedup key
    /// and empty metadata.
    #[must_use]
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Map::new(),
            dedup_key: fresh_dedup_key(),
        }
    }

    /// Creates a document with explicit metadata and dedup key.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        metadata: Map<String, Value>,
        dedup_key: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            metadata,
            dedup_key: dedup_key.into(),
        }
    }

    /// Attaches a metadata entry, replacing any existing value for the key.
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Generates a fresh dedup key.
#[must_use]
pub fn fresh_dedup_key() -> String {
    Uuid::new_v4().to_string()
}

/// Derives a dedup key from stable retriever metadata, falling back to a
/// fresh key when neither `source` nor `title` is present.
///
/// Retrievers that do not pre-assign identities are still required to
/// supply stable `source`/`title` metadata (see the retriever contract),
/// so the same upstream record receives the same key on every retrieval.
#[must_use]
pub fn derive_dedup_key(metadata: &Map<String, Value>) -> String {
    let source = metadata.get("source").and_then(Value::as_str);
    let title = metadata.get("title").and_then(Value::as_str);
    match (source, title) {
        (Some(source), Some(title)) => format!("{source}::{title}"),
        (Some(source), None) => source.to_string(),
        (None, Some(title)) => title.to_string(),
        (None, None) => fresh_dedup_key(),
    }
}

/// A document-shaped object that has not been assigned an identity yet.
///
/// Raw items with a `dedup_key` keep it and participate in dedup; items
/// without one are assigned a fresh key on merge, which makes them
/// unconditional additions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup_key: Option<String>,
}

impl RawDocument {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Map::new(),
            dedup_key: None,
        }
    }

    #[must_use]
    pub fn with_dedup_key(mut self, key: impl Into<String>) -> Self {
        self.dedup_key = Some(key.into());
        self
    }
}

/// Every update shape the documents channel accepts.
///
/// The upstream channel was duck-typed (string, array of strings, array
/// of objects, typed documents, or a clear sentinel); here the shapes are
/// a tagged union so the reducer's branches are exhaustive at compile
/// time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DocumentUpdate {
    /// Discard all existing documents and start empty. Used when a new
    /// research plan begins.
    Clear,
    /// A single bare text. Always appended as a new document with a fresh
    /// key; never deduplicated.
    Text(String),
    /// Bare texts. Each is always appended as a new document.
    Texts(Vec<String>),
    /// Document-shaped objects that may or may not carry an identity yet.
    Raw(Vec<RawDocument>),
    /// Already-typed documents; their keys participate in dedup.
    Documents(Vec<Document>),
}

impl DocumentUpdate {
    /// Convenience constructor for a single bare-text update.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }
}

impl From<Vec<Document>> for DocumentUpdate {
    fn from(docs: Vec<Document>) -> Self {
        Self::Documents(docs)
    }
}

// Wire layout used by serialization: the dedup key rides inside metadata.
#[derive(Serialize, Deserialize)]
struct DocumentWire {
    page_content: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut metadata = self.metadata.clone();
        metadata.insert(
            DEDUP_KEY_FIELD.to_string(),
            Value::String(self.dedup_key.clone()),
        );
        DocumentWire {
            page_content: self.content.clone(),
            metadata,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut wire = DocumentWire::deserialize(deserializer)?;
        let dedup_key = match wire.metadata.remove(DEDUP_KEY_FIELD) {
            Some(Value::String(key)) => key,
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "metadata field '{DEDUP_KEY_FIELD}' must be a string, got {other}"
                )));
            }
            // Identity at first sight: a document arriving without a key
            // gets one here and keeps it from then on.
            None => fresh_dedup_key(),
        };
        Ok(Document {
            content: wire.page_content,
            metadata: wire.metadata,
            dedup_key,
        })
    }
}
