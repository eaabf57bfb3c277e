//! Document retriever interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::document::{derive_dedup_key, Document, RawDocument};

/// Failure reported by a retrieval call.
#[derive(Debug, Error)]
#[error("retriever error: {message}")]
pub struct RetrieverError {
    pub message: String,
}

impl RetrieverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Interface to a document store.
///
/// Returned items may or may not carry a pre-assigned dedup key; items
/// without one must carry stable `source`/`title` metadata, from which
/// the core derives the key (see [`documents_from_raw`]) so that the
/// same upstream record dedups across retrievals.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RawDocument>, RetrieverError>;
}

/// Promotes retriever output to typed documents, assigning identities to
/// items the collaborator left keyless.
#[must_use]
pub fn documents_from_raw(raw: Vec<RawDocument>) -> Vec<Document> {
    raw.into_iter()
        .map(|item| {
            let dedup_key = item
                .dedup_key
                .unwrap_or_else(|| derive_dedup_key(&item.metadata));
            Document::new(item.content, item.metadata, dedup_key)
        })
        .collect()
}
