//! Dedup/merge reducer for the documents channel.
//!
//! Identity is assigned at first sight and the dedup key is the only
//! dedup criterion. Documents whose key was already seen are dropped;
//! everything else is appended after the existing documents, preserving
//! arrival order within the update. Content equality is never inspected:
//! two documents with identical text but different (or freshly assigned)
//! keys are both kept. A content-hash reducer would be a different,
//! non-conformant design.

use rustc_hash::FxHashSet;

use crate::document::{fresh_dedup_key, Document, DocumentUpdate};

/// Merges a [`DocumentUpdate`] into an existing document list, returning
/// the new list.
///
/// Rules, in order:
///
/// 1. [`Clear`](DocumentUpdate::Clear) discards everything and returns an
///    empty list.
/// 2. Bare text ([`Text`](DocumentUpdate::Text) /
///    [`Texts`](DocumentUpdate::Texts)) is always an addition: each item
///    becomes a new document with a fresh key and is appended without any
///    dedup check.
/// 3. Items that carry a key ([`Documents`](DocumentUpdate::Documents),
///    or [`Raw`](DocumentUpdate::Raw) with `dedup_key: Some`) keep their
///    key; if the key was already seen — in `existing` or earlier in this
///    same update — the item is skipped.
/// 4. Raw items without a key are assigned a fresh one and then run
///    through the same seen-check; a fresh key can never collide, so in
///    practice they are always added.
///
/// `existing` is never mutated; the result is always a new `Vec`.
///
/// # Examples
///
/// ```
/// use ragloom::document::{Document, DocumentUpdate};
/// use ragloom::reducers::merge_documents;
///
/// let existing = vec![Document::from_text("first")];
///
/// // Re-merging the same keyed documents is idempotent.
/// let update = DocumentUpdate::Documents(existing.clone());
/// let merged = merge_documents(&existing, &update);
/// assert_eq!(merged.len(), 1);
///
/// // Bare strings always add.
/// let merged = merge_documents(&existing, &DocumentUpdate::text("first"));
/// assert_eq!(merged.len(), 2);
///
/// // CLEAR resets regardless of prior size.
/// assert!(merge_documents(&merged, &DocumentUpdate::Clear).is_empty());
/// ```
#[must_use]
pub fn merge_documents(existing: &[Document], update: &DocumentUpdate) -> Vec<Document> {
    match update {
        DocumentUpdate::Clear => Vec::new(),

        DocumentUpdate::Text(content) => {
            let mut merged = existing.to_vec();
            merged.push(Document::from_text(content.clone()));
            merged
        }

        DocumentUpdate::Texts(items) => {
            let mut merged = existing.to_vec();
            merged.extend(items.iter().map(|text| Document::from_text(text.clone())));
            merged
        }

        DocumentUpdate::Raw(items) => {
            let mut seen_keys = seen_keys(existing);
            let mut merged = existing.to_vec();
            for item in items {
                let dedup_key = item
                    .dedup_key
                    .clone()
                    .unwrap_or_else(fresh_dedup_key);
                if !seen_keys.insert(dedup_key.clone()) {
                    tracing::debug!(dedup_key = %dedup_key, "dropping duplicate document");
                    continue;
                }
                merged.push(Document::new(
                    item.content.clone(),
                    item.metadata.clone(),
                    dedup_key,
                ));
            }
            merged
        }

        DocumentUpdate::Documents(documents) => {
            let mut seen_keys = seen_keys(existing);
            let mut merged = existing.to_vec();
            for document in documents {
                if !seen_keys.insert(document.dedup_key.clone()) {
                    tracing::debug!(dedup_key = %document.dedup_key, "dropping duplicate document");
                    continue;
                }
                merged.push(document.clone());
            }
            merged
        }
    }
}

fn seen_keys(existing: &[Document]) -> FxHashSet<String> {
    existing
        .iter()
        .map(|document| document.dedup_key.clone())
        .collect()
}
