use proptest::prelude::*;
use serde_json::json;

use ragloom::document::{Document, DocumentUpdate, RawDocument};
use ragloom::message::Message;
use ragloom::reducers::{coerce_answer, merge_documents, merge_messages};

fn keyed_doc(key: &str, content: &str) -> Document {
    Document::new(content, serde_json::Map::new(), key)
}

/********************
 * Document reducer
 ********************/

#[test]
fn test_dedup_idempotence() {
    let docs = vec![keyed_doc("a", "one"), keyed_doc("b", "two")];
    let update = DocumentUpdate::Documents(docs.clone());

    let once = merge_documents(&[], &update);
    let twice = merge_documents(&once, &update);

    assert_eq!(once.len(), 2);
    assert_eq!(twice.len(), 2);
    assert_eq!(once, twice);
}

#[test]
fn test_string_always_adds() {
    let mut channel = Vec::new();
    for round in 1..=3 {
        channel = merge_documents(&channel, &DocumentUpdate::text("identical text"));
        assert_eq!(channel.len(), round, "each bare string adds exactly one");
    }
    // Identical content, three distinct identities.
    let keys: std::collections::HashSet<_> =
        channel.iter().map(|d| d.dedup_key.clone()).collect();
    assert_eq!(keys.len(), 3);
}

#[test]
fn test_clear_resets_regardless_of_size() {
    let mut channel = Vec::new();
    for i in 0..10 {
        channel = merge_documents(&channel, &DocumentUpdate::text(format!("doc {i}")));
    }
    assert_eq!(channel.len(), 10);
    assert!(merge_documents(&channel, &DocumentUpdate::Clear).is_empty());
    assert!(merge_documents(&[], &DocumentUpdate::Clear).is_empty());
}

#[test]
fn test_texts_each_add() {
    let channel = merge_documents(
        &[],
        &DocumentUpdate::Texts(vec!["a".into(), "a".into(), "b".into()]),
    );
    assert_eq!(channel.len(), 3);
}

#[test]
fn test_keyed_duplicates_within_one_update_are_dropped() {
    let update = DocumentUpdate::Documents(vec![
        keyed_doc("k", "first arrival"),
        keyed_doc("k", "second arrival"),
    ]);
    let channel = merge_documents(&[], &update);
    assert_eq!(channel.len(), 1);
    assert_eq!(channel[0].content, "first arrival");
}

#[test]
fn test_keyless_raw_items_always_added() {
    let existing = vec![keyed_doc("k", "existing")];
    let update = DocumentUpdate::Raw(vec![
        RawDocument::new("no identity yet"),
        RawDocument::new("also new"),
    ]);
    let channel = merge_documents(&existing, &update);
    assert_eq!(channel.len(), 3);
    // Assigned identities are fresh, not colliding with existing ones.
    assert_ne!(channel[1].dedup_key, "k");
    assert_ne!(channel[1].dedup_key, channel[2].dedup_key);
}

#[test]
fn test_keyed_raw_items_participate_in_dedup() {
    let existing = vec![keyed_doc("k", "existing")];
    let update = DocumentUpdate::Raw(vec![
        RawDocument::new("duplicate").with_dedup_key("k"),
        RawDocument::new("fresh").with_dedup_key("other"),
    ]);
    let channel = merge_documents(&existing, &update);
    assert_eq!(channel.len(), 2);
    assert_eq!(channel[1].dedup_key, "other");
}

#[test]
fn test_merge_preserves_existing_then_arrival_order() {
    let existing = vec![keyed_doc("e1", "first"), keyed_doc("e2", "second")];
    let update = DocumentUpdate::Documents(vec![
        keyed_doc("n1", "third"),
        keyed_doc("e1", "dropped"),
        keyed_doc("n2", "fourth"),
    ]);
    let channel = merge_documents(&existing, &update);
    let keys: Vec<_> = channel.iter().map(|d| d.dedup_key.as_str()).collect();
    assert_eq!(keys, vec!["e1", "e2", "n1", "n2"]);
}

#[test]
fn test_content_equality_is_not_dedup() {
    let existing = vec![keyed_doc("a", "same words")];
    let update = DocumentUpdate::Documents(vec![keyed_doc("b", "same words")]);
    let channel = merge_documents(&existing, &update);
    assert_eq!(channel.len(), 2, "identical text with distinct keys is kept");
}

#[test]
fn test_reducer_never_mutates_existing() {
    let existing = vec![keyed_doc("a", "one")];
    let before = existing.clone();
    let _ = merge_documents(&existing, &DocumentUpdate::text("two"));
    let _ = merge_documents(&existing, &DocumentUpdate::Clear);
    assert_eq!(existing, before);
}

proptest! {
    /// Merging any already-keyed document list twice ends with the same
    /// channel as merging it once, and the channel never holds duplicate
    /// keys.
    #[test]
    fn prop_keyed_merge_idempotent(keys in proptest::collection::vec("[a-z]{1,8}", 0..20)) {
        let docs: Vec<Document> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| keyed_doc(key, &format!("content {i}")))
            .collect();
        let update = DocumentUpdate::Documents(docs);

        let once = merge_documents(&[], &update);
        let twice = merge_documents(&once, &update);
        prop_assert_eq!(&once, &twice);

        let unique: std::collections::HashSet<_> =
            once.iter().map(|d| d.dedup_key.clone()).collect();
        prop_assert_eq!(unique.len(), once.len());
    }
}

/********************
 * Message merge-by-id
 ********************/

#[test]
fn test_message_merge_replaces_in_place() {
    let existing = vec![
        Message::user("x").with_id("a"),
        Message::assistant("keep").with_id("b"),
    ];
    let update = vec![Message::user("y").with_id("a")];

    let merged = merge_messages(&existing, &update);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].id, "a");
    assert_eq!(merged[0].content, "y", "content replaced");
    assert_eq!(merged[1].content, "keep", "siblings untouched");
}

#[test]
fn test_message_merge_appends_unknown_ids() {
    let existing = vec![Message::user("hello").with_id("a")];
    let update = vec![
        Message::assistant("answer").with_id("b"),
        Message::assistant("revised answer").with_id("b"),
    ];
    let merged = merge_messages(&existing, &update);
    // Second update item re-merges by id against the first.
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[1].content, "revised answer");
}

/********************
 * Scalar reducers
 ********************/

#[test]
fn test_answer_coercion_shapes() {
    assert_eq!(coerce_answer("", &json!("text")), "text");
    assert_eq!(coerce_answer("", &json!(42)), "42");
    assert_eq!(coerce_answer("", &json!(["a", "b"])), r#"["a","b"]"#);
    assert_eq!(coerce_answer("old", &json!(null)), "old");
}
