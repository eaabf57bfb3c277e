use crate::message::Message;

/// Merges messages by id: an update whose id already exists replaces the
/// earlier message in place (sequence position preserved); unknown ids
/// append in arrival order.
///
/// `existing` is never mutated; the result is always a new `Vec`.
///
/// # Examples
///
/// ```
/// use ragloom::message::Message;
/// use ragloom::reducers::merge_messages;
///
/// let existing = vec![Message::user("x").with_id("a")];
/// let update = vec![Message::user("y").with_id("a")];
///
/// let merged = merge_messages(&existing, &update);
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].content, "y");
/// ```
#[must_use]
pub fn merge_messages(existing: &[Message], update: &[Message]) -> Vec<Message> {
    let mut merged = existing.to_vec();
    for message in update {
        match merged.iter_mut().find(|m| m.id == message.id) {
            Some(slot) => *slot = message.clone(),
            None => merged.push(message.clone()),
        }
    }
    merged
}
