//! Typed graph state: channels, partial updates, and snapshots.
//!
//! Two concrete states exist, related by containment in the assistant
//! flow:
//!
//! - [`ConversationState`]: the per-turn state of the outer conversation
//!   graph (`messages`, `steps`, `documents`, `answer`, `query`)
//! - [`ResearchState`]: the sub-state the research graph runs against
//!   (`question`, `queries`, `documents`, `query_index`)
//!
//! Both implement [`GraphState`], the contract the executor works
//! through: take an immutable [`snapshot`](GraphState::snapshot) for a
//! node, then [`apply`](GraphState::apply) the node's partial update
//! through each channel's reducer. Nodes only ever see snapshots; the
//! state itself is owned exclusively by the executor between node
//! invocations, and fan-out branches receive independent snapshot copies.
//!
//! # Examples
//!
//! ```rust
//! use ragloom::state::{ConversationState, GraphState};
//!
//! let state = ConversationState::builder()
//!     .with_user_message("What is a dedup key?")
//!     .with_query("What is a dedup key?")
//!     .build();
//!
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.messages.len(), 1);
//! assert_eq!(snapshot.query, "What is a dedup key?");
//! assert!(snapshot.answer.is_empty());
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::channels::{Channel, TypedChannel};
use crate::document::{Document, DocumentUpdate};
use crate::message::Message;
use crate::reducers::{coerce_answer, merge_documents, merge_messages};

/// Contract between a state type and the executor.
///
/// `apply` merges a partial update through the per-channel reducers and
/// reports which channels actually changed (the executor uses the report
/// for version bumps, events, and tracing). `snapshot` produces the
/// immutable view handed to nodes.
pub trait GraphState: Clone + Send + Sync + 'static {
    /// The partial-update type nodes of this state return.
    type Partial: Clone + std::fmt::Debug + Default + Send + Sync + 'static;
    /// The immutable view handed to nodes and used as fan-out payloads.
    type Snapshot: Clone + Send + Sync + 'static;

    /// Clones an immutable point-in-time view of every channel.
    fn snapshot(&self) -> Self::Snapshot;

    /// Merges a partial update into the state through each channel's
    /// reducer, bumping the version of every channel whose content
    /// changed, and returns the names of the changed channels.
    fn apply(&mut self, partial: &Self::Partial) -> Vec<&'static str>;
}

// ---------------------------------------------------------------------------
// Conversation state
// ---------------------------------------------------------------------------

/// Shared state of the outer conversation graph.
///
/// Channel semantics:
/// - `messages`: merged by message id (replace in place / append)
/// - `steps`: replaced wholesale on update; never appended
/// - `documents`: dedup-by-key accumulation, [`DocumentUpdate::Clear`]
///   resets
/// - `answer`: last-write-wins, always coerced to string
/// - `query`: last-write-wins string
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationState {
    pub messages: TypedChannel<Vec<Message>>,
    pub steps: TypedChannel<Vec<String>>,
    pub documents: TypedChannel<Vec<Document>>,
    pub answer: TypedChannel<String>,
    pub query: TypedChannel<String>,
}

/// Immutable view of a [`ConversationState`] at a point in time.
#[derive(Clone, Debug)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub steps: Vec<String>,
    pub documents: Vec<Document>,
    pub answer: String,
    pub query: String,
}

/// Partial update returned by conversation-graph nodes.
///
/// All fields are optional: a node returns only the channels it intends
/// to update, and omitted channels are left untouched.
///
/// # Examples
///
/// ```
/// use ragloom::state::ConversationPartial;
/// use ragloom::document::DocumentUpdate;
///
/// let partial = ConversationPartial::new()
///     .with_steps(vec!["step1".into(), "step2".into()])
///     .with_documents(DocumentUpdate::Clear);
/// assert!(partial.messages.is_none());
/// ```
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversationPartial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl ConversationPartial {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    #[must_use]
    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = Some(steps);
        self
    }

    #[must_use]
    pub fn with_documents(mut self, update: DocumentUpdate) -> Self {
        self.documents = Some(update);
        self
    }

    #[must_use]
    pub fn with_answer(mut self, answer: impl Into<Value>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            messages: TypedChannel::default(),
            steps: TypedChannel::default(),
            documents: TypedChannel::default(),
            answer: TypedChannel::default(),
            query: TypedChannel::default(),
        }
    }
}

impl ConversationState {
    /// Creates a state seeded with a single user message, the usual entry
    /// point for a turn.
    #[must_use]
    pub fn new_with_user_message(user_text: &str) -> Self {
        Self::builder()
            .with_user_message(user_text)
            .with_query(user_text)
            .build()
    }

    /// Creates a builder for assembling an initial state.
    #[must_use]
    pub fn builder() -> ConversationStateBuilder {
        ConversationStateBuilder::default()
    }
}

impl GraphState for ConversationState {
    type Partial = ConversationPartial;
    type Snapshot = ConversationSnapshot;

    fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: self.messages.snapshot(),
            steps: self.steps.snapshot(),
            documents: self.documents.snapshot(),
            answer: self.answer.snapshot(),
            query: self.query.snapshot(),
        }
    }

    fn apply(&mut self, partial: &ConversationPartial) -> Vec<&'static str> {
        let mut updated = Vec::new();

        if let Some(messages) = &partial.messages
            && !messages.is_empty()
        {
            let merged = merge_messages(self.messages.get(), messages);
            if merged != *self.messages.get() {
                bump(&mut self.messages);
                self.messages.set(merged);
                updated.push("messages");
            }
        }

        // Presence alone is a wholesale replace; an empty list is a legal
        // replacement (the research loop drains steps to []).
        if let Some(steps) = &partial.steps
            && steps != self.steps.get()
        {
            bump(&mut self.steps);
            self.steps.set(steps.clone());
            updated.push("steps");
        }

        if let Some(update) = &partial.documents {
            let merged = merge_documents(self.documents.get(), update);
            if merged != *self.documents.get() {
                bump(&mut self.documents);
                self.documents.set(merged);
                updated.push("documents");
            }
        }

        if let Some(answer) = &partial.answer {
            let coerced = coerce_answer(self.answer.get(), answer);
            if coerced != *self.answer.get() {
                bump(&mut self.answer);
                self.answer.set(coerced);
                updated.push("answer");
            }
        }

        if let Some(query) = &partial.query
            && query != self.query.get()
        {
            bump(&mut self.query);
            self.query.set(query.clone());
            updated.push("query");
        }

        updated
    }
}

/// Builder for constructing a [`ConversationState`] with a fluent API.
///
/// # Examples
///
/// ```
/// use ragloom::state::{ConversationState, GraphState};
///
/// let state = ConversationState::builder()
///     .with_system_message("You are a research assistant")
///     .with_user_message("Compare flume and tokio channels")
///     .build();
///
/// assert_eq!(state.snapshot().messages.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ConversationStateBuilder {
    messages: Vec<Message>,
    steps: Vec<String>,
    query: String,
}

impl ConversationStateBuilder {
    #[must_use]
    pub fn with_user_message(mut self, content: &str) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    #[must_use]
    pub fn with_assistant_message(mut self, content: &str) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    #[must_use]
    pub fn with_system_message(mut self, content: &str) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    #[must_use]
    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn build(self) -> ConversationState {
        ConversationState {
            messages: TypedChannel::new(self.messages, 1),
            steps: TypedChannel::new(self.steps, 1),
            documents: TypedChannel::default(),
            answer: TypedChannel::default(),
            query: TypedChannel::new(self.query, 1),
        }
    }
}

// ---------------------------------------------------------------------------
// Research sub-state
// ---------------------------------------------------------------------------

/// Sub-state the research graph runs against.
///
/// `query_index` exists only to correlate a fan-out branch with the
/// query it retrieves for; it carries no other meaning.
#[derive(Clone, Debug, PartialEq)]
pub struct ResearchState {
    pub question: TypedChannel<String>,
    pub queries: TypedChannel<Vec<String>>,
    pub documents: TypedChannel<Vec<Document>>,
    pub query_index: TypedChannel<usize>,
}

/// Immutable view of a [`ResearchState`], also used as the fan-out
/// payload handed to each retrieval branch.
#[derive(Clone, Debug)]
pub struct ResearchSnapshot {
    pub question: String,
    pub queries: Vec<String>,
    pub documents: Vec<Document>,
    pub query_index: usize,
}

impl ResearchSnapshot {
    /// Derives the isolated payload for one fan-out branch: same question
    /// and query list, empty document set, branch-specific index.
    #[must_use]
    pub fn for_branch(&self, query_index: usize) -> Self {
        Self {
            question: self.question.clone(),
            queries: self.queries.clone(),
            documents: Vec::new(),
            query_index,
        }
    }

    /// The query this snapshot's `query_index` points at, if any.
    #[must_use]
    pub fn current_query(&self) -> Option<&str> {
        self.queries.get(self.query_index).map(String::as_str)
    }
}

/// Partial update returned by research-graph nodes.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResearchPartial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_index: Option<usize>,
}

impl ResearchPartial {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    #[must_use]
    pub fn with_queries(mut self, queries: Vec<String>) -> Self {
        self.queries = Some(queries);
        self
    }

    #[must_use]
    pub fn with_documents(mut self, update: DocumentUpdate) -> Self {
        self.documents = Some(update);
        self
    }

    #[must_use]
    pub fn with_query_index(mut self, index: usize) -> Self {
        self.query_index = Some(index);
        self
    }
}

impl Default for ResearchState {
    fn default() -> Self {
        Self {
            question: TypedChannel::default(),
            queries: TypedChannel::default(),
            documents: TypedChannel::default(),
            query_index: TypedChannel::default(),
        }
    }
}

impl ResearchState {
    /// Creates a state for researching a single question.
    #[must_use]
    pub fn for_question(question: &str) -> Self {
        let mut state = Self::default();
        state.question.set(question.to_string());
        state
    }
}

impl GraphState for ResearchState {
    type Partial = ResearchPartial;
    type Snapshot = ResearchSnapshot;

    fn snapshot(&self) -> ResearchSnapshot {
        ResearchSnapshot {
            question: self.question.snapshot(),
            queries: self.queries.snapshot(),
            documents: self.documents.snapshot(),
            query_index: self.query_index.snapshot(),
        }
    }

    fn apply(&mut self, partial: &ResearchPartial) -> Vec<&'static str> {
        let mut updated = Vec::new();

        if let Some(question) = &partial.question
            && question != self.question.get()
        {
            bump(&mut self.question);
            self.question.set(question.clone());
            updated.push("question");
        }

        if let Some(queries) = &partial.queries
            && queries != self.queries.get()
        {
            bump(&mut self.queries);
            self.queries.set(queries.clone());
            updated.push("queries");
        }

        if let Some(update) = &partial.documents {
            let merged = merge_documents(self.documents.get(), update);
            if merged != *self.documents.get() {
                bump(&mut self.documents);
                self.documents.set(merged);
                updated.push("documents");
            }
        }

        if let Some(index) = &partial.query_index
            && index != self.query_index.get()
        {
            bump(&mut self.query_index);
            self.query_index.set(*index);
            updated.push("query_index");
        }

        updated
    }
}

fn bump<T: Clone>(channel: &mut TypedChannel<T>) {
    let version = channel.version();
    channel.set_version(version.saturating_add(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_reports_only_changed_channels() {
        let mut state = ConversationState::new_with_user_message("q");
        let partial = ConversationPartial::new()
            .with_steps(vec!["a".into()])
            .with_query("q");
        // query is unchanged, steps changes
        assert_eq!(state.apply(&partial), vec!["steps"]);
    }

    #[test]
    fn test_apply_bumps_versions_on_change() {
        let mut state = ConversationState::default();
        let before = state.documents.version();
        state.apply(&ConversationPartial::new().with_documents(DocumentUpdate::text("d")));
        assert_eq!(state.documents.version(), before + 1);

        // Clearing an already-empty channel is not a change.
        let before = state.messages.version();
        state.apply(&ConversationPartial::new().with_messages(vec![]));
        assert_eq!(state.messages.version(), before);
    }

    #[test]
    fn test_steps_replace_accepts_empty_list() {
        let mut state = ConversationState::builder()
            .with_steps(vec!["s1".into(), "s2".into()])
            .build();
        state.apply(&ConversationPartial::new().with_steps(vec![]));
        assert!(state.steps.get().is_empty());
    }

    #[test]
    fn test_answer_coercion_on_apply() {
        let mut state = ConversationState::default();
        state.apply(&ConversationPartial::new().with_answer(json!({"verdict": true})));
        assert_eq!(state.answer.get(), r#"{"verdict":true}"#);
    }

    #[test]
    fn test_research_branch_payload_is_isolated() {
        let mut state = ResearchState::for_question("why");
        state.apply(
            &ResearchPartial::new()
                .with_queries(vec!["q0".into(), "q1".into()])
                .with_documents(DocumentUpdate::text("seed")),
        );
        let snapshot = state.snapshot();
        let branch = snapshot.for_branch(1);
        assert_eq!(branch.current_query(), Some("q1"));
        assert!(branch.documents.is_empty());
        assert_eq!(snapshot.documents.len(), 1);
    }
}
