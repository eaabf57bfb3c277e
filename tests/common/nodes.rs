use async_trait::async_trait;
use std::time::Duration;

use ragloom::document::{Document, DocumentUpdate};
use ragloom::message::Message;
use ragloom::node::{Node, NodeContext, NodeError};
use ragloom::state::{
    ConversationPartial, ConversationSnapshot, ConversationState, ResearchPartial,
    ResearchSnapshot, ResearchState,
};

/// Appends one assistant message with fixed content.
pub struct SayNode {
    pub content: &'static str,
}

impl SayNode {
    pub fn new(content: &'static str) -> Self {
        Self { content }
    }
}

#[async_trait]
impl Node<ConversationState> for SayNode {
    async fn run(
        &self,
        _snapshot: ConversationSnapshot,
        _ctx: NodeContext<ConversationState>,
    ) -> Result<ConversationPartial, NodeError> {
        Ok(ConversationPartial::new().with_messages(vec![Message::assistant(self.content)]))
    }
}

/// Records how many messages it observed into its answer update, to
/// verify that sequential nodes see fully-merged prior state.
pub struct CountMessagesNode;

#[async_trait]
impl Node<ConversationState> for CountMessagesNode {
    async fn run(
        &self,
        snapshot: ConversationSnapshot,
        _ctx: NodeContext<ConversationState>,
    ) -> Result<ConversationPartial, NodeError> {
        Ok(ConversationPartial::new().with_answer(format!("saw {}", snapshot.messages.len())))
    }
}

/// Removes the head of the step list; the usual loop workhorse.
pub struct PopStepNode;

#[async_trait]
impl Node<ConversationState> for PopStepNode {
    async fn run(
        &self,
        snapshot: ConversationSnapshot,
        _ctx: NodeContext<ConversationState>,
    ) -> Result<ConversationPartial, NodeError> {
        let remaining = snapshot.steps.get(1..).unwrap_or_default().to_vec();
        Ok(ConversationPartial::new().with_steps(remaining))
    }
}

/// Seeds the research queries channel with a fixed list.
pub struct SeedQueriesNode {
    pub queries: Vec<String>,
}

impl SeedQueriesNode {
    pub fn new(queries: &[&str]) -> Self {
        Self {
            queries: queries.iter().map(|q| q.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Node<ResearchState> for SeedQueriesNode {
    async fn run(
        &self,
        _snapshot: ResearchSnapshot,
        _ctx: NodeContext<ResearchState>,
    ) -> Result<ResearchPartial, NodeError> {
        Ok(ResearchPartial::new().with_queries(self.queries.clone()))
    }
}

/// Fan-out branch node returning one keyed document per query after a
/// per-branch delay, so completion order can be forced out of
/// declaration order.
pub struct SlowRetrieveNode {
    /// Milliseconds of sleep per branch index; missing entries sleep 0.
    pub delays_ms: Vec<u64>,
}

impl SlowRetrieveNode {
    pub fn new(delays_ms: &[u64]) -> Self {
        Self {
            delays_ms: delays_ms.to_vec(),
        }
    }
}

#[async_trait]
impl Node<ResearchState> for SlowRetrieveNode {
    async fn run(
        &self,
        snapshot: ResearchSnapshot,
        _ctx: NodeContext<ResearchState>,
    ) -> Result<ResearchPartial, NodeError> {
        let Some(query) = snapshot.current_query() else {
            return Err(NodeError::MissingInput { what: "queries" });
        };
        let delay = self
            .delays_ms
            .get(snapshot.query_index)
            .copied()
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let document = Document::new(
            format!("document for {query}"),
            serde_json::Map::new(),
            format!("key-{query}"),
        );
        Ok(ResearchPartial::new().with_documents(DocumentUpdate::Documents(vec![document])))
    }
}

/// Fan-out branch node that fails on one chosen branch index and returns
/// a document on every other.
pub struct FailingRetrieveNode {
    pub fail_index: usize,
}

#[async_trait]
impl Node<ResearchState> for FailingRetrieveNode {
    async fn run(
        &self,
        snapshot: ResearchSnapshot,
        _ctx: NodeContext<ResearchState>,
    ) -> Result<ResearchPartial, NodeError> {
        let Some(query) = snapshot.current_query() else {
            return Err(NodeError::MissingInput { what: "queries" });
        };
        if snapshot.query_index == self.fail_index {
            return Err(NodeError::Retrieval {
                query: query.to_string(),
                message: "connection reset".to_string(),
            });
        }
        let document = Document::new(
            format!("document for {query}"),
            serde_json::Map::new(),
            format!("key-{query}"),
        );
        Ok(ResearchPartial::new().with_documents(DocumentUpdate::Documents(vec![document])))
    }
}
