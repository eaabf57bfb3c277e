//! Retrieval node: one fan-out branch per generated query.

use async_trait::async_trait;
use std::sync::Arc;

use crate::document::DocumentUpdate;
use crate::node::{Node, NodeContext, NodeError};
use crate::providers::{documents_from_raw, Retriever};
use crate::state::{ResearchPartial, ResearchSnapshot, ResearchState};

/// Retrieves documents for the query its payload's `query_index` points
/// at. Runs as a fan-out sub-invocation against an isolated payload;
/// the dispatcher merges its documents into the parent research state in
/// declaration order.
pub struct RetrieveNode {
    retriever: Arc<dyn Retriever>,
}

impl RetrieveNode {
    #[must_use]
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Node<ResearchState> for RetrieveNode {
    async fn run(
        &self,
        snapshot: ResearchSnapshot,
        ctx: NodeContext<ResearchState>,
    ) -> Result<ResearchPartial, NodeError> {
        let Some(query) = snapshot.current_query() else {
            return Err(NodeError::MissingInput { what: "queries" });
        };

        let raw = self
            .retriever
            .retrieve(query, ctx.config().retrieval_top_k)
            .await
            .map_err(|error| NodeError::Retrieval {
                query: query.to_string(),
                message: error.to_string(),
            })?;
        let documents = documents_from_raw(raw);

        ctx.emit(
            "retrieve",
            format!("{} documents for '{query}'", documents.len()),
        );

        Ok(ResearchPartial::new().with_documents(DocumentUpdate::Documents(documents)))
    }
}
