//! Research step node: runs the research sub-graph for the head step.

use async_trait::async_trait;
use std::sync::Arc;

use crate::app::App;
use crate::channels::Channel;
use crate::document::DocumentUpdate;
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{ConversationPartial, ConversationSnapshot, ConversationState, ResearchState};

/// Pops the head research step, invokes the nested research graph
/// against a fresh sub-state, and translates the sub-state channels back
/// into parent channel names itself — channel translation between parent
/// and sub-graph is the calling node's job, never automatic.
///
/// Each invocation shrinks `steps` by exactly one element (the head);
/// the conditional router on this node loops it until the list drains.
pub struct ConductResearchNode {
    research: Arc<App<ResearchState>>,
}

impl ConductResearchNode {
    #[must_use]
    pub fn new(research: Arc<App<ResearchState>>) -> Self {
        Self { research }
    }
}

#[async_trait]
impl Node<ConversationState> for ConductResearchNode {
    async fn run(
        &self,
        snapshot: ConversationSnapshot,
        ctx: NodeContext<ConversationState>,
    ) -> Result<ConversationPartial, NodeError> {
        let Some(step_text) = snapshot.steps.first() else {
            return Err(NodeError::MissingInput { what: "steps" });
        };

        ctx.emit("research", format!("researching step '{step_text}'"));

        let sub_state = ResearchState::for_question(step_text);
        let final_state = self
            .research
            .invoke_with_config(sub_state, ctx.config().clone())
            .await
            .map_err(|error| NodeError::Subgraph {
                message: error.to_string(),
            })?;

        let documents = final_state.documents.snapshot();
        ctx.emit(
            "research",
            format!("step complete: {} documents gathered", documents.len()),
        );

        Ok(ConversationPartial::new()
            .with_documents(DocumentUpdate::Documents(documents))
            .with_steps(snapshot.steps[1..].to_vec()))
    }
}
