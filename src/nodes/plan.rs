//! Planning node: turns the user's question into research steps.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::document::DocumentUpdate;
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::providers::{resolve_prompt, ModelProvider, PromptSource};
use crate::state::{ConversationPartial, ConversationSnapshot, ConversationState};

/// Prompt name looked up on the prompt source.
pub const PLAN_PROMPT_NAME: &str = "plan";

pub(crate) const DEFAULT_PLAN_PROMPT: &str = "\
You are a research planner. Break the user's question into a short list \
of concrete research steps. Each step should be a self-contained question \
a retrieval system can answer. Prefer two to four steps; use one step for \
trivial questions. Respond with JSON: {\"steps\": [\"...\"]}.";

fn steps_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "steps": {
                "type": "array",
                "items": {"type": "string"}
            }
        },
        "required": ["steps"]
    })
}

/// Plans a research run: emits the step list, clears the document
/// channel so the new plan starts from an empty set, and pins the query.
pub struct PlanNode {
    model: Arc<dyn ModelProvider>,
    prompts: Option<Arc<dyn PromptSource>>,
}

impl PlanNode {
    #[must_use]
    pub fn new(model: Arc<dyn ModelProvider>, prompts: Option<Arc<dyn PromptSource>>) -> Self {
        Self { model, prompts }
    }
}

#[async_trait]
impl Node<ConversationState> for PlanNode {
    async fn run(
        &self,
        snapshot: ConversationSnapshot,
        ctx: NodeContext<ConversationState>,
    ) -> Result<ConversationPartial, NodeError> {
        let question = if !snapshot.query.trim().is_empty() {
            snapshot.query.clone()
        } else {
            snapshot
                .messages
                .iter()
                .rev()
                .find(|m| m.has_role(Message::USER))
                .map(|m| m.content.clone())
                .ok_or(NodeError::MissingInput { what: "query" })?
        };

        let prompt = resolve_prompt(
            self.prompts.as_deref(),
            ctx.config(),
            PLAN_PROMPT_NAME,
            DEFAULT_PLAN_PROMPT,
        )
        .await;

        let request = vec![Message::system(&prompt), Message::user(&question)];
        let value = self
            .model
            .invoke_structured(&request, &steps_schema())
            .await?;
        let steps = super::string_list(&value, "steps")?;
        if steps.is_empty() {
            return Err(NodeError::MalformedOutput(
                "planner returned no research steps".to_string(),
            ));
        }

        ctx.emit("plan", format!("planned {} research steps", steps.len()));

        Ok(ConversationPartial::new()
            .with_steps(steps)
            .with_documents(DocumentUpdate::Clear)
            .with_query(question))
    }
}
