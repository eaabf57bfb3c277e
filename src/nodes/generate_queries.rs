//! Query generation node of the research graph.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::providers::{resolve_prompt, ModelProvider, PromptSource};
use crate::state::{ResearchPartial, ResearchSnapshot, ResearchState};

/// Prompt name looked up on the prompt source.
pub const QUERIES_PROMPT_NAME: &str = "generate_queries";

pub(crate) const DEFAULT_QUERIES_PROMPT: &str = "\
Generate diverse search queries for the research question. Each query \
should target a different aspect or phrasing. Respond with JSON: \
{\"queries\": [\"...\"]}.";

fn queries_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "queries": {
                "type": "array",
                "items": {"type": "string"}
            }
        },
        "required": ["queries"]
    })
}

/// Turns a research question into search queries, capped at the run
/// configuration's `max_research_queries`. The router on this node fans
/// the queries out to one retrieval branch each.
pub struct GenerateQueriesNode {
    model: Arc<dyn ModelProvider>,
    prompts: Option<Arc<dyn PromptSource>>,
}

impl GenerateQueriesNode {
    #[must_use]
    pub fn new(model: Arc<dyn ModelProvider>, prompts: Option<Arc<dyn PromptSource>>) -> Self {
        Self { model, prompts }
    }
}

#[async_trait]
impl Node<ResearchState> for GenerateQueriesNode {
    async fn run(
        &self,
        snapshot: ResearchSnapshot,
        ctx: NodeContext<ResearchState>,
    ) -> Result<ResearchPartial, NodeError> {
        if snapshot.question.trim().is_empty() {
            return Err(NodeError::MissingInput { what: "question" });
        }

        let prompt = resolve_prompt(
            self.prompts.as_deref(),
            ctx.config(),
            QUERIES_PROMPT_NAME,
            DEFAULT_QUERIES_PROMPT,
        )
        .await;

        let request = vec![Message::system(&prompt), Message::user(&snapshot.question)];
        let value = self
            .model
            .invoke_structured(&request, &queries_schema())
            .await?;
        let mut queries = super::string_list(&value, "queries")?;
        queries.truncate(ctx.config().max_research_queries);

        ctx.emit("queries", format!("generated {} search queries", queries.len()));

        Ok(ResearchPartial::new().with_queries(queries))
    }
}
