//! Answer synthesis node.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::providers::{resolve_prompt, InvokeOptions, ModelProvider, PromptSource};
use crate::state::{ConversationPartial, ConversationSnapshot, ConversationState};

/// Prompt name looked up on the prompt source.
pub const RESPOND_PROMPT_NAME: &str = "respond";

pub(crate) const DEFAULT_RESPOND_PROMPT: &str = "\
You are a research assistant. Answer the user's question using only the \
retrieved context below. Cite sources inline where they exist. If the \
context does not contain the answer, say so plainly.";

/// Synthesizes the final answer from the accumulated documents and the
/// conversation history, appending one assistant message with a stable
/// id alongside the answer channel update.
pub struct RespondNode {
    model: Arc<dyn ModelProvider>,
    prompts: Option<Arc<dyn PromptSource>>,
}

impl RespondNode {
    #[must_use]
    pub fn new(model: Arc<dyn ModelProvider>, prompts: Option<Arc<dyn PromptSource>>) -> Self {
        Self { model, prompts }
    }
}

#[async_trait]
impl Node<ConversationState> for RespondNode {
    async fn run(
        &self,
        snapshot: ConversationSnapshot,
        ctx: NodeContext<ConversationState>,
    ) -> Result<ConversationPartial, NodeError> {
        let prompt = resolve_prompt(
            self.prompts.as_deref(),
            ctx.config(),
            RESPOND_PROMPT_NAME,
            DEFAULT_RESPOND_PROMPT,
        )
        .await;

        let mut system_text = prompt;
        if snapshot.documents.is_empty() {
            system_text.push_str("\n\n<context>\n(no documents retrieved)\n</context>");
        } else {
            system_text.push_str("\n\n<context>\n");
            for document in &snapshot.documents {
                let source = document
                    .metadata
                    .get("source")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let _ = writeln!(system_text, "[{source}] {}", document.content);
            }
            system_text.push_str("</context>");
        }

        let mut request = vec![Message::system(&system_text)];
        request.extend(snapshot.messages.iter().cloned());

        let response = self
            .model
            .invoke(&request, &InvokeOptions::default())
            .await?;
        if response.content.trim().is_empty() {
            return Err(NodeError::MalformedOutput(
                "answer model returned empty content".to_string(),
            ));
        }

        ctx.emit(
            "respond",
            format!(
                "answer synthesized from {} documents",
                snapshot.documents.len()
            ),
        );

        let answer_message = Message::assistant(&response.content);
        Ok(ConversationPartial::new()
            .with_answer(response.content)
            .with_messages(vec![answer_message]))
    }
}
