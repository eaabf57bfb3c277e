//! End-to-end research run against in-memory collaborators.
//!
//! Run with: `cargo run --example research_loop`

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use ragloom::assistant::AssistantBuilder;
use ragloom::document::RawDocument;
use ragloom::message::Message;
use ragloom::providers::{
    InvokeOptions, ModelProvider, ModelRegistry, ModelResponse, ProviderError, Retriever,
    RetrieverError,
};
use ragloom::state::ConversationState;

/// Deterministic offline model: plans two steps, derives two queries per
/// question, and synthesizes a canned answer.
struct DemoModel;

#[async_trait]
impl ModelProvider for DemoModel {
    async fn invoke(
        &self,
        messages: &[Message],
        _options: &InvokeOptions,
    ) -> Result<ModelResponse, ProviderError> {
        let context_lines = messages
            .first()
            .map(|m| m.content.lines().count())
            .unwrap_or(0);
        Ok(ModelResponse {
            content: format!(
                "Based on {context_lines} lines of retrieved context: connect the \
                 client through the adapter layer and register its tools explicitly."
            ),
            tool_calls: vec![],
        })
    }

    async fn invoke_structured(
        &self,
        messages: &[Message],
        schema: &Value,
    ) -> Result<Value, ProviderError> {
        let wants = |field: &str| {
            schema
                .get("properties")
                .and_then(Value::as_object)
                .is_some_and(|props| props.contains_key(field))
        };
        let question = messages
            .iter()
            .rev()
            .find(|m| m.has_role(Message::USER))
            .map(|m| m.content.clone())
            .unwrap_or_default();

        if wants("steps") {
            Ok(json!({
                "steps": [
                    format!("{question} — core concepts"),
                    format!("{question} — configuration"),
                ]
            }))
        } else {
            Ok(json!({
                "queries": [format!("{question} docs"), format!("{question} tutorial")]
            }))
        }
    }
}

/// Offline retriever returning one stable document per query.
struct DemoRetriever;

#[async_trait]
impl Retriever for DemoRetriever {
    async fn retrieve(
        &self,
        query: &str,
        _top_k: usize,
    ) -> Result<Vec<RawDocument>, RetrieverError> {
        let mut item = RawDocument::new(format!("Reference material covering: {query}"));
        item.metadata
            .insert("source".to_string(), json!(format!("kb://{query}")));
        item.metadata.insert("title".to_string(), json!(query));
        Ok(vec![item])
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let registry = ModelRegistry::new()
        .with_provider("openai", Arc::new(|_model| Arc::new(DemoModel) as _));

    let app = AssistantBuilder::new(registry, Arc::new(DemoRetriever)).build()?;

    let final_state = app
        .invoke(ConversationState::new_with_user_message(
            "How to connect LangChain to MCP?",
        ))
        .await
        .map_err(miette::Report::from)?;

    println!("answer: {}\n", final_state.answer.get());
    println!("documents ({}):", final_state.documents.get().len());
    for document in final_state.documents.get() {
        println!("  [{}] {}", document.dedup_key, document.content);
    }
    Ok(())
}
