use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use ragloom::document::RawDocument;
use ragloom::message::Message;
use ragloom::providers::{
    InvokeOptions, ModelProvider, ModelRegistry, ModelResponse, ProviderError, Retriever,
    RetrieverError,
};

/// Deterministic model double for end-to-end runs.
///
/// Structured calls answer by requested shape: a `steps` schema yields
/// the scripted plan, a `queries` schema derives queries from the last
/// user message. Plain calls yield the scripted answer.
pub struct ScriptedModel {
    pub steps: Vec<String>,
    pub answer: String,
}

impl ScriptedModel {
    pub fn two_step() -> Self {
        Self {
            steps: vec!["step1".to_string(), "step2".to_string()],
            answer: "Use the MCP adapter package and register its tools with your agent."
                .to_string(),
        }
    }
}

#[async_trait]
impl ModelProvider for ScriptedModel {
    async fn invoke(
        &self,
        _messages: &[Message],
        _options: &InvokeOptions,
    ) -> Result<ModelResponse, ProviderError> {
        Ok(ModelResponse {
            content: self.answer.clone(),
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

        if wants("steps") {
            return Ok(json!({ "steps": self.steps }));
        }
        if wants("queries") {
            let question = messages
                .iter()
                .rev()
                .find(|m| m.has_role(Message::USER))
                .map(|m| m.content.clone())
                .unwrap_or_default();
            return Ok(json!({
                "queries": [format!("{question} overview"), format!("{question} setup")]
            }));
        }
        Err(ProviderError::new("scripted", "unrecognized schema"))
    }
}

/// Registry with the scripted model behind the `openai` provider name
/// the default configuration points at.
pub fn scripted_registry(model: ScriptedModel) -> ModelRegistry {
    let model = Arc::new(model);
    ModelRegistry::new().with_provider("openai", {
        let model = Arc::clone(&model);
        Arc::new(move |_model_name| model.clone() as Arc<dyn ModelProvider>)
    })
}

/// Retriever double returning one keyless document per query with stable
/// `source`/`title` metadata, so dedup keys derive deterministically.
pub struct StaticRetriever;

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(
        &self,
        query: &str,
        _top_k: usize,
    ) -> Result<Vec<RawDocument>, RetrieverError> {
        let mut item = RawDocument::new(format!("content about {query}"));
        item.metadata
            .insert("source".to_string(), json!(format!("https://docs/{query}")));
        item.metadata.insert("title".to_string(), json!(query));
        Ok(vec![item])
    }
}

/// Retriever double that always fails.
pub struct BrokenRetriever;

#[async_trait]
impl Retriever for BrokenRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        _top_k: usize,
    ) -> Result<Vec<RawDocument>, RetrieverError> {
        Err(RetrieverError::new("vector store unreachable"))
    }
}
