//! Prompt source interface with silent built-in fallback.
//!
//! Nodes ask for their prompt by name. Resolution order: an inline
//! override from the run configuration, then the prompt-source
//! collaborator, then the node's built-in default. A failing or empty
//! collaborator response falls back silently — it is logged, never
//! thrown, because a missing template must not take down a run.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::config::RunConfig;

/// Failure reported by a prompt source.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt '{name}' not found")]
    NotFound { name: String },

    #[error("prompt source failure: {0}")]
    Source(String),
}

/// Interface to a prompt template store.
#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn get_prompt(&self, name: &str) -> Result<String, PromptError>;
}

/// In-memory prompt source backed by a name → text map.
#[derive(Clone, Debug, Default)]
pub struct StaticPrompts {
    prompts: FxHashMap<String, String>,
}

impl StaticPrompts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prompt(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.prompts.insert(name.into(), text.into());
        self
    }
}

#[async_trait]
impl PromptSource for StaticPrompts {
    async fn get_prompt(&self, name: &str) -> Result<String, PromptError> {
        self.prompts
            .get(name)
            .cloned()
            .ok_or_else(|| PromptError::NotFound {
                name: name.to_string(),
            })
    }
}

/// Resolves the prompt text a node should use.
///
/// Checks the run configuration's inline override first, then the
/// collaborator; a failure or an empty template falls back to `default`
/// with a warning.
pub async fn resolve_prompt(
    source: Option<&dyn PromptSource>,
    config: &RunConfig,
    name: &str,
    default: &str,
) -> String {
    if let Some(text) = config.prompt_override(name) {
        return text.to_string();
    }

    if let Some(source) = source {
        match source.get_prompt(name).await {
            Ok(text) if !text.trim().is_empty() => return text,
            Ok(_) => {
                tracing::warn!(prompt = name, "prompt source returned empty text, using built-in default");
            }
            Err(error) => {
                tracing::warn!(prompt = name, %error, "prompt source failed, using built-in default");
            }
        }
    }

    default.to_string()
}
