//! Model provider interface and provider/model resolution.
//!
//! Providers are selected from a `provider/model-name` string in the run
//! configuration, resolved against a [`ModelRegistry`]. An unsupported
//! provider fails with a named
//! [`ConfigurationError`](crate::config::ConfigurationError) — never a
//! silent fallback to some default model.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ConfigurationError;
use crate::message::Message;

/// Failure reported by a model provider call.
#[derive(Debug, Error)]
#[error("{provider}: {message}")]
pub struct ProviderError {
    pub provider: String,
    pub message: String,
}

impl ProviderError {
    #[must_use]
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl From<ProviderError> for crate::node::NodeError {
    fn from(err: ProviderError) -> Self {
        Self::Provider {
            provider: err.provider,
            message: err.message,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

/// Plain completion result.
#[derive(Clone, Debug, Default)]
pub struct ModelResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Per-call options; everything is optional and provider-interpreted.
#[derive(Clone, Debug, Default)]
pub struct InvokeOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Interface to a chat model, already bound to a concrete model name.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Plain chat completion.
    async fn invoke(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> Result<ModelResponse, ProviderError>;

    /// Structured-output completion: the returned value conforms to the
    /// given JSON schema (providers are expected to enforce this; the
    /// caller still validates the shape it needs).
    async fn invoke_structured(
        &self,
        messages: &[Message],
        schema: &Value,
    ) -> Result<Value, ProviderError>;
}

/// Factory producing a provider bound to a model name.
pub type ProviderFactory = Arc<dyn Fn(&str) -> Arc<dyn ModelProvider> + Send + Sync>;

/// Registry mapping provider names to factories.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ragloom::providers::ModelRegistry;
///
/// let registry = ModelRegistry::new();
/// assert!(registry.resolve("openai/gpt-4o").is_err()); // nothing registered
/// ```
#[derive(Clone, Default)]
pub struct ModelRegistry {
    factories: FxHashMap<String, ProviderFactory>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider factory under a name (e.g. `"openai"`).
    #[must_use]
    pub fn with_provider(mut self, name: impl Into<String>, factory: ProviderFactory) -> Self {
        self.factories.insert(name.into(), factory);
        self
    }

    /// Resolves a `provider/model-name` spec to a bound provider.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::MalformedModelSpec`] when the spec does not
    /// split on `/`, [`ConfigurationError::UnsupportedProvider`] when the
    /// provider name is not registered.
    pub fn resolve(&self, spec: &str) -> Result<Arc<dyn ModelProvider>, ConfigurationError> {
        let (provider, model) = split_model_spec(spec)?;
        let factory =
            self.factories
                .get(provider)
                .ok_or_else(|| ConfigurationError::UnsupportedProvider {
                    provider: provider.to_string(),
                })?;
        Ok(factory(model))
    }
}

/// Splits `provider/model-name` into its two segments.
pub fn split_model_spec(spec: &str) -> Result<(&str, &str), ConfigurationError> {
    match spec.split_once('/') {
        Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
            Ok((provider, model))
        }
        _ => Err(ConfigurationError::MalformedModelSpec {
            spec: spec.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullProvider;

    #[async_trait]
    impl ModelProvider for NullProvider {
        async fn invoke(
            &self,
            _: &[Message],
            _: &InvokeOptions,
        ) -> Result<ModelResponse, ProviderError> {
            Ok(ModelResponse::default())
        }

        async fn invoke_structured(
            &self,
            _: &[Message],
            _: &Value,
        ) -> Result<Value, ProviderError> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn test_split_model_spec() {
        assert_eq!(
            split_model_spec("openai/gpt-4o-mini").unwrap(),
            ("openai", "gpt-4o-mini")
        );
        // Model names may themselves contain slashes.
        assert_eq!(
            split_model_spec("fireworks/accounts/x/models/y").unwrap(),
            ("fireworks", "accounts/x/models/y")
        );
        assert!(matches!(
            split_model_spec("bare"),
            Err(ConfigurationError::MalformedModelSpec { .. })
        ));
        assert!(matches!(
            split_model_spec("/model"),
            Err(ConfigurationError::MalformedModelSpec { .. })
        ));
    }

    #[test]
    fn test_resolve_known_and_unknown_provider() {
        let registry = ModelRegistry::new()
            .with_provider("openai", Arc::new(|_model| Arc::new(NullProvider)));

        assert!(registry.resolve("openai/gpt-4o").is_ok());
        assert!(matches!(
            registry.resolve("nope/x"),
            Err(ConfigurationError::UnsupportedProvider { provider }) if provider == "nope"
        ));
    }
}
