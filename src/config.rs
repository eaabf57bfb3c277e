//! Per-run configuration handed to every node.
//!
//! A [`RunConfig`] is immutable for the duration of one run and is not
//! part of graph state: it travels inside the
//! [`NodeContext`](crate::node::NodeContext) as an explicit parameter, so
//! there is no ambient execution context for nodes to reach into.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Fatal configuration problems, surfaced immediately and never retried.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigurationError {
    /// The provider segment of a `provider/model-name` spec is not
    /// registered.
    #[error("unsupported model provider: {provider}")]
    #[diagnostic(
        code(ragloom::config::unsupported_provider),
        help("Register the provider on the ModelRegistry, or fix the model spec.")
    )]
    UnsupportedProvider { provider: String },

    /// A model spec that does not split into `provider/model-name`.
    #[error("malformed model spec '{spec}': expected 'provider/model-name'")]
    #[diagnostic(code(ragloom::config::malformed_model_spec))]
    MalformedModelSpec { spec: String },

    /// A required configuration value is absent.
    #[error("missing required configuration value: {what}")]
    #[diagnostic(code(ragloom::config::missing_value))]
    MissingValue { what: &'static str },
}

/// Configuration for one run: model identifiers, search parameters, and
/// optional inline prompt overrides.
///
/// Model identifiers use the `provider/model-name` form and are resolved
/// against a [`ModelRegistry`](crate::providers::ModelRegistry); an
/// unsupported provider fails with a named [`ConfigurationError`], never
/// a silent fallback.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Model used by the planning node.
    pub plan_model: String,
    /// Model used to generate research queries.
    pub query_model: String,
    /// Model used to synthesize the final answer.
    pub answer_model: String,
    /// Upper bound on generated search queries per research step.
    pub max_research_queries: usize,
    /// How many documents to request from the retriever per query.
    pub retrieval_top_k: usize,
    /// Inline prompt text keyed by prompt name; takes precedence over the
    /// prompt-source collaborator.
    pub prompt_overrides: FxHashMap<String, String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            plan_model: "openai/gpt-4o-mini".to_string(),
            query_model: "openai/gpt-4o-mini".to_string(),
            answer_model: "openai/gpt-4o".to_string(),
            max_research_queries: 3,
            retrieval_top_k: 4,
            prompt_overrides: FxHashMap::default(),
        }
    }
}

impl RunConfig {
    /// Returns the inline prompt override for `name`, if configured.
    #[must_use]
    pub fn prompt_override(&self, name: &str) -> Option<&str> {
        self.prompt_overrides.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn with_prompt_override(
        mut self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.prompt_overrides.insert(name.into(), text.into());
        self
    }
}
