//! Wiring of the two assistant graphs.
//!
//! Conversation graph:
//!
//! ```text
//! Start -> plan --router--> conduct_research ⟲ (while steps remain)
//!                        \-> respond -> End
//! ```
//!
//! Research graph (invoked per step by `conduct_research`):
//!
//! ```text
//! Start -> generate_queries --router--> FanOut(retrieve × N) -> End
//! ```
//!
//! Data flows exclusively through the shared state; nodes never call
//! each other directly. The research loop is a cycle through conditional
//! routing only — static edges in both graphs form a DAG.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ragloom::assistant::AssistantBuilder;
//! use ragloom::providers::ModelRegistry;
//! use ragloom::state::ConversationState;
//!
//! # async fn example(
//! #     registry: ModelRegistry,
//! #     retriever: Arc<dyn ragloom::providers::Retriever>,
//! # ) -> miette::Result<()> {
//! let app = AssistantBuilder::new(registry, retriever).build()?;
//!
//! let final_state = app
//!     .invoke(ConversationState::new_with_user_message(
//!         "How to connect LangChain to MCP?",
//!     ))
//!     .await
//!     .map_err(miette::Report::from)?;
//! # Ok(())
//! # }
//! ```

use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;

use crate::app::App;
use crate::config::{ConfigurationError, RunConfig};
use crate::graphs::{FanOutBranch, GraphBuilder, GraphCompileError, Route, RouterFn};
use crate::nodes::{
    ConductResearchNode, GenerateQueriesNode, PlanNode, RespondNode, RetrieveNode,
};
use crate::providers::{ModelRegistry, PromptSource, Retriever};
use crate::state::{ConversationState, ResearchState};

/// Conversation-graph node names.
pub const PLAN: &str = "plan";
pub const CONDUCT_RESEARCH: &str = "conduct_research";
pub const RESPOND: &str = "respond";

/// Research-graph node names.
pub const GENERATE_QUERIES: &str = "generate_queries";
pub const RETRIEVE: &str = "retrieve";

/// Errors raised while assembling the assistant graphs.
#[derive(Debug, Error, Diagnostic)]
pub enum AssistantBuildError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphCompileError),
}

/// Builder assembling the conversation graph (and its nested research
/// graph) from collaborator implementations and a run configuration.
pub struct AssistantBuilder {
    registry: ModelRegistry,
    retriever: Arc<dyn Retriever>,
    prompts: Option<Arc<dyn PromptSource>>,
    config: RunConfig,
}

impl AssistantBuilder {
    #[must_use]
    pub fn new(registry: ModelRegistry, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            registry,
            retriever,
            prompts: None,
            config: RunConfig::default(),
        }
    }

    /// Attaches a prompt-source collaborator. Optional: built-in prompt
    /// defaults apply without one.
    #[must_use]
    pub fn with_prompts(mut self, prompts: Arc<dyn PromptSource>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Overrides the default run configuration.
    #[must_use]
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolves models, compiles the research graph, then compiles and
    /// returns the conversation graph.
    ///
    /// # Errors
    ///
    /// Model specs with an unsupported provider fail immediately with a
    /// [`ConfigurationError`]; structural graph mistakes fail with a
    /// [`GraphCompileError`].
    pub fn build(self) -> Result<App<ConversationState>, AssistantBuildError> {
        let plan_model = self.registry.resolve(&self.config.plan_model)?;
        let query_model = self.registry.resolve(&self.config.query_model)?;
        let answer_model = self.registry.resolve(&self.config.answer_model)?;

        let research = GraphBuilder::new()
            .add_node(
                GENERATE_QUERIES,
                GenerateQueriesNode::new(query_model, self.prompts.clone()),
            )
            .add_node(RETRIEVE, RetrieveNode::new(Arc::clone(&self.retriever)))
            .add_edge("Start", GENERATE_QUERIES)
            .add_edge(GENERATE_QUERIES, "End")
            .add_router(GENERATE_QUERIES, fan_out_per_query())
            .with_run_config(self.config.clone())
            .compile()?;

        let conversation = GraphBuilder::new()
            .add_node(PLAN, PlanNode::new(plan_model, self.prompts.clone()))
            .add_node(
                CONDUCT_RESEARCH,
                ConductResearchNode::new(Arc::new(research)),
            )
            .add_node(RESPOND, RespondNode::new(answer_model, self.prompts))
            .add_edge("Start", PLAN)
            .add_edge(RESPOND, "End")
            .add_router(PLAN, research_loop_router())
            .add_router(CONDUCT_RESEARCH, research_loop_router())
            .with_run_config(self.config)
            .compile()?;

        Ok(conversation)
    }
}

/// Loop-or-done: keep researching while steps remain, else respond.
///
/// Attached to both `plan` and `conduct_research`, this is the only
/// cycle in the conversation graph — and it exists purely in conditional
/// routing.
#[must_use]
pub fn research_loop_router() -> RouterFn<ConversationState> {
    Arc::new(|snapshot| {
        if snapshot.steps.is_empty() {
            Route::to(RESPOND)
        } else {
            Route::to(CONDUCT_RESEARCH)
        }
    })
}

/// Fans each generated query out to its own retrieval branch.
///
/// Branch payloads share the question and query list but start with an
/// empty document set; `query_index` tells each branch which query it
/// owns. With no queries generated, the empty fan-out falls through to
/// the graph's unconditional edge.
#[must_use]
pub fn fan_out_per_query() -> RouterFn<ResearchState> {
    Arc::new(|snapshot| {
        Route::fan_out(
            (0..snapshot.queries.len())
                .map(|index| FanOutBranch::new(RETRIEVE, snapshot.for_branch(index))),
        )
    })
}
