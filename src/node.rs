//! Node execution primitives: the [`Node`] trait, execution context, and
//! the fatal error taxonomy.
//!
//! A node is a unit of computation `(snapshot, context) -> partial state
//! update`. Nodes never call each other directly and never hold a live
//! reference into shared state: they receive an owned snapshot, do their
//! work (possibly suspending on network calls), and return only the
//! channels they intend to update. The executor owns the merge.
//!
//! A node that returns `Err` aborts the entire run; nodes do not catch
//! framework-level failures and convert them into state. Retry, if any,
//! is a node-internal concern.
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use ragloom::node::{Node, NodeContext, NodeError};
//! use ragloom::state::{ConversationPartial, ConversationSnapshot, ConversationState};
//!
//! struct EchoNode;
//!
//! #[async_trait]
//! impl Node<ConversationState> for EchoNode {
//!     async fn run(
//!         &self,
//!         snapshot: ConversationSnapshot,
//!         ctx: NodeContext<ConversationState>,
//!     ) -> Result<ConversationPartial, NodeError> {
//!         ctx.emit("echo", format!("query is '{}'", snapshot.query));
//!         Ok(ConversationPartial::new().with_answer(snapshot.query))
//!     }
//! }
//! ```

use async_trait::async_trait;
use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigurationError, RunConfig};
use crate::events::EventEmitter;
use crate::state::GraphState;
use crate::types::NodeKind;

/// A unit of computation within a graph over state `S`.
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    /// Executes this node against an immutable snapshot, returning a
    /// partial update for the executor to merge.
    async fn run(&self, snapshot: S::Snapshot, ctx: NodeContext<S>)
        -> Result<S::Partial, NodeError>;
}

/// Execution context passed to a node for one invocation.
///
/// Carries the node's identity, the invocation sequence number, the
/// fan-out branch index when the node runs as a sub-invocation, the
/// immutable per-run configuration, and an event emitter for
/// observability.
#[derive(Clone, Debug)]
pub struct NodeContext<S: GraphState> {
    /// Identity of the node being executed.
    pub node: NodeKind,
    /// Node-invocation sequence number within the run.
    pub step: u64,
    /// Branch index when running as a fan-out sub-invocation.
    pub branch: Option<usize>,
    config: Arc<RunConfig>,
    emitter: EventEmitter<S::Partial>,
}

impl<S: GraphState> NodeContext<S> {
    pub(crate) fn new(
        node: NodeKind,
        step: u64,
        branch: Option<usize>,
        config: Arc<RunConfig>,
        emitter: EventEmitter<S::Partial>,
    ) -> Self {
        Self {
            node,
            step,
            branch,
            config,
            emitter,
        }
    }

    /// The run's immutable configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Emits a node-scoped diagnostic to the run's event stream.
    ///
    /// Emission never fails and never blocks; with no streaming consumer
    /// attached the message is dropped.
    pub fn emit(&self, scope: impl Into<String>, message: impl Into<String>) {
        self.emitter
            .emit_node_message(self.node.clone(), self.step, scope, message);
    }
}

/// Fatal errors raised by node execution. Any of these aborts the run.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(ragloom::node::missing_input),
        help("Check that an upstream node produced the required channel data.")
    )]
    MissingInput { what: &'static str },

    /// A model provider call failed.
    #[error("model provider error ({provider}): {message}")]
    #[diagnostic(code(ragloom::node::provider))]
    Provider { provider: String, message: String },

    /// A retrieval call failed.
    #[error("retrieval failed for query '{query}': {message}")]
    #[diagnostic(code(ragloom::node::retrieval))]
    Retrieval { query: String, message: String },

    /// The model returned output that does not match the requested shape.
    #[error("malformed model output: {0}")]
    #[diagnostic(
        code(ragloom::node::malformed_output),
        help("The structured-output schema and the model response disagree.")
    )]
    MalformedOutput(String),

    /// A nested graph invoked by this node failed.
    #[error("sub-graph execution failed: {message}")]
    #[diagnostic(code(ragloom::node::subgraph))]
    Subgraph { message: String },

    /// Fatal configuration problem detected during execution.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(ragloom::node::serde_json))]
    Serde(#[from] serde_json::Error),
}
