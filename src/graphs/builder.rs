//! GraphBuilder: fluent construction of workflow graphs.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{ConditionalEdge, RouterFn};
use crate::config::RunConfig;
use crate::node::Node;
use crate::state::GraphState;
use crate::types::NodeKind;

/// Builder for constructing workflow graphs over a state type `S`.
///
/// Add nodes, unconditional edges, and conditional routers, then call
/// [`compile`](Self::compile) to validate the topology and obtain an
/// executable [`App`](crate::app::App). Validation happens at compile
/// time, not at run time: unknown edge targets, a missing entry edge,
/// ambiguous successors, and cycles through static edges are all
/// rejected before anything executes.
///
/// `NodeKind::Start` and `NodeKind::End` are virtual endpoints: they may
/// appear in edges for topology but are never registered or executed.
///
/// # Examples
///
/// ```
/// use ragloom::graphs::GraphBuilder;
/// use ragloom::node::{Node, NodeContext, NodeError};
/// use ragloom::state::{ConversationPartial, ConversationSnapshot, ConversationState};
/// use async_trait::async_trait;
///
/// struct Worker;
///
/// #[async_trait]
/// impl Node<ConversationState> for Worker {
///     async fn run(
///         &self,
///         _: ConversationSnapshot,
///         _: NodeContext<ConversationState>,
///     ) -> Result<ConversationPartial, NodeError> {
///         Ok(ConversationPartial::default())
///     }
/// }
///
/// let app = GraphBuilder::new()
///     .add_node("worker", Worker)
///     .add_edge("Start", "worker")
///     .add_edge("worker", "End")
///     .compile()
///     .expect("valid graph");
/// ```
pub struct GraphBuilder<S: GraphState> {
    pub(crate) nodes: FxHashMap<NodeKind, Arc<dyn Node<S>>>,
    pub(crate) edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    pub(crate) conditional_edges: Vec<ConditionalEdge<S>>,
    pub(crate) run_config: RunConfig,
}

impl<S: GraphState> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphState> GraphBuilder<S> {
    /// Creates a new, empty graph builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
            run_config: RunConfig::default(),
        }
    }

    /// Registers a node under the given identifier.
    ///
    /// Attempts to register the virtual `Start`/`End` endpoints are
    /// ignored with a warning; they exist for topology only.
    #[must_use]
    pub fn add_node(mut self, id: impl Into<NodeKind>, node: impl Node<S> + 'static) -> Self {
        let id = id.into();
        if id.is_virtual() {
            tracing::warn!(%id, "ignoring registration of virtual endpoint node");
            return self;
        }
        self.nodes.insert(id, Arc::new(node));
        self
    }

    /// Adds an unconditional edge between two nodes.
    ///
    /// The executor follows at most one unconditional edge out of a node;
    /// a second edge from the same source is rejected at compile time.
    /// Static edges must form a DAG — loops are only legal through
    /// conditional routing.
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<NodeKind>, to: impl Into<NodeKind>) -> Self {
        self.edges.entry(from.into()).or_default().push(to.into());
        self
    }

    /// Attaches a conditional router to a node.
    ///
    /// The router is evaluated immediately after the node's output has
    /// been merged into state, and decides the next transition — a single
    /// target or a concurrent fan-out.
    #[must_use]
    pub fn add_router(mut self, from: impl Into<NodeKind>, router: RouterFn<S>) -> Self {
        self.conditional_edges
            .push(ConditionalEdge::new(from, router));
        self
    }

    /// Sets the default per-run configuration for the compiled app.
    #[must_use]
    pub fn with_run_config(mut self, run_config: RunConfig) -> Self {
        self.run_config = run_config;
        self
    }
}
