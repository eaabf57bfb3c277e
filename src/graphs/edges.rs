//! Edge types and routing for conditional graph flow.
//!
//! A conditional edge attaches a [`RouterFn`] to a source node. The
//! router is evaluated immediately after the source node's output has
//! been merged into state, and its [`Route`] decides what happens next:
//! a single named target (a normal transition, including looping back to
//! a previously visited node), or a fan-out into concurrent
//! sub-invocations, each paired with an explicit payload snapshot.

use std::sync::Arc;

use crate::state::GraphState;
use crate::types::NodeKind;

/// Routing decision produced by a conditional edge.
///
/// Modeled as an explicit variant rather than an ad hoc scalar-or-array
/// return value so the executor's handling is exhaustive.
pub enum Route<S: GraphState> {
    /// Transition to a single named node (or `End`).
    Single(NodeKind),
    /// Launch one concurrent sub-invocation per branch, join them all,
    /// and merge their outputs back in declaration order. An empty list
    /// behaves as if the node had no conditional edge: execution proceeds
    /// along the unconditional edge, if any, else the run ends.
    FanOut(Vec<FanOutBranch<S>>),
}

impl<S: GraphState> Route<S> {
    /// Routes to the named node.
    #[must_use]
    pub fn to(target: impl Into<NodeKind>) -> Self {
        Self::Single(target.into())
    }

    /// Routes to the virtual End node, terminating the run.
    #[must_use]
    pub fn end() -> Self {
        Self::Single(NodeKind::End)
    }

    /// Builds a fan-out route from `(target, payload)` pairs.
    #[must_use]
    pub fn fan_out(branches: impl IntoIterator<Item = FanOutBranch<S>>) -> Self {
        Self::FanOut(branches.into_iter().collect())
    }
}

impl<S: GraphState> std::fmt::Debug for Route<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(target) => f.debug_tuple("Single").field(target).finish(),
            Self::FanOut(branches) => f
                .debug_struct("FanOut")
                .field("branches", &branches.len())
                .finish(),
        }
    }
}

/// One branch of a fan-out: a target node paired with the isolated
/// payload snapshot it runs against.
///
/// The payload is an explicit sub-state constructed by the router, not
/// the parent state verbatim; sub-invocations never observe each other's
/// intermediate state.
pub struct FanOutBranch<S: GraphState> {
    pub target: NodeKind,
    pub payload: S::Snapshot,
}

impl<S: GraphState> FanOutBranch<S> {
    #[must_use]
    pub fn new(target: impl Into<NodeKind>, payload: S::Snapshot) -> Self {
        Self {
            target: target.into(),
            payload,
        }
    }
}

/// Router function for conditional edge routing.
///
/// Evaluated against the snapshot taken after the source node's output
/// was merged.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ragloom::graphs::{Route, RouterFn};
/// use ragloom::state::ConversationState;
///
/// // The loop-or-done router of the research loop.
/// let router: RouterFn<ConversationState> = Arc::new(|snapshot| {
///     if snapshot.steps.is_empty() {
///         Route::to("respond")
///     } else {
///         Route::to("conduct_research")
///     }
/// });
/// ```
pub type RouterFn<S> =
    Arc<dyn Fn(&<S as GraphState>::Snapshot) -> Route<S> + Send + Sync + 'static>;

/// A conditional edge: a source node plus the router deciding its
/// successors at run time.
pub struct ConditionalEdge<S: GraphState> {
    from: NodeKind,
    router: RouterFn<S>,
}

impl<S: GraphState> ConditionalEdge<S> {
    #[must_use]
    pub fn new(from: impl Into<NodeKind>, router: RouterFn<S>) -> Self {
        Self {
            from: from.into(),
            router,
        }
    }

    /// The source node of this conditional edge.
    #[must_use]
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    /// The router function of this conditional edge.
    #[must_use]
    pub fn router(&self) -> &RouterFn<S> {
        &self.router
    }
}

impl<S: GraphState> Clone for ConditionalEdge<S> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.clone(),
            router: Arc::clone(&self.router),
        }
    }
}
