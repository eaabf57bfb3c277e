//! Graph compilation: validation and conversion to an executable
//! [`App`].
//!
//! Compilation fails fast: every structural mistake a graph author can
//! make is reported here, by name, before anything runs.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::builder::GraphBuilder;
use crate::app::App;
use crate::state::GraphState;
use crate::types::NodeKind;

/// Structural errors detected while compiling a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    /// An edge points at a node name that was never registered.
    #[error("edge target '{to}' (from '{from}') is not a registered node")]
    #[diagnostic(
        code(ragloom::graph::unknown_edge_target),
        help("Register the node with add_node before referencing it in an edge.")
    )]
    UnknownEdgeTarget { from: NodeKind, to: NodeKind },

    /// An edge leaves a node name that was never registered.
    #[error("edge source '{from}' is not a registered node")]
    #[diagnostic(code(ragloom::graph::unknown_edge_source))]
    UnknownEdgeSource { from: NodeKind },

    /// A router is attached to an unregistered or virtual node.
    #[error("conditional router source '{from}' is not a registered node")]
    #[diagnostic(code(ragloom::graph::unknown_router_source))]
    UnknownRouterSource { from: NodeKind },

    /// Two routers share the same source node.
    #[error("node '{from}' has more than one conditional router")]
    #[diagnostic(code(ragloom::graph::duplicate_router))]
    DuplicateRouter { from: NodeKind },

    /// No edge originates from the virtual Start endpoint.
    #[error("graph has no entry edge from Start")]
    #[diagnostic(
        code(ragloom::graph::no_entry_edge),
        help("Add an edge from Start to the first node.")
    )]
    NoEntryEdge,

    /// A node has more than one unconditional successor.
    #[error("node '{from}' has {count} unconditional successors; at most one is allowed")]
    #[diagnostic(
        code(ragloom::graph::ambiguous_successor),
        help("Use a conditional router (fan-out) to reach multiple targets.")
    )]
    AmbiguousSuccessor { from: NodeKind, count: usize },

    /// Static edges form a cycle.
    #[error("static edges form a cycle through '{at}'")]
    #[diagnostic(
        code(ragloom::graph::static_cycle),
        help("Cycles are only permitted through conditional routing.")
    )]
    StaticCycle { at: NodeKind },

    /// An edge enters Start or leaves End.
    #[error("edge '{from}' -> '{to}' violates virtual endpoint direction")]
    #[diagnostic(code(ragloom::graph::endpoint_direction))]
    EndpointDirection { from: NodeKind, to: NodeKind },
}

impl<S: GraphState> GraphBuilder<S> {
    /// Validates the graph and compiles it into an executable [`App`].
    ///
    /// Checks, in order:
    /// - an entry edge from `Start` exists
    /// - every edge source/target is registered (or the appropriate
    ///   virtual endpoint)
    /// - no node (including `Start`) has more than one unconditional
    ///   successor
    /// - every router source is a registered node, with at most one
    ///   router per node
    /// - static edges form a DAG
    pub fn compile(self) -> Result<App<S>, GraphCompileError> {
        let entry = match self.edges.get(&NodeKind::Start) {
            Some(targets) if !targets.is_empty() => {
                if targets.len() > 1 {
                    return Err(GraphCompileError::AmbiguousSuccessor {
                        from: NodeKind::Start,
                        count: targets.len(),
                    });
                }
                targets[0].clone()
            }
            _ => return Err(GraphCompileError::NoEntryEdge),
        };

        for (from, targets) in &self.edges {
            if from.is_end() {
                let to = targets.first().cloned().unwrap_or(NodeKind::End);
                return Err(GraphCompileError::EndpointDirection {
                    from: from.clone(),
                    to,
                });
            }
            if from.is_custom() && !self.nodes.contains_key(from) {
                return Err(GraphCompileError::UnknownEdgeSource { from: from.clone() });
            }
            if targets.len() > 1 {
                return Err(GraphCompileError::AmbiguousSuccessor {
                    from: from.clone(),
                    count: targets.len(),
                });
            }
            for to in targets {
                if to.is_start() {
                    return Err(GraphCompileError::EndpointDirection {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
                if to.is_custom() && !self.nodes.contains_key(to) {
                    return Err(GraphCompileError::UnknownEdgeTarget {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        let mut routers: FxHashMap<NodeKind, _> = FxHashMap::default();
        for edge in &self.conditional_edges {
            let from = edge.from();
            if !from.is_custom() || !self.nodes.contains_key(from) {
                return Err(GraphCompileError::UnknownRouterSource { from: from.clone() });
            }
            if routers
                .insert(from.clone(), edge.router().clone())
                .is_some()
            {
                return Err(GraphCompileError::DuplicateRouter { from: from.clone() });
            }
        }

        detect_static_cycle(&self.edges)?;

        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            routers = routers.len(),
            entry = %entry,
            "graph compiled"
        );

        Ok(App::from_parts(
            self.nodes,
            self.edges,
            routers,
            entry,
            self.run_config,
        ))
    }
}

/// Walks the single-successor chains and rejects any node that reaches
/// itself through static edges alone.
fn detect_static_cycle(
    edges: &FxHashMap<NodeKind, Vec<NodeKind>>,
) -> Result<(), GraphCompileError> {
    for origin in edges.keys() {
        let mut visited: FxHashSet<&NodeKind> = FxHashSet::default();
        let mut current = origin;
        while let Some(next) = edges.get(current).and_then(|targets| targets.first()) {
            if next.is_end() {
                break;
            }
            if !visited.insert(next) {
                return Err(GraphCompileError::StaticCycle { at: next.clone() });
            }
            current = next;
        }
    }
    Ok(())
}
