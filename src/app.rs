//! Compiled, executable workflow graphs.
//!
//! An [`App`] is the immutable product of
//! [`GraphBuilder::compile`](crate::graphs::GraphBuilder::compile):
//! validated topology, registered nodes, conditional routers, and a
//! default [`RunConfig`]. Execution is driven by the runner in
//! [`crate::runtimes`]; this module exposes the public entry points —
//! [`invoke`](App::invoke) for plain execution and
//! [`invoke_streaming`](App::invoke_streaming) for observing every
//! node transition as it is merged.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::instrument;

use crate::config::RunConfig;
use crate::events::{EventEmitter, RunEventStream};
use crate::graphs::RouterFn;
use crate::node::Node;
use crate::runtimes::runner::{self, RunnerError};
use crate::state::GraphState;
use crate::types::NodeKind;

/// A compiled workflow graph over state `S`, ready for execution.
pub struct App<S: GraphState> {
    nodes: FxHashMap<NodeKind, Arc<dyn Node<S>>>,
    edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    routers: FxHashMap<NodeKind, RouterFn<S>>,
    entry: NodeKind,
    run_config: Arc<RunConfig>,
}

impl<S: GraphState> Clone for App<S> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            routers: self.routers.clone(),
            entry: self.entry.clone(),
            run_config: Arc::clone(&self.run_config),
        }
    }
}

/// Handle for a streaming invocation.
///
/// Dropping the handle aborts the run. Use
/// [`join`](InvocationHandle::join) to await the final state; the paired
/// event stream always delivers a terminal event before closing.
pub struct InvocationHandle<S: GraphState> {
    join_handle: Option<JoinHandle<Result<S, RunnerError>>>,
}

impl<S: GraphState> InvocationHandle<S> {
    /// Aborts the underlying run task.
    pub fn abort(&self) {
        if let Some(handle) = &self.join_handle {
            handle.abort();
        }
    }

    /// Returns true once the run task has completed or aborted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    /// Awaits the final state of the run.
    pub async fn join(mut self) -> Result<S, RunnerError> {
        let handle = self
            .join_handle
            .take()
            .expect("join consumes the handle; it cannot be awaited twice");
        match handle.await {
            Ok(result) => result,
            Err(err) => Err(RunnerError::Join(err)),
        }
    }
}

impl<S: GraphState> App<S> {
    /// Internal (crate) factory keeping the compiled parts private.
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeKind, Arc<dyn Node<S>>>,
        edges: FxHashMap<NodeKind, Vec<NodeKind>>,
        routers: FxHashMap<NodeKind, RouterFn<S>>,
        entry: NodeKind,
        run_config: RunConfig,
    ) -> Self {
        Self {
            nodes,
            edges,
            routers,
            entry,
            run_config: Arc::new(run_config),
        }
    }

    /// The node registry.
    #[must_use]
    pub fn nodes(&self) -> &FxHashMap<NodeKind, Arc<dyn Node<S>>> {
        &self.nodes
    }

    /// Unconditional edges (static topology).
    #[must_use]
    pub fn edges(&self) -> &FxHashMap<NodeKind, Vec<NodeKind>> {
        &self.edges
    }

    /// Conditional routers keyed by their source node.
    #[must_use]
    pub fn routers(&self) -> &FxHashMap<NodeKind, RouterFn<S>> {
        &self.routers
    }

    /// The first node after the virtual Start endpoint.
    #[must_use]
    pub fn entry(&self) -> &NodeKind {
        &self.entry
    }

    /// The default per-run configuration.
    #[must_use]
    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// Executes the graph to completion with the default configuration.
    ///
    /// # Errors
    ///
    /// Propagates the first node failure, fan-out group failure, or task
    /// join error; the partial results of a failed fan-out group are
    /// never merged.
    #[instrument(skip(self, initial_state), err)]
    pub async fn invoke(&self, initial_state: S) -> Result<S, RunnerError> {
        runner::run(
            self,
            initial_state,
            Arc::clone(&self.run_config),
            EventEmitter::disconnected(),
        )
        .await
    }

    /// Executes the graph with a per-run configuration override.
    #[instrument(skip(self, initial_state, config), err)]
    pub async fn invoke_with_config(
        &self,
        initial_state: S,
        config: RunConfig,
    ) -> Result<S, RunnerError> {
        runner::run(
            self,
            initial_state,
            Arc::new(config),
            EventEmitter::disconnected(),
        )
        .await
    }

    /// Executes the graph while streaming every transition to the caller.
    ///
    /// Returns a handle joining to the final state and the event stream.
    /// Transition events arrive in merge order; fan-out sub-invocations
    /// are tagged with their originating node and branch index; the
    /// stream always ends with a terminal
    /// [`Completed`](crate::events::RunEvent::Completed) or
    /// [`Failed`](crate::events::RunEvent::Failed) event.
    ///
    /// Dropping the stream does not cancel the run; dropping (or
    /// aborting) the handle does.
    pub async fn invoke_streaming(
        &self,
        initial_state: S,
    ) -> (InvocationHandle<S>, RunEventStream<S::Partial>) {
        let (emitter, stream) = EventEmitter::channel();
        let app = self.clone();
        let config = Arc::clone(&self.run_config);
        let join = tokio::spawn(async move { runner::run(&app, initial_state, config, emitter).await });
        (
            InvocationHandle {
                join_handle: Some(join),
            },
            stream,
        )
    }
}
