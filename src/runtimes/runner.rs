//! The sequential executor driving a compiled graph.
//!
//! The runner walks the graph from its entry node: snapshot the state,
//! run the node, merge its partial update through the channel reducers,
//! emit a transition event, then route — via the node's conditional
//! router when one exists, else along its single unconditional edge —
//! until the virtual End node is reached or no edge remains.
//!
//! The shared state is owned exclusively by the runner between node
//! invocations; a running node only ever holds a snapshot. Sequential
//! nodes therefore always observe the fully-merged state of every prior
//! node, and there is no step limit: bounding iteration (e.g. draining a
//! `steps` list) is node logic, not runner logic.

use chrono::Utc;
use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;

use crate::app::App;
use crate::config::RunConfig;
use crate::events::{EventEmitter, RunEvent, TransitionEvent};
use crate::node::{NodeContext, NodeError};
use crate::runtimes::dispatcher;
use crate::state::GraphState;
use crate::types::NodeKind;

/// A single failed branch within a fan-out group.
#[derive(Debug)]
pub struct BranchFailure {
    /// Declaration-order index of the branch.
    pub branch: usize,
    /// The branch's target node.
    pub target: NodeKind,
    /// The failure itself.
    pub error: NodeError,
}

/// Errors surfaced to the `invoke` caller. The runner performs no
/// retries and produces no user-facing formatting; failures propagate
/// as-is.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// A node's execution failed, aborting the run.
    #[error("node '{node}' failed at step {step}: {source}")]
    #[diagnostic(code(ragloom::runner::node_run))]
    NodeRun {
        node: NodeKind,
        step: u64,
        #[source]
        source: NodeError,
    },

    /// One or more branches of a fan-out group failed. Partial results
    /// from succeeded siblings are discarded, not merged: merging half a
    /// fan-out group would break the deterministic-ordering guarantee
    /// for the documents channel.
    #[error(
        "fan-out from '{node}' failed at step {step}: {failed} of {total} branches failed",
        failed = failures.len()
    )]
    #[diagnostic(
        code(ragloom::runner::fan_out),
        help("The run is all-or-nothing per fan-out group; inspect `failures` for the branch errors.")
    )]
    FanOut {
        node: NodeKind,
        step: u64,
        total: usize,
        failures: Vec<BranchFailure>,
    },

    /// A router named a target that is neither End nor a registered node.
    #[error("router on '{node}' returned unknown target '{target}'")]
    #[diagnostic(
        code(ragloom::runner::unknown_route_target),
        help("Routers may only name registered nodes or the virtual End endpoint.")
    )]
    UnknownRouteTarget { node: NodeKind, target: NodeKind },

    /// The run task itself failed to join.
    #[error("workflow task join error: {0}")]
    #[diagnostic(code(ragloom::runner::join))]
    Join(#[from] JoinError),
}

impl RunnerError {
    /// The node the error originated from, when attributable.
    #[must_use]
    pub fn node(&self) -> Option<&NodeKind> {
        match self {
            Self::NodeRun { node, .. }
            | Self::FanOut { node, .. }
            | Self::UnknownRouteTarget { node, .. } => Some(node),
            Self::Join(_) => None,
        }
    }

    /// The step the error occurred at, when attributable.
    #[must_use]
    pub fn step(&self) -> u64 {
        match self {
            Self::NodeRun { step, .. } | Self::FanOut { step, .. } => *step,
            _ => 0,
        }
    }
}

/// Drives a compiled graph to completion, emitting events along the way.
///
/// The paired event stream always receives exactly one terminal event:
/// `Completed` on success, `Failed` on any error path — streaming
/// consumers never observe a silently truncated stream.
pub(crate) async fn run<S: GraphState>(
    app: &App<S>,
    initial_state: S,
    config: Arc<RunConfig>,
    emitter: EventEmitter<S::Partial>,
) -> Result<S, RunnerError> {
    let mut state = initial_state;
    let mut step: u64 = 0;

    match drive(app, &mut state, &mut step, &config, &emitter).await {
        Ok(()) => {
            emitter.emit(RunEvent::Completed { steps: step });
            Ok(state)
        }
        Err(error) => {
            emitter.emit(RunEvent::Failed {
                node: error.node().cloned(),
                step: error.step(),
                message: error.to_string(),
            });
            Err(error)
        }
    }
}

async fn drive<S: GraphState>(
    app: &App<S>,
    state: &mut S,
    step: &mut u64,
    config: &Arc<RunConfig>,
    emitter: &EventEmitter<S::Partial>,
) -> Result<(), RunnerError> {
    let mut current = app.entry().clone();

    loop {
        if current.is_end() {
            return Ok(());
        }

        // Compilation guarantees every reachable custom node is
        // registered, and routing re-validates its targets below.
        let Some(node) = app.nodes().get(&current) else {
            return Err(RunnerError::UnknownRouteTarget {
                node: current.clone(),
                target: current.clone(),
            });
        };

        *step += 1;
        let invocation_step = *step;
        let snapshot = state.snapshot();
        let ctx = NodeContext::new(
            current.clone(),
            invocation_step,
            None,
            Arc::clone(config),
            emitter.clone(),
        );

        let partial =
            node.run(snapshot, ctx)
                .await
                .map_err(|source| RunnerError::NodeRun {
                    node: current.clone(),
                    step: invocation_step,
                    source,
                })?;

        let updated_channels = state.apply(&partial);
        tracing::debug!(
            node = %current,
            step = invocation_step,
            updated = ?updated_channels,
            "node output merged"
        );
        emitter.emit(RunEvent::Transition(TransitionEvent {
            node: current.clone(),
            branch: None,
            step: invocation_step,
            delta: partial,
            updated_channels,
            at: Utc::now(),
        }));

        current = match next_transition(app, state, &current, step, config, emitter).await? {
            Some(next) => next,
            None => return Ok(()),
        };
    }
}

/// Evaluates routing for a node whose output has just been merged.
///
/// Returns the next node, or `None` when the run ends here (no outgoing
/// edge). A fan-out is dispatched and merged before the unconditional
/// edge is followed.
async fn next_transition<S: GraphState>(
    app: &App<S>,
    state: &mut S,
    current: &NodeKind,
    step: &mut u64,
    config: &Arc<RunConfig>,
    emitter: &EventEmitter<S::Partial>,
) -> Result<Option<NodeKind>, RunnerError> {
    use crate::graphs::Route;

    if let Some(router) = app.routers().get(current) {
        match router(&state.snapshot()) {
            Route::Single(target) => {
                if target.is_custom() && !app.nodes().contains_key(&target) {
                    return Err(RunnerError::UnknownRouteTarget {
                        node: current.clone(),
                        target,
                    });
                }
                tracing::debug!(from = %current, to = %target, "conditional transition");
                return Ok(Some(target));
            }
            Route::FanOut(branches) if branches.is_empty() => {
                // No targets: behave as if the node had no conditional
                // edge at all.
                tracing::debug!(from = %current, "empty fan-out, falling through");
            }
            Route::FanOut(branches) => {
                dispatcher::dispatch(app, state, current, branches, step, config, emitter).await?;
            }
        }
    }

    Ok(static_successor(app, current))
}

fn static_successor<S: GraphState>(app: &App<S>, current: &NodeKind) -> Option<NodeKind> {
    app.edges()
        .get(current)
        .and_then(|targets| targets.first())
        .cloned()
}
