//! Fan-out/fan-in dispatch.
//!
//! When a conditional router yields multiple targets, each paired with an
//! explicit payload, the dispatcher launches one concurrent task per
//! branch against a copy of that payload, waits for all of them (join
//! semantics — no early cancel on first failure), and only then merges.
//!
//! Two guarantees hold regardless of completion order:
//!
//! - **Deterministic fan-in**: partials merge into the parent state in
//!   declaration order, not completion order, so the documents channel
//!   ends up ordered the same on every run.
//! - **All-or-nothing**: if any branch fails, nothing from the group is
//!   merged and the whole run fails with
//!   [`RunnerError::FanOut`](super::runner::RunnerError::FanOut). The
//!   merge loop itself contains no suspension point, so a caller-level
//!   abort can never leave a group half-merged.

use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;

use crate::app::App;
use crate::config::RunConfig;
use crate::events::{EventEmitter, RunEvent, TransitionEvent};
use crate::graphs::FanOutBranch;
use crate::node::NodeContext;
use crate::runtimes::runner::{BranchFailure, RunnerError};
use crate::state::GraphState;
use crate::types::NodeKind;

/// Runs one fan-out group to completion and merges its results into the
/// parent state.
///
/// Branch `i` executes at step `base + 1 + i`, where `base` is the step
/// counter at dispatch time; the counter advances by the branch count.
pub(crate) async fn dispatch<S: GraphState>(
    app: &App<S>,
    state: &mut S,
    origin: &NodeKind,
    branches: Vec<FanOutBranch<S>>,
    step: &mut u64,
    config: &Arc<RunConfig>,
    emitter: &EventEmitter<S::Partial>,
) -> Result<(), RunnerError> {
    let base_step = *step;
    let total = branches.len();

    // Validate every target before launching anything; a misrouted
    // branch should not cost the siblings a wasted round trip.
    let mut tasks = Vec::with_capacity(total);
    for (index, branch) in branches.iter().enumerate() {
        let Some(node) = app.nodes().get(&branch.target).cloned() else {
            return Err(RunnerError::UnknownRouteTarget {
                node: origin.clone(),
                target: branch.target.clone(),
            });
        };
        let ctx = NodeContext::new(
            branch.target.clone(),
            base_step + 1 + index as u64,
            Some(index),
            Arc::clone(config),
            emitter.clone(),
        );
        let payload = branch.payload.clone();
        tasks.push(tokio::spawn(async move { node.run(payload, ctx).await }));
    }
    *step = base_step + total as u64;

    tracing::debug!(origin = %origin, branches = total, "fan-out dispatched");

    // Join barrier: every sibling completes before any merge decision.
    let mut partials = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (index, joined) in join_all(tasks).await.into_iter().enumerate() {
        match joined {
            Ok(Ok(partial)) => partials.push(partial),
            Ok(Err(error)) => failures.push(BranchFailure {
                branch: index,
                target: branches[index].target.clone(),
                error,
            }),
            Err(join_error) => return Err(RunnerError::Join(join_error)),
        }
    }

    if !failures.is_empty() {
        tracing::warn!(
            origin = %origin,
            failed = failures.len(),
            total,
            "fan-out group failed; discarding sibling results"
        );
        return Err(RunnerError::FanOut {
            node: origin.clone(),
            step: base_step,
            total,
            failures,
        });
    }

    // Declaration-order merge. No await from here to the end of the
    // group, so the merge is atomic relative to external cancellation.
    for (index, partial) in partials.into_iter().enumerate() {
        let updated_channels = state.apply(&partial);
        emitter.emit(RunEvent::Transition(TransitionEvent {
            node: branches[index].target.clone(),
            branch: Some(index),
            step: base_step + 1 + index as u64,
            delta: partial,
            updated_channels,
            at: Utc::now(),
        }));
    }

    tracing::debug!(origin = %origin, branches = total, "fan-out merged");
    Ok(())
}
