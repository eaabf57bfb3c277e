//! Run events and the streaming channel that carries them.
//!
//! Streaming consumers observe a run as a sequence of [`RunEvent`]s: one
//! [`Transition`](RunEvent::Transition) per node whose output was merged
//! into state (fan-out sub-invocations are tagged with their originating
//! node and branch index), free-form [`NodeMessage`](RunEvent::NodeMessage)
//! diagnostics emitted by nodes, and exactly one terminal event —
//! [`Completed`](RunEvent::Completed) or [`Failed`](RunEvent::Failed).
//! A stream never ends silently: a failing run still delivers its
//! terminal event before the channel closes.
//!
//! Events travel over an unbounded [`flume`] channel; emission never
//! blocks the executor, and a dropped receiver simply mutes the stream
//! without affecting the run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::NodeKind;

/// One observable moment in a run, parameterized by the partial-update
/// type of the graph's state.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent<P> {
    /// A node's output was merged into shared state.
    Transition(TransitionEvent<P>),
    /// A free-form diagnostic emitted by a node via
    /// [`NodeContext::emit`](crate::node::NodeContext::emit).
    NodeMessage(NodeMessageEvent),
    /// The run reached the virtual End node.
    Completed { steps: u64 },
    /// The run aborted; this is always the final event of a failing
    /// stream.
    Failed {
        node: Option<NodeKind>,
        step: u64,
        message: String,
    },
}

/// Payload of a [`RunEvent::Transition`].
#[derive(Clone, Debug, Serialize)]
pub struct TransitionEvent<P> {
    /// The node whose output was merged. For fan-out sub-invocations this
    /// is the branch's target node.
    pub node: NodeKind,
    /// Branch index within a fan-out group; `None` for sequential
    /// transitions.
    pub branch: Option<usize>,
    /// Node-invocation sequence number, monotonically advancing.
    pub step: u64,
    /// The partial update the node returned.
    pub delta: P,
    /// Names of the channels the merge actually changed.
    pub updated_channels: Vec<&'static str>,
    /// Wall-clock time the merge completed.
    pub at: DateTime<Utc>,
}

/// Payload of a [`RunEvent::NodeMessage`].
#[derive(Clone, Debug, Serialize)]
pub struct NodeMessageEvent {
    pub node: NodeKind,
    pub step: u64,
    pub scope: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Receiving half of a run's event stream.
pub type RunEventStream<P> = flume::Receiver<RunEvent<P>>;

/// Cloneable emitting half handed to the executor and to node contexts.
///
/// A disconnected emitter (no stream requested, or the consumer went
/// away) swallows events; observation must never alter execution.
#[derive(Clone, Debug)]
pub struct EventEmitter<P> {
    sender: Option<flume::Sender<RunEvent<P>>>,
}

impl<P> EventEmitter<P> {
    /// An emitter with no consumer; every emit is a no-op.
    #[must_use]
    pub fn disconnected() -> Self {
        Self { sender: None }
    }

    /// Creates a connected emitter/stream pair.
    #[must_use]
    pub fn channel() -> (Self, RunEventStream<P>) {
        let (sender, receiver) = flume::unbounded();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Emits an event, silently dropping it when nobody is listening.
    pub fn emit(&self, event: RunEvent<P>) {
        if let Some(sender) = &self.sender
            && sender.send(event).is_err()
        {
            tracing::debug!("run event dropped: stream consumer disconnected");
        }
    }

    /// Emits a node-scoped diagnostic message.
    pub fn emit_node_message(
        &self,
        node: NodeKind,
        step: u64,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.emit(RunEvent::NodeMessage(NodeMessageEvent {
            node,
            step,
            scope: scope.into(),
            message: message.into(),
            at: Utc::now(),
        }));
    }
}
