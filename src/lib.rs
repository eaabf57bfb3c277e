//! # Ragloom: Graph-driven Retrieval-Augmented Research Core
//!
//! Ragloom is an execution core for retrieval-augmented research
//! assistants: a directed-graph engine that runs named computation nodes
//! over shared, strongly-typed state, merges each node's partial update
//! through per-channel reducers, routes conditionally on node output,
//! and fans research work out into concurrent sub-invocations with
//! deterministic fan-in.
//!
//! ## Core Concepts
//!
//! - **Channels**: named slots in shared state, each with a merge
//!   function and a default value
//! - **Reducers**: pure `(existing, update) -> new value` merges — the
//!   documents channel dedups by key assigned at first sight
//! - **Nodes**: async units of work `(snapshot, config) -> partial update`
//! - **Graphs**: static DAG edges plus conditional routers computed from
//!   node output, compiled with fail-fast validation
//! - **Fan-out/fan-in**: concurrent sub-invocations against isolated
//!   payloads, merged back in declaration order, all-or-nothing on
//!   failure
//!
//! ## Quick Start
//!
//! ### Merging documents
//!
//! ```
//! use ragloom::document::{Document, DocumentUpdate};
//! use ragloom::reducers::merge_documents;
//!
//! let existing = vec![Document::from_text("retrieved chunk")];
//!
//! // Dedup is by key, never by content: re-merging keyed documents is
//! // idempotent, while bare text always adds.
//! let twice = merge_documents(&existing, &DocumentUpdate::Documents(existing.clone()));
//! assert_eq!(twice.len(), 1);
//!
//! let grown = merge_documents(&existing, &DocumentUpdate::text("retrieved chunk"));
//! assert_eq!(grown.len(), 2);
//! ```
//!
//! ### Building and running a graph
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use ragloom::graphs::{GraphBuilder, Route, RouterFn};
//! use ragloom::node::{Node, NodeContext, NodeError};
//! use ragloom::state::{ConversationPartial, ConversationSnapshot, ConversationState};
//!
//! struct CountdownNode;
//!
//! #[async_trait]
//! impl Node<ConversationState> for CountdownNode {
//!     async fn run(
//!         &self,
//!         snapshot: ConversationSnapshot,
//!         _ctx: NodeContext<ConversationState>,
//!     ) -> Result<ConversationPartial, NodeError> {
//!         // Shrink the step list by one; the router loops until empty.
//!         let remaining = snapshot.steps.get(1..).unwrap_or_default().to_vec();
//!         Ok(ConversationPartial::new().with_steps(remaining))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let loop_or_done: RouterFn<ConversationState> = Arc::new(|snapshot| {
//!     if snapshot.steps.is_empty() {
//!         Route::end()
//!     } else {
//!         Route::to("countdown")
//!     }
//! });
//!
//! let app = GraphBuilder::new()
//!     .add_node("countdown", CountdownNode)
//!     .add_edge("Start", "countdown")
//!     .add_router("countdown", loop_or_done)
//!     .compile()
//!     .expect("valid graph");
//!
//! let initial = ConversationState::builder()
//!     .with_steps(vec!["a".into(), "b".into()])
//!     .build();
//! let final_state = app.invoke(initial).await.expect("run succeeds");
//! assert!(final_state.steps.get().is_empty());
//! # }
//! ```
//!
//! ## The assistant flow
//!
//! [`assistant::AssistantBuilder`] wires the full research flow — plan →
//! research loop (fan-out retrieval per generated query) → respond —
//! from collaborator implementations you supply:
//! [`providers::ModelProvider`], [`providers::Retriever`], and an
//! optional [`providers::PromptSource`].
//!
//! ## Module Guide
//!
//! - [`types`] - Node identifiers and virtual endpoints
//! - [`message`] / [`document`] - Data carried by the channels
//! - [`channels`] - Versioned channel storage
//! - [`reducers`] - Pure channel merge functions
//! - [`state`] - Conversation and research states, partials, snapshots
//! - [`node`] - Node trait, execution context, error taxonomy
//! - [`graphs`] - Graph building, routing, fail-fast compilation
//! - [`app`] / [`runtimes`] - Compiled apps, the runner, fan-out dispatch
//! - [`events`] - Streaming run events
//! - [`providers`] - Collaborator interfaces (model, retriever, prompts)
//! - [`config`] - Per-run configuration
//! - [`nodes`] / [`assistant`] - The built-in research assistant flow

pub mod app;
pub mod assistant;
pub mod channels;
pub mod config;
pub mod document;
pub mod events;
pub mod graphs;
pub mod message;
pub mod node;
pub mod nodes;
pub mod providers;
pub mod reducers;
pub mod runtimes;
pub mod state;
pub mod types;
