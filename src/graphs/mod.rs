//! Graph definition and compilation.
//!
//! A graph is a named set of nodes plus directed edges. Unconditional
//! edges are static topology and must form a DAG; conditional edges
//! carry a [`RouterFn`] whose [`Route`] is computed from node output at
//! run time — including loops back to previously visited nodes and
//! fan-outs into concurrent sub-invocations.
//!
//! [`GraphBuilder`] validates the whole topology at
//! [`compile`](GraphBuilder::compile) time and produces an executable
//! [`App`](crate::app::App); every structural mistake fails fast with a
//! named [`GraphCompileError`] instead of surfacing mid-run.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use ragloom::graphs::{GraphBuilder, Route, RouterFn};
//! use ragloom::node::{Node, NodeContext, NodeError};
//! use ragloom::state::{ConversationPartial, ConversationSnapshot, ConversationState};
//! use async_trait::async_trait;
//!
//! struct Step;
//!
//! #[async_trait]
//! impl Node<ConversationState> for Step {
//!     async fn run(
//!         &self,
//!         _: ConversationSnapshot,
//!         _: NodeContext<ConversationState>,
//!     ) -> Result<ConversationPartial, NodeError> {
//!         Ok(ConversationPartial::default())
//!     }
//! }
//!
//! let done_or_loop: RouterFn<ConversationState> = Arc::new(|snapshot| {
//!     if snapshot.steps.is_empty() {
//!         Route::end()
//!     } else {
//!         Route::to("work")
//!     }
//! });
//!
//! let app = GraphBuilder::new()
//!     .add_node("work", Step)
//!     .add_edge("Start", "work")
//!     .add_router("work", done_or_loop)
//!     .compile()
//!     .expect("valid graph");
//! ```

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphCompileError;
pub use edges::{ConditionalEdge, FanOutBranch, Route, RouterFn};
