//! Streaming run: print every transition event as it is merged.
//!
//! Run with: `cargo run --example streaming_run`

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use ragloom::document::{Document, DocumentUpdate};
use ragloom::events::RunEvent;
use ragloom::graphs::{FanOutBranch, GraphBuilder, Route, RouterFn};
use ragloom::node::{Node, NodeContext, NodeError};
use ragloom::state::{ResearchPartial, ResearchSnapshot, ResearchState};

/// Seeds three queries for the fan-out.
struct SeedNode;

#[async_trait]
impl Node<ResearchState> for SeedNode {
    async fn run(
        &self,
        _snapshot: ResearchSnapshot,
        ctx: NodeContext<ResearchState>,
    ) -> Result<ResearchPartial, NodeError> {
        ctx.emit("seed", "seeding three queries");
        Ok(ResearchPartial::new().with_queries(vec![
            "q1".to_string(),
            "q2".to_string(),
            "q3".to_string(),
        ]))
    }
}

/// Simulated retrieval with inverse delays: q3 finishes first, yet the
/// fan-in still merges q1, q2, q3.
struct SimulatedRetrieveNode;

#[async_trait]
impl Node<ResearchState> for SimulatedRetrieveNode {
    async fn run(
        &self,
        snapshot: ResearchSnapshot,
        _ctx: NodeContext<ResearchState>,
    ) -> Result<ResearchPartial, NodeError> {
        let Some(query) = snapshot.current_query() else {
            return Err(NodeError::MissingInput { what: "queries" });
        };
        let delay = 120 - 40 * snapshot.query_index as u64;
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let document = Document::new(
            format!("result for {query}"),
            serde_json::Map::from_iter([("source".to_string(), json!(format!("sim://{query}")))]),
            format!("key-{query}"),
        );
        Ok(ResearchPartial::new().with_documents(DocumentUpdate::Documents(vec![document])))
    }
}

fn fan_out_router() -> RouterFn<ResearchState> {
    Arc::new(|snapshot| {
        Route::fan_out(
            (0..snapshot.queries.len())
                .map(|index| FanOutBranch::new("retrieve", snapshot.for_branch(index))),
        )
    })
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let app = GraphBuilder::new()
        .add_node("seed", SeedNode)
        .add_node("retrieve", SimulatedRetrieveNode)
        .add_edge("Start", "seed")
        .add_edge("seed", "End")
        .add_router("seed", fan_out_router())
        .compile()?;

    let (handle, events) = app
        .invoke_streaming(ResearchState::for_question("demo question"))
        .await;

    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv_async().await {
            match event {
                RunEvent::Transition(t) => {
                    let branch = t
                        .branch
                        .map(|i| format!(" [branch {i}]"))
                        .unwrap_or_default();
                    println!(
                        "step {} {}{}: updated {:?}",
                        t.step, t.node, branch, t.updated_channels
                    );
                }
                RunEvent::NodeMessage(m) => println!("  {} {}: {}", m.node, m.scope, m.message),
                RunEvent::Completed { steps } => println!("completed after {steps} steps"),
                RunEvent::Failed { message, .. } => println!("failed: {message}"),
            }
        }
    });

    let final_state = handle.join().await.map_err(miette::Report::from)?;
    let _ = printer.await;

    println!("\nfinal document order:");
    for document in final_state.documents.get() {
        println!("  {}", document.dedup_key);
    }
    Ok(())
}
