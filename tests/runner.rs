use std::sync::Arc;

use ragloom::app::App;
use ragloom::events::RunEvent;
use ragloom::graphs::{FanOutBranch, GraphBuilder, Route, RouterFn};
use ragloom::runtimes::RunnerError;
use ragloom::state::{ConversationState, ResearchState};
use ragloom::types::NodeKind;

mod common;
use common::{CountMessagesNode, FailingRetrieveNode, PopStepNode, SayNode, SeedQueriesNode,
    SlowRetrieveNode};

fn fan_out_router() -> RouterFn<ResearchState> {
    Arc::new(|snapshot| {
        Route::fan_out(
            (0..snapshot.queries.len())
                .map(|index| FanOutBranch::new("retrieve", snapshot.for_branch(index))),
        )
    })
}

fn research_app(
    queries: &[&str],
    retrieve: impl ragloom::node::Node<ResearchState> + 'static,
) -> App<ResearchState> {
    GraphBuilder::new()
        .add_node("seed", SeedQueriesNode::new(queries))
        .add_node("retrieve", retrieve)
        .add_edge("Start", "seed")
        .add_edge("seed", "End")
        .add_router("seed", fan_out_router())
        .compile()
        .expect("valid research graph")
}

/********************
 * Sequential semantics
 ********************/

#[tokio::test]
async fn test_sequential_nodes_observe_merged_state() {
    let app = GraphBuilder::new()
        .add_node("say", SayNode::new("first"))
        .add_node("count", CountMessagesNode)
        .add_edge("Start", "say")
        .add_edge("say", "count")
        .add_edge("count", "End")
        .compile()
        .unwrap();

    let final_state = app
        .invoke(ConversationState::new_with_user_message("hello"))
        .await
        .unwrap();

    // The counter ran after the merge of `say`: user message + said one.
    assert_eq!(final_state.answer.get(), "saw 2");
}

#[tokio::test]
async fn test_conditional_loop_drains_steps() {
    let loop_router: RouterFn<ConversationState> = Arc::new(|snapshot| {
        if snapshot.steps.is_empty() {
            Route::end()
        } else {
            Route::to("pop")
        }
    });

    let app = GraphBuilder::new()
        .add_node("pop", PopStepNode)
        .add_edge("Start", "pop")
        .add_router("pop", loop_router)
        .compile()
        .unwrap();

    let initial = ConversationState::builder()
        .with_steps(vec!["s1".into(), "s2".into(), "s3".into()])
        .build();
    let final_state = app.invoke(initial).await.unwrap();
    assert!(final_state.steps.get().is_empty());
}

#[tokio::test]
async fn test_router_to_unknown_target_errors() {
    let bad_router: RouterFn<ConversationState> = Arc::new(|_snapshot| Route::to("ghost"));
    let app = GraphBuilder::new()
        .add_node("say", SayNode::new("x"))
        .add_edge("Start", "say")
        .add_router("say", bad_router)
        .compile()
        .unwrap();

    let result = app.invoke(ConversationState::default()).await;
    assert!(matches!(
        result,
        Err(RunnerError::UnknownRouteTarget { target, .. })
            if target == NodeKind::Custom("ghost".to_string())
    ));
}

/********************
 * Fan-out / fan-in
 ********************/

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_merge_order_is_declaration_order() {
    // q1 finishes last, q3 first; the parent channel must still read
    // q1, q2, q3.
    let app = research_app(&["q1", "q2", "q3"], SlowRetrieveNode::new(&[150, 75, 0]));

    let final_state = app
        .invoke(ResearchState::for_question("topic"))
        .await
        .unwrap();

    let keys: Vec<_> = final_state
        .documents
        .get()
        .iter()
        .map(|d| d.dedup_key.clone())
        .collect();
    assert_eq!(keys, vec!["key-q1", "key-q2", "key-q3"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_failure_is_all_or_nothing() {
    let app = research_app(&["q1", "q2", "q3"], FailingRetrieveNode { fail_index: 1 });

    let (handle, events) = app
        .invoke_streaming(ResearchState::for_question("topic"))
        .await;
    let result = handle.join().await;

    let Err(RunnerError::FanOut {
        total, failures, ..
    }) = result
    else {
        panic!("expected fan-out failure");
    };
    assert_eq!(total, 3);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].branch, 1);

    // Nothing from the group was merged: the only transition is the seed
    // node's, and the stream terminates with Failed.
    let events: Vec<_> = events.into_iter().collect();
    let transitions: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Transition(t) => Some(t),
            _ => None,
        })
        .collect();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].node, NodeKind::Custom("seed".to_string()));
    assert!(matches!(events.last(), Some(RunEvent::Failed { .. })));
}

#[tokio::test]
async fn test_empty_fan_out_falls_through() {
    let app = research_app(&[], SlowRetrieveNode::new(&[]));
    let final_state = app
        .invoke(ResearchState::for_question("topic"))
        .await
        .unwrap();
    assert!(final_state.documents.get().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_repeated_runs_are_deterministic() {
    for _ in 0..5 {
        let app = research_app(&["a", "b"], SlowRetrieveNode::new(&[60, 0]));
        let final_state = app
            .invoke(ResearchState::for_question("topic"))
            .await
            .unwrap();
        let keys: Vec<_> = final_state
            .documents
            .get()
            .iter()
            .map(|d| d.dedup_key.clone())
            .collect();
        assert_eq!(keys, vec!["key-a", "key-b"]);
    }
}

/********************
 * Streaming
 ********************/

#[tokio::test]
async fn test_streaming_emits_transitions_then_terminal() {
    let app = GraphBuilder::new()
        .add_node("say", SayNode::new("first"))
        .add_node("count", CountMessagesNode)
        .add_edge("Start", "say")
        .add_edge("say", "count")
        .add_edge("count", "End")
        .compile()
        .unwrap();

    let (handle, events) = app
        .invoke_streaming(ConversationState::new_with_user_message("hello"))
        .await;
    handle.join().await.unwrap();

    let events: Vec<_> = events.into_iter().collect();
    assert_eq!(events.len(), 3);

    let RunEvent::Transition(first) = &events[0] else {
        panic!("expected transition");
    };
    assert_eq!(first.node, NodeKind::Custom("say".to_string()));
    assert_eq!(first.branch, None);
    assert_eq!(first.step, 1);
    assert_eq!(first.updated_channels, vec!["messages"]);

    let RunEvent::Transition(second) = &events[1] else {
        panic!("expected transition");
    };
    assert_eq!(second.node, NodeKind::Custom("count".to_string()));
    assert_eq!(second.step, 2);

    assert!(matches!(events[2], RunEvent::Completed { steps: 2 }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_streaming_tags_fan_out_branches() {
    let app = research_app(&["q1", "q2"], SlowRetrieveNode::new(&[50, 0]));

    let (handle, events) = app
        .invoke_streaming(ResearchState::for_question("topic"))
        .await;
    handle.join().await.unwrap();

    let branches: Vec<_> = events
        .into_iter()
        .filter_map(|e| match e {
            RunEvent::Transition(t) if t.branch.is_some() => Some((t.node, t.branch.unwrap())),
            _ => None,
        })
        .collect();

    let retrieve = NodeKind::Custom("retrieve".to_string());
    assert_eq!(branches, vec![(retrieve.clone(), 0), (retrieve, 1)]);
}
