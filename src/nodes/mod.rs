//! Built-in nodes of the research assistant flow.
//!
//! Conversation graph: [`PlanNode`] → [`ConductResearchNode`] (looping
//! while steps remain) → [`RespondNode`]. Research graph:
//! [`GenerateQueriesNode`] fanning out to [`RetrieveNode`] per query.
//!
//! Nodes hold their collaborators (model provider, retriever, prompt
//! source) behind `Arc`s supplied at construction; everything run-scoped
//! (model identifiers, search limits, prompt overrides) is read from the
//! [`RunConfig`](crate::config::RunConfig) in the node context.

mod conduct_research;
mod generate_queries;
mod plan;
mod respond;
mod retrieve;

pub use conduct_research::ConductResearchNode;
pub use generate_queries::GenerateQueriesNode;
pub use plan::PlanNode;
pub use respond::RespondNode;
pub use retrieve::RetrieveNode;

use serde_json::Value;

use crate::node::NodeError;

/// Extracts a list of non-empty strings from a structured-output field.
pub(crate) fn string_list(value: &Value, field: &str) -> Result<Vec<String>, NodeError> {
    let items = value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            NodeError::MalformedOutput(format!("expected an array field '{field}', got {value}"))
        })?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(text) if !text.trim().is_empty() => out.push(text.to_string()),
            Some(_) => {}
            None => {
                return Err(NodeError::MalformedOutput(format!(
                    "field '{field}' contains a non-string item: {item}"
                )));
            }
        }
    }
    Ok(out)
}
