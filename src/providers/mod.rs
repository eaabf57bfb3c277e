//! Collaborator interfaces the core consumes.
//!
//! The orchestration core treats model inference, document retrieval,
//! and prompt storage as external collaborators, specified only at their
//! interface boundary. Implementations (HTTP clients, vector stores,
//! template stores) live outside this crate; tests and demos plug in
//! in-memory doubles.

pub mod model;
pub mod prompts;
pub mod retriever;

pub use model::{InvokeOptions, ModelProvider, ModelRegistry, ModelResponse, ProviderError, ToolCall};
pub use prompts::{resolve_prompt, PromptError, PromptSource, StaticPrompts};
pub use retriever::{documents_from_raw, Retriever, RetrieverError};
