//! Conversation messages with stable identities.
//!
//! Messages are the primary data structure for chat history flowing through
//! the conversation graph. Every message carries an `id` assigned at
//! construction; the messages channel merges by that id, so a later update
//! carrying an existing id replaces the earlier message in place instead of
//! appending a duplicate.
//!
//! # Examples
//!
//! ```
//! use ragloom::message::Message;
//!
//! let user_msg = Message::user("How do I connect LangChain to MCP?");
//! let assistant_msg = Message::assistant("Here is what I found...");
//!
//! assert!(user_msg.has_role(Message::USER));
//! assert_ne!(user_msg.id, assistant_msg.id);
//!
//! // Stable ids let a node overwrite its own earlier output.
//! let draft = Message::assistant("thinking...").with_id("answer-1");
//! let final_msg = Message::assistant("done").with_id("answer-1");
//! assert_eq!(draft.id, final_msg.id);
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message in a conversation: a stable id, a role, and text content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identity used by the messages channel for merge-by-id.
    pub id: String,
    /// The role of the sender (e.g., "user", "assistant", "system").
    pub role: String,
    /// The text content of the message.
    pub content: String,
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// AI assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System prompt or instruction message role.
    pub const SYSTEM: &'static str = "system";

    /// Creates a new message with a freshly generated id.
    ///
    /// # Examples
    /// ```
    /// use ragloom::message::Message;
    ///
    /// let msg = Message::new(Message::USER, "Hello!");
    /// assert_eq!(msg.role, "user");
    /// assert!(!msg.id.is_empty());
    /// ```
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Replaces the generated id with an explicit one.
    ///
    /// Use this when a node wants later updates to overwrite this message
    /// via the channel's merge-by-id semantics.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
