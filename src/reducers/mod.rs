//! Pure merge functions for state channels.
//!
//! Every channel in a graph state has a reducer: a pure, total function
//! `(existing, update) -> new value`. Reducers never mutate `existing` in
//! place and never touch channel versions; version bumps happen in the
//! executor after change detection.
//!
//! The reducers here cover the channel families this crate uses:
//!
//! - [`merge_documents`]: dedup-by-key accumulation with a clear sentinel
//! - [`merge_messages`]: merge-by-id (replace in place, else append)
//! - [`coerce_answer`]: the string-coercing answer channel
//!
//! Wholesale-replace channels (`steps`, `queries`) and last-write-wins
//! strings (`query`, `question`) need no dedicated function; assigning
//! the update is the reduction.
//!
//! Unknown or degenerate update shapes are treated as no-ops, never
//! errors: the update enums make most malformed shapes unrepresentable,
//! and the remaining degenerate case (`null` for a scalar channel) leaves
//! the existing value untouched.

mod merge_documents;
mod merge_messages;
mod scalar;

pub use merge_documents::merge_documents;
pub use merge_messages::merge_messages;
pub use scalar::coerce_answer;
