//! Runtime execution: the sequential runner and the fan-out dispatcher.
//!
//! One logical run is driven by a single runner loop performing
//! sequential node transitions. Concurrency exists only inside a
//! fan-out, where the dispatcher launches isolated sub-invocations and
//! joins them before anything is merged.

pub(crate) mod dispatcher;
pub(crate) mod runner;

pub use runner::{BranchFailure, RunnerError};
