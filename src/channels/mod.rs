//! Versioned channel storage for graph state.
//!
//! A channel is a named slot in shared state: a value plus a version
//! counter. Reducers merge updates into the value without touching the
//! version; the executor bumps the version after a merge, and only when
//! the content actually changed. That split keeps reducers pure and makes
//! change detection a single integer comparison for observers.
//!
//! # Examples
//!
//! ```
//! use ragloom::channels::{Channel, TypedChannel};
//!
//! let mut steps: TypedChannel<Vec<String>> = TypedChannel::default();
//! assert_eq!(steps.version(), 1);
//!
//! steps.get_mut().push("step1".to_string());
//! assert_eq!(steps.snapshot(), vec!["step1".to_string()]);
//!
//! // Version bumps are the executor's job, not the reducer's.
//! steps.set_version(steps.version() + 1);
//! assert_eq!(steps.version(), 2);
//! ```

use std::fmt;

/// Common access contract for versioned channels.
pub trait Channel {
    /// The stored value type.
    type Value: Clone;

    /// Clones the current value out of the channel.
    fn snapshot(&self) -> Self::Value;

    /// Mutable access to the stored value. Does not touch the version.
    fn get_mut(&mut self) -> &mut Self::Value;

    /// Current channel version.
    fn version(&self) -> u32;

    /// Overwrites the channel version.
    fn set_version(&mut self, version: u32);
}

/// A single versioned slot holding a channel value of type `T`.
///
/// New channels start at version 1 with `T::default()` as the declared
/// default value, so a reducer never observes an absent channel.
#[derive(Clone, PartialEq, Eq)]
pub struct TypedChannel<T> {
    value: T,
    version: u32,
}

impl<T: Clone> TypedChannel<T> {
    /// Creates a channel with an explicit initial value and version.
    pub fn new(value: T, version: u32) -> Self {
        Self { value, version }
    }

    /// Read-only access without cloning.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replaces the value wholesale, leaving the version untouched.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }
}

impl<T: Clone> Channel for TypedChannel<T> {
    type Value = T;

    fn snapshot(&self) -> T {
        self.value.clone()
    }

    fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }
}

impl<T: Default> Default for TypedChannel<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            version: 1,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for TypedChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedChannel")
            .field("value", &self.value)
            .field("version", &self.version)
            .finish()
    }
}
