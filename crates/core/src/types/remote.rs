//! Remote data status for asynchronously fetched values.
//!
//! Every value the session engine obtains from the backend is published
//! through a [`Remote`] so consumers can render the full request lifecycle:
//! not yet requested, in flight, resolved, or failed.

use serde::{Deserialize, Serialize};

/// Status of an asynchronously fetched value.
///
/// Transitions within one attempt are monotonic
/// (`NotAsked` → `Loading` → `Success` | `Failure`); the engine resets a
/// status to `NotAsked` only on explicit session teardown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Remote<T> {
    /// The value has never been requested.
    #[default]
    NotAsked,
    /// A request is in flight.
    Loading,
    /// The last request resolved with a value.
    Success(T),
    /// The last request failed; carries a presentable error message.
    Failure(String),
}

impl<T> Remote<T> {
    /// Returns `true` if the value has never been requested.
    #[must_use]
    pub const fn is_not_asked(&self) -> bool {
        matches!(self, Self::NotAsked)
    }

    /// Returns `true` if a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns `true` if the last request resolved successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns `true` if the last request failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns a reference to the successful value, if any.
    #[must_use]
    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the failure message, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failure(message) => Some(message),
            _ => None,
        }
    }

    /// Consumes the status and returns the successful value, if any.
    #[must_use]
    pub fn into_success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the successful value or the provided default.
    #[must_use]
    pub fn get_or_else(self, default: T) -> T {
        match self {
            Self::Success(value) => value,
            _ => default,
        }
    }

    /// Maps the successful value, preserving the other variants.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Remote<U> {
        match self {
            Self::NotAsked => Remote::NotAsked,
            Self::Loading => Remote::Loading,
            Self::Success(value) => Remote::Success(f(value)),
            Self::Failure(message) => Remote::Failure(message),
        }
    }
}
