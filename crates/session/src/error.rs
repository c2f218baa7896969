//! Unified error handling for the session engine.

use thiserror::Error;

use crate::api::ApiError;
use crate::metadata::MetadataError;

/// Errors surfaced by session engine operations.
///
/// Backend failures during scheduled renewal or refresh never reach the
/// caller; the scheduler converts them into published `Failure` statuses
/// and retries. This type covers directly invoked operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Backend API call failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Metadata store read or write failed.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// A required wallet value was absent. Aborts the current flow
    /// without crashing the process.
    #[error("missing required value: {0}")]
    MissingValue(&'static str),

    /// The event bus closed while a flow was waiting on a signal.
    #[error("event bus closed")]
    EventBusClosed,

    /// The configured exchange origin could not be extended into a link URL.
    #[error("invalid exchange link: {0}")]
    ExchangeUrl(#[from] url::ParseError),
}

impl SessionError {
    /// Whether this is the distinguished "user restored" backend marker.
    ///
    /// It is the only API failure allowed to propagate across the
    /// user-fetch/session-establishment boundary; the orchestrator reacts
    /// with the recovery branch instead of publishing a generic failure.
    #[must_use]
    pub const fn is_user_restored(&self) -> bool {
        matches!(self, Self::Api(ApiError::UserRestored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_restored_is_distinguished() {
        let error = SessionError::from(ApiError::UserRestored);
        assert!(error.is_user_restored());

        let error = SessionError::MissingValue("email");
        assert!(!error.is_user_restored());
    }

    #[test]
    fn test_display() {
        let error = SessionError::MissingValue("email");
        assert_eq!(error.to_string(), "missing required value: email");
    }
}
