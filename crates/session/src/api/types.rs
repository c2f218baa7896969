//! Response types for the backend API.

use core::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use pelican_core::Tier;

/// A short-lived session token together with its expiry.
///
/// This is the `Success` payload of the published session status. The
/// secret is redacted from `Debug` output.
#[derive(Clone)]
pub struct ApiToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl ApiToken {
    /// Wrap a token and its expiry timestamp.
    #[must_use]
    pub const fn new(token: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// Expose the token value for use in an Authorization header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }

    /// When the backend will stop accepting this token.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Response of the session generation endpoint.
#[derive(Debug)]
pub struct SessionResponse {
    /// Short-lived session token.
    pub token: SecretString,
    /// Expiry timestamp of the token.
    pub expires_at: DateTime<Utc>,
}

/// Response of the retail token derivation endpoint.
#[derive(Debug)]
pub struct RetailTokenResponse {
    /// Wallet-identity-derived access token.
    pub token: SecretString,
}

/// Response of user registration.
#[derive(Debug, Clone)]
pub struct CreateUserResponse {
    /// Backend user id.
    pub user_id: String,
    /// Long-lived lifetime token, persisted to the metadata store.
    pub token: String,
}

/// Response of the tier list endpoint.
#[derive(Debug, Clone)]
pub struct TiersResponse {
    /// Tier descriptors in backend order (unsorted).
    pub tiers: Vec<Tier>,
}

/// Response of link id creation.
#[derive(Debug, Clone)]
pub struct LinkIdResponse {
    /// Opaque link id consumed by the exchange linking flow.
    pub link_id: String,
}
