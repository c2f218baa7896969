//! Backend API collaborator.
//!
//! [`WalletApi`] is the full backend surface the session engine consumes;
//! [`RestClient`] is the production implementation. Tests substitute mocks.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use pelican_core::{Address, CoinType, Credentials, Email, UserDetails, UserProfile};

mod rest;
mod types;

pub use rest::RestClient;
pub use types::{
    ApiToken, CreateUserResponse, LinkIdResponse, RetailTokenResponse, SessionResponse,
    TiersResponse,
};

/// Error description the backend attaches when a user record was reset
/// out-of-band and must be recovered before a session can be established.
pub const USER_RESTORED_DESCRIPTION: &str = "User restored";

/// Errors returned by backend API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The distinguished "user restored" marker: the backend user record
    /// was reset out-of-band and the recovery flow must run.
    #[error("user requires restoration")]
    UserRestored,

    /// An authenticated call was made with no session token set.
    #[error("no session token set")]
    NoSessionToken,

    /// The backend rejected the session token.
    #[error("session token rejected")]
    Unauthorized,

    /// The backend returned a non-success status.
    #[error("backend returned {status}: {message}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Error description from the response body, if any.
        message: String,
    },

    /// Transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The wallet backend API surface.
///
/// All methods are request/response; the backend resolves or fails without
/// an engine-imposed deadline beyond the client's request timeout.
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Cache the short-lived session token for authenticated calls.
    async fn set_session_token(&self, token: SecretString);

    /// Drop the cached session token.
    async fn clear_session_token(&self);

    /// Exchange long-lived credentials for a short-lived session token.
    async fn generate_session(
        &self,
        credentials: &Credentials,
        email: &Email,
        guid: &str,
    ) -> Result<SessionResponse, ApiError>;

    /// Fetch the current user profile.
    ///
    /// Fails with [`ApiError::UserRestored`] when the user record needs
    /// recovery.
    async fn get_user(&self) -> Result<UserProfile, ApiError>;

    /// Fetch the verification tier list.
    async fn fetch_tiers(&self) -> Result<TiersResponse, ApiError>;

    /// Update the user's personal details.
    async fn update_user(&self, details: &UserDetails) -> Result<(), ApiError>;

    /// Update the user's postal address.
    async fn update_user_address(&self, address: &Address) -> Result<(), ApiError>;

    /// Derive a retail access token from the wallet's identity.
    async fn generate_retail_token(
        &self,
        guid: &str,
        shared_key: &SecretString,
    ) -> Result<RetailTokenResponse, ApiError>;

    /// Register a new backend user.
    async fn create_user(
        &self,
        retail_token: &SecretString,
        partner_id: Option<&str>,
    ) -> Result<CreateUserResponse, ApiError>;

    /// Recover a user record that was restored out-of-band.
    async fn recover_user(
        &self,
        credentials: &Credentials,
        retail_token: &SecretString,
    ) -> Result<(), ApiError>;

    /// Push wallet-derived identity data to the backend user record.
    async fn sync_user_with_wallet(
        &self,
        retail_token: &SecretString,
    ) -> Result<UserProfile, ApiError>;

    /// Link this user to an exchange account.
    async fn link_account(&self, link_id: &str) -> Result<serde_json::Value, ApiError>;

    /// Create a link id for the exchange linking flow.
    async fn create_link_account_id(&self) -> Result<LinkIdResponse, ApiError>;

    /// Share deposit addresses with the backend, one per coin type.
    async fn share_deposit_addresses(
        &self,
        addresses: &HashMap<CoinType, String>,
    ) -> Result<serde_json::Value, ApiError>;
}
