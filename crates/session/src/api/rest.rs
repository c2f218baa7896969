//! REST implementation of the backend API.
//!
//! Holds the short-lived session token in an in-memory cache; the engine
//! sets it after every establishment and clears it on teardown.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::instrument;

use pelican_core::{Address, CoinType, Credentials, Email, Tier, UserDetails, UserProfile};

use crate::config::SessionConfig;

use super::types::{
    CreateUserResponse, LinkIdResponse, RetailTokenResponse, SessionResponse, TiersResponse,
};
use super::{ApiError, USER_RESTORED_DESCRIPTION, WalletApi};

/// REST client for the wallet backend.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    http: reqwest::Client,
    base_url: String,
    /// In-memory session token cache
    token: RwLock<Option<SecretString>>,
}

/// Error body shape returned by the backend.
#[derive(Debug, Deserialize, Default)]
struct ErrorPayload {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Map a non-success response to an [`ApiError`].
///
/// The "user restored" description is the one marker that must stay
/// distinguishable from generic failures.
fn decode_error(status: u16, payload: ErrorPayload) -> ApiError {
    if payload.description.as_deref() == Some(USER_RESTORED_DESCRIPTION) {
        return ApiError::UserRestored;
    }
    let message = payload
        .description
        .or(payload.message)
        .unwrap_or_else(|| "unknown error".to_string());
    ApiError::Response { status, message }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCreateUser {
    user_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct RawTiers {
    tiers: Vec<Tier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLinkId {
    link_id: String,
}

impl RestClient {
    /// Create a client for the configured backend.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            inner: Arc::new(RestClientInner {
                http,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                token: RwLock::new(None),
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Authorization header value from the cached session token.
    async fn session_bearer(&self) -> Result<String, ApiError> {
        let token = self.inner.token.read().await;
        token
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
            .ok_or(ApiError::NoSessionToken)
    }

    /// Send a request and decode a JSON response, mapping error statuses.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let payload = response.json::<ErrorPayload>().await.unwrap_or_default();
            return Err(decode_error(status.as_u16(), payload));
        }

        Ok(response.json::<T>().await?)
    }

    /// Send a request whose response body is irrelevant.
    async fn send_no_content(&self, request: reqwest::RequestBuilder) -> Result<(), ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let payload = response.json::<ErrorPayload>().await.unwrap_or_default();
            return Err(decode_error(status.as_u16(), payload));
        }

        Ok(())
    }
}

#[async_trait]
impl WalletApi for RestClient {
    async fn set_session_token(&self, token: SecretString) {
        *self.inner.token.write().await = Some(token);
    }

    async fn clear_session_token(&self) {
        *self.inner.token.write().await = None;
    }

    #[instrument(skip(self, credentials), fields(user_id = %credentials.user_id))]
    async fn generate_session(
        &self,
        credentials: &Credentials,
        email: &Email,
        guid: &str,
    ) -> Result<SessionResponse, ApiError> {
        let request = self
            .inner
            .http
            .post(self.endpoint("auth/session"))
            .header(
                "Authorization",
                format!("Bearer {}", credentials.lifetime_token),
            )
            .json(&serde_json::json!({
                "userId": credentials.user_id,
                "email": email.as_str(),
                "guid": guid,
            }));

        let raw: RawSession = self.send(request).await?;
        Ok(SessionResponse {
            token: SecretString::from(raw.token),
            expires_at: raw.expires_at,
        })
    }

    #[instrument(skip(self))]
    async fn get_user(&self) -> Result<UserProfile, ApiError> {
        let request = self
            .inner
            .http
            .get(self.endpoint("users/current"))
            .header("Authorization", self.session_bearer().await?);
        self.send(request).await
    }

    #[instrument(skip(self))]
    async fn fetch_tiers(&self) -> Result<TiersResponse, ApiError> {
        let request = self
            .inner
            .http
            .get(self.endpoint("kyc/tiers"))
            .header("Authorization", self.session_bearer().await?);
        let raw: RawTiers = self.send(request).await?;
        Ok(TiersResponse { tiers: raw.tiers })
    }

    #[instrument(skip(self, details))]
    async fn update_user(&self, details: &UserDetails) -> Result<(), ApiError> {
        let request = self
            .inner
            .http
            .put(self.endpoint("users/current"))
            .header("Authorization", self.session_bearer().await?)
            .json(details);
        self.send_no_content(request).await
    }

    #[instrument(skip(self, address))]
    async fn update_user_address(&self, address: &Address) -> Result<(), ApiError> {
        let request = self
            .inner
            .http
            .put(self.endpoint("users/current/address"))
            .header("Authorization", self.session_bearer().await?)
            .json(&serde_json::json!({ "address": address }));
        self.send_no_content(request).await
    }

    #[instrument(skip(self, shared_key))]
    async fn generate_retail_token(
        &self,
        guid: &str,
        shared_key: &SecretString,
    ) -> Result<RetailTokenResponse, ApiError> {
        let request = self
            .inner
            .http
            .post(self.endpoint("auth/retail-token"))
            .json(&serde_json::json!({
                "guid": guid,
                "sharedKey": shared_key.expose_secret(),
            }));
        let raw: RawToken = self.send(request).await?;
        Ok(RetailTokenResponse {
            token: SecretString::from(raw.token),
        })
    }

    #[instrument(skip(self, retail_token))]
    async fn create_user(
        &self,
        retail_token: &SecretString,
        partner_id: Option<&str>,
    ) -> Result<CreateUserResponse, ApiError> {
        let request = self
            .inner
            .http
            .post(self.endpoint("users"))
            .json(&serde_json::json!({
                "retailToken": retail_token.expose_secret(),
                "partnerId": partner_id,
            }));
        let raw: RawCreateUser = self.send(request).await?;
        Ok(CreateUserResponse {
            user_id: raw.user_id,
            token: raw.token,
        })
    }

    #[instrument(skip(self, credentials, retail_token), fields(user_id = %credentials.user_id))]
    async fn recover_user(
        &self,
        credentials: &Credentials,
        retail_token: &SecretString,
    ) -> Result<(), ApiError> {
        let request = self
            .inner
            .http
            .post(self.endpoint("users/recovery"))
            .json(&serde_json::json!({
                "userId": credentials.user_id,
                "lifetimeToken": credentials.lifetime_token,
                "retailToken": retail_token.expose_secret(),
            }));
        self.send_no_content(request).await
    }

    #[instrument(skip(self, retail_token))]
    async fn sync_user_with_wallet(
        &self,
        retail_token: &SecretString,
    ) -> Result<UserProfile, ApiError> {
        let request = self
            .inner
            .http
            .put(self.endpoint("users/sync"))
            .json(&serde_json::json!({
                "retailToken": retail_token.expose_secret(),
            }));
        self.send(request).await
    }

    #[instrument(skip(self))]
    async fn link_account(&self, link_id: &str) -> Result<serde_json::Value, ApiError> {
        let request = self
            .inner
            .http
            .put(self.endpoint("users/link-account"))
            .header("Authorization", self.session_bearer().await?)
            .json(&serde_json::json!({ "linkId": link_id }));
        self.send(request).await
    }

    #[instrument(skip(self))]
    async fn create_link_account_id(&self) -> Result<LinkIdResponse, ApiError> {
        let request = self
            .inner
            .http
            .post(self.endpoint("users/link-account-id"))
            .header("Authorization", self.session_bearer().await?);
        let raw: RawLinkId = self.send(request).await?;
        Ok(LinkIdResponse {
            link_id: raw.link_id,
        })
    }

    #[instrument(skip(self, addresses), fields(coins = addresses.len()))]
    async fn share_deposit_addresses(
        &self,
        addresses: &HashMap<CoinType, String>,
    ) -> Result<serde_json::Value, ApiError> {
        let request = self
            .inner
            .http
            .put(self.endpoint("users/deposit-addresses"))
            .header("Authorization", self.session_bearer().await?)
            .json(&serde_json::json!({ "addresses": addresses }));
        self.send(request).await
    }
}
