//! Test support for the Pelican session engine.
//!
//! Provides in-memory mocks for the engine's three collaborators (backend
//! API, metadata store, wallet state) plus an engine builder over them.
//! The mocks record every backend call by name so tests can assert on
//! call counts and cadence; timing tests pair them with Tokio's paused
//! clock (`#[tokio::test(start_paused = true)]`).

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;
use uuid::Uuid;

use pelican_core::{
    Address, CoinType, Credentials, Email, Tier, UserActivationState, UserProfile,
};
use pelican_session::api::{
    ApiError, CreateUserResponse, LinkIdResponse, RetailTokenResponse, SessionResponse,
    TiersResponse, WalletApi,
};
use pelican_session::metadata::{MetadataError, MetadataStore};
use pelican_session::wallet::WalletState;
use pelican_session::{SessionConfig, SessionEngine};

/// Initialize tracing for a test binary. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build an engine over the given mocks with a fixed test configuration.
#[must_use]
pub fn engine(
    api: Arc<MockApi>,
    metadata: Arc<MockMetadata>,
    wallet: Arc<MockWallet>,
) -> SessionEngine {
    let config = SessionConfig::new(
        Url::parse("https://api.pelican.test").unwrap(),
        Url::parse("https://exchange.pelican.test").unwrap(),
    );
    SessionEngine::new(config, api, metadata, wallet)
}

/// An active backend user with one shared BTC address, used as the
/// default [`MockApi`] profile.
#[must_use]
pub fn active_user() -> UserProfile {
    UserProfile {
        id: Some("user-1".to_string()),
        state: UserActivationState::Active,
        wallet_addresses: HashMap::from([(CoinType::Btc, "1ExistingBtc".to_string())]),
        ..UserProfile::default()
    }
}

/// A tier with the given index and no limits.
#[must_use]
pub fn tier(index: u32) -> Tier {
    Tier {
        index,
        name: format!("Tier {index}"),
        state: None,
        limits: None,
    }
}

#[derive(Debug)]
struct MockApiState {
    calls: Vec<String>,
    session_instants: Vec<Instant>,
    user: UserProfile,
    tiers: Vec<Tier>,
    session_ttl_secs: i64,
    restored_sessions: u32,
    failing_sessions: u32,
    failing_user_fetches: u32,
    shared_addresses: Option<HashMap<CoinType, String>>,
}

impl Default for MockApiState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            session_instants: Vec::new(),
            user: active_user(),
            tiers: vec![tier(0), tier(1), tier(2)],
            session_ttl_secs: 60,
            restored_sessions: 0,
            failing_sessions: 0,
            failing_user_fetches: 0,
            shared_addresses: None,
        }
    }
}

/// In-memory [`WalletApi`] recording every call by backend operation name.
#[derive(Debug, Default)]
pub struct MockApi {
    state: Mutex<MockApiState>,
}

impl MockApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the profile returned by `getUser`.
    pub async fn set_user(&self, user: UserProfile) {
        self.state.lock().await.user = user;
    }

    /// Replace the tier list returned by `fetchTiers` (backend order).
    pub async fn set_tiers(&self, tiers: Vec<Tier>) {
        self.state.lock().await.tiers = tiers;
    }

    /// Lifetime of issued session tokens, in seconds.
    pub async fn set_session_ttl(&self, secs: i64) {
        self.state.lock().await.session_ttl_secs = secs;
    }

    /// Make the next `n` session generations fail with a 500.
    pub async fn fail_sessions(&self, n: u32) {
        self.state.lock().await.failing_sessions = n;
    }

    /// Make the next `n` session generations fail with the restored-user
    /// marker.
    pub async fn restore_sessions(&self, n: u32) {
        self.state.lock().await.restored_sessions = n;
    }

    /// Make the next `n` user fetches fail with a 500.
    pub async fn fail_user_fetches(&self, n: u32) {
        self.state.lock().await.failing_user_fetches = n;
    }

    /// Every recorded call name, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    /// How many times the named operation was called.
    pub async fn call_count(&self, name: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.as_str() == name)
            .count()
    }

    /// Instants (on the Tokio clock) of every `generateSession` call.
    pub async fn session_instants(&self) -> Vec<Instant> {
        self.state.lock().await.session_instants.clone()
    }

    /// The address map submitted by the last `shareDepositAddresses` call.
    pub async fn shared_addresses(&self) -> Option<HashMap<CoinType, String>> {
        self.state.lock().await.shared_addresses.clone()
    }

    async fn record(&self, name: &str) {
        self.state.lock().await.calls.push(name.to_string());
    }
}

#[async_trait]
impl WalletApi for MockApi {
    async fn set_session_token(&self, _token: SecretString) {
        self.record("setSessionToken").await;
    }

    async fn clear_session_token(&self) {
        self.record("clearSessionToken").await;
    }

    async fn generate_session(
        &self,
        _credentials: &Credentials,
        _email: &Email,
        _guid: &str,
    ) -> Result<SessionResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push("generateSession".to_string());
        state.session_instants.push(Instant::now());

        if state.restored_sessions > 0 {
            state.restored_sessions -= 1;
            return Err(ApiError::UserRestored);
        }
        if state.failing_sessions > 0 {
            state.failing_sessions -= 1;
            return Err(ApiError::Response {
                status: 500,
                message: "backend unavailable".to_string(),
            });
        }

        Ok(SessionResponse {
            token: SecretString::from(format!("session-token-{}", state.session_instants.len())),
            expires_at: Utc::now() + chrono::Duration::seconds(state.session_ttl_secs),
        })
    }

    async fn get_user(&self) -> Result<UserProfile, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push("getUser".to_string());
        if state.failing_user_fetches > 0 {
            state.failing_user_fetches -= 1;
            return Err(ApiError::Response {
                status: 500,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(state.user.clone())
    }

    async fn fetch_tiers(&self) -> Result<TiersResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push("fetchTiers".to_string());
        Ok(TiersResponse {
            tiers: state.tiers.clone(),
        })
    }

    async fn update_user(&self, details: &pelican_core::UserDetails) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push("updateUser".to_string());
        state.user.details = details.clone();
        Ok(())
    }

    async fn update_user_address(&self, address: &Address) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push("updateUserAddress".to_string());
        state.user.address = Some(address.clone());
        Ok(())
    }

    async fn generate_retail_token(
        &self,
        _guid: &str,
        _shared_key: &SecretString,
    ) -> Result<RetailTokenResponse, ApiError> {
        self.record("generateRetailToken").await;
        Ok(RetailTokenResponse {
            token: SecretString::from("retail-token"),
        })
    }

    async fn create_user(
        &self,
        _retail_token: &SecretString,
        _partner_id: Option<&str>,
    ) -> Result<CreateUserResponse, ApiError> {
        self.record("createUser").await;
        Ok(CreateUserResponse {
            user_id: format!("user-{}", Uuid::new_v4()),
            token: "lifetime-token-new".to_string(),
        })
    }

    async fn recover_user(
        &self,
        _credentials: &Credentials,
        _retail_token: &SecretString,
    ) -> Result<(), ApiError> {
        self.record("recoverUser").await;
        Ok(())
    }

    async fn sync_user_with_wallet(
        &self,
        _retail_token: &SecretString,
    ) -> Result<UserProfile, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push("syncUserWithWallet".to_string());
        Ok(state.user.clone())
    }

    async fn link_account(&self, _link_id: &str) -> Result<serde_json::Value, ApiError> {
        self.record("linkAccount").await;
        Ok(serde_json::json!({ "status": "linked" }))
    }

    async fn create_link_account_id(&self) -> Result<LinkIdResponse, ApiError> {
        self.record("createLinkAccountId").await;
        Ok(LinkIdResponse {
            link_id: Uuid::new_v4().to_string(),
        })
    }

    async fn share_deposit_addresses(
        &self,
        addresses: &HashMap<CoinType, String>,
    ) -> Result<serde_json::Value, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push("shareDepositAddresses".to_string());
        state.shared_addresses = Some(addresses.clone());
        Ok(serde_json::json!({ "shared": addresses.len() }))
    }
}

#[derive(Debug, Default)]
struct MockMetadataState {
    credentials: Option<Credentials>,
    partner_id: Option<String>,
    writes: Vec<Credentials>,
}

/// In-memory [`MetadataStore`].
#[derive(Debug, Default)]
pub struct MockMetadata {
    state: Mutex<MockMetadataState>,
}

impl MockMetadata {
    /// A store with no credentials: a wallet that never registered.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A store holding registered credentials.
    #[must_use]
    pub fn with_credentials() -> Self {
        Self {
            state: Mutex::new(MockMetadataState {
                credentials: Some(Credentials::new(
                    "user-1".to_string(),
                    "lifetime-token-1".to_string(),
                )),
                ..MockMetadataState::default()
            }),
        }
    }

    /// Every credentials value written, in order.
    pub async fn writes(&self) -> Vec<Credentials> {
        self.state.lock().await.writes.clone()
    }
}

#[async_trait]
impl MetadataStore for MockMetadata {
    async fn credentials(&self) -> Result<Option<Credentials>, MetadataError> {
        Ok(self.state.lock().await.credentials.clone())
    }

    async fn store_credentials(&self, credentials: &Credentials) -> Result<(), MetadataError> {
        let mut state = self.state.lock().await;
        state.credentials = Some(credentials.clone());
        state.writes.push(credentials.clone());
        Ok(())
    }

    async fn partner_id(&self) -> Result<Option<String>, MetadataError> {
        Ok(self.state.lock().await.partner_id.clone())
    }
}

#[derive(Debug)]
struct MockWalletState {
    email: Option<Email>,
    email_verified: bool,
    guid: String,
    shared_key: Option<SecretString>,
    supported: Vec<CoinType>,
    addresses: HashMap<CoinType, String>,
}

impl Default for MockWalletState {
    fn default() -> Self {
        Self {
            email: Some(Email::parse("satoshi@example.com").unwrap()),
            email_verified: true,
            guid: "wallet-guid-1".to_string(),
            shared_key: Some(SecretString::from("shared-key-1")),
            supported: vec![CoinType::Btc, CoinType::Eth, CoinType::Xlm],
            addresses: HashMap::from([
                (CoinType::Btc, "1FreshBtc".to_string()),
                (CoinType::Eth, "0xFreshEth".to_string()),
                (CoinType::Xlm, "GFRESHXLM".to_string()),
            ]),
        }
    }
}

/// In-memory [`WalletState`] with a verified email and three coins.
#[derive(Debug, Default)]
pub struct MockWallet {
    state: Mutex<MockWalletState>,
}

impl MockWallet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_email(&self, email: Option<Email>) {
        self.state.lock().await.email = email;
    }

    pub async fn set_email_verified(&self, verified: bool) {
        self.state.lock().await.email_verified = verified;
    }

    pub async fn set_receive_address(&self, coin: CoinType, address: Option<String>) {
        let mut state = self.state.lock().await;
        match address {
            Some(address) => state.addresses.insert(coin, address),
            None => state.addresses.remove(&coin),
        };
    }
}

#[async_trait]
impl WalletState for MockWallet {
    async fn email(&self) -> Option<Email> {
        self.state.lock().await.email.clone()
    }

    async fn email_verified(&self) -> bool {
        self.state.lock().await.email_verified
    }

    async fn guid(&self) -> String {
        self.state.lock().await.guid.clone()
    }

    async fn shared_key(&self) -> Option<SecretString> {
        self.state.lock().await.shared_key.clone()
    }

    async fn supported_coins(&self) -> Vec<CoinType> {
        self.state.lock().await.supported.clone()
    }

    async fn receive_address(&self, coin: CoinType) -> Option<String> {
        self.state.lock().await.addresses.get(&coin).cloned()
    }
}
