//! Session store: the published state of the engine.
//!
//! Pure state container. Every asynchronous value the engine produces is
//! published here as a [`Remote`] and read by the presentation layer.
//! Mutation is serialized through per-field async locks; the store never
//! performs side effects.

use tokio::sync::RwLock;

use pelican_core::{Remote, Tier, UserProfile};

use crate::api::ApiToken;
use crate::linking::ExchangeLink;

/// Published session state.
#[derive(Debug, Default)]
pub struct SessionStore {
    api_token: RwLock<Remote<ApiToken>>,
    user: RwLock<Remote<UserProfile>>,
    tiers: RwLock<Remote<Vec<Tier>>>,
    link_account: RwLock<Remote<serde_json::Value>>,
    exchange_link: RwLock<Remote<ExchangeLink>>,
    share_addresses: RwLock<Remote<serde_json::Value>>,
}

impl SessionStore {
    /// Current session token status.
    pub async fn api_token(&self) -> Remote<ApiToken> {
        self.api_token.read().await.clone()
    }

    pub(crate) async fn set_api_token(&self, status: Remote<ApiToken>) {
        *self.api_token.write().await = status;
    }

    /// Current user profile status.
    pub async fn user(&self) -> Remote<UserProfile> {
        self.user.read().await.clone()
    }

    pub(crate) async fn set_user(&self, status: Remote<UserProfile>) {
        *self.user.write().await = status;
    }

    /// Current verification tier list status (tier 0 already dropped).
    pub async fn tiers(&self) -> Remote<Vec<Tier>> {
        self.tiers.read().await.clone()
    }

    pub(crate) async fn set_tiers(&self, status: Remote<Vec<Tier>>) {
        *self.tiers.write().await = status;
    }

    /// Status of the most recent account-linking flow.
    pub async fn link_account(&self) -> Remote<serde_json::Value> {
        self.link_account.read().await.clone()
    }

    pub(crate) async fn set_link_account(&self, status: Remote<serde_json::Value>) {
        *self.link_account.write().await = status;
    }

    /// Status of the most recent exchange-link creation.
    pub async fn exchange_link(&self) -> Remote<ExchangeLink> {
        self.exchange_link.read().await.clone()
    }

    pub(crate) async fn set_exchange_link(&self, status: Remote<ExchangeLink>) {
        *self.exchange_link.write().await = status;
    }

    /// Status of the most recent address-sharing flow.
    pub async fn share_addresses(&self) -> Remote<serde_json::Value> {
        self.share_addresses.read().await.clone()
    }

    pub(crate) async fn set_share_addresses(&self, status: Remote<serde_json::Value>) {
        *self.share_addresses.write().await = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_everything_starts_not_asked() {
        let store = SessionStore::default();
        assert!(store.api_token().await.is_not_asked());
        assert!(store.user().await.is_not_asked());
        assert!(store.tiers().await.is_not_asked());
        assert!(store.link_account().await.is_not_asked());
        assert!(store.share_addresses().await.is_not_asked());
    }

    #[tokio::test]
    async fn test_statuses_replace_wholesale() {
        let store = SessionStore::default();
        store.set_user(Remote::Loading).await;
        assert!(store.user().await.is_loading());

        store
            .set_user(Remote::Success(UserProfile::not_activated()))
            .await;
        assert!(store.user().await.is_success());

        store.set_user(Remote::NotAsked).await;
        assert!(store.user().await.is_not_asked());
    }
}
