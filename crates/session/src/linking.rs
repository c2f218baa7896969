//! Exchange account linking, address sharing, and campaign helpers.
//!
//! One-shot flows layered on top of the session lifecycle. They read
//! orchestrator state (user activation, email verification) but own no
//! background tasks of their own.

use std::collections::HashMap;

use tracing::{error, info, instrument};
use url::Url;

use pelican_core::{Campaign, CoinType, Remote, UserProfile};

use crate::engine::SessionEngine;
use crate::error::SessionError;
use crate::events::{self, SessionEvent};

/// Campaign that requires enrollment headers.
const SUNRIVER_CAMPAIGN: &str = "sunriver";

/// A created exchange link: the backend link id plus the URL the user
/// opens to complete linking on the exchange side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeLink {
    /// Opaque backend link id.
    pub link_id: String,
    /// Exchange URL carrying the link id and the user's email.
    pub url: Url,
}

impl SessionEngine {
    /// Link this wallet's backend user to an exchange account.
    ///
    /// Suspends until the wallet email is verified, creates the backend
    /// user first if none exists, then links and shares deposit
    /// addresses. Terminal outcomes are published to the store; this
    /// method never returns an error.
    #[instrument(skip(self))]
    pub async fn link_account(&self, link_id: &str) {
        self.inner.store.set_link_account(Remote::Loading).await;
        if let Err(error) = self.try_link_account(link_id).await {
            error!(%error, "account linking failed");
            self.inner
                .store
                .set_link_account(Remote::Failure(error.to_string()))
                .await;
        }
    }

    async fn try_link_account(&self, link_id: &str) -> Result<(), SessionError> {
        // Subscribe before checking the flag so the verification edge
        // cannot be lost between check and wait.
        let mut rx = self.inner.events.subscribe();
        if !self.inner.wallet.email_verified().await {
            info!("waiting for email verification before linking");
            events::wait_for(&mut rx, SessionEvent::EmailVerified).await?;
        }

        let needs_user = self
            .inner
            .store
            .user()
            .await
            .success()
            .is_some_and(UserProfile::is_not_activated);
        if needs_user {
            self.create_user().await?;
        }

        let data = self.inner.api.link_account(link_id).await?;
        self.share_addresses().await;
        self.inner
            .store
            .set_link_account(Remote::Success(data))
            .await;
        Ok(())
    }

    /// Create an exchange link id and build the URL the user opens to
    /// complete linking, publishing the outcome.
    ///
    /// # Errors
    ///
    /// Fails when the wallet has no email or the backend rejects the call;
    /// the failure is also published.
    #[instrument(skip(self))]
    pub async fn create_link_account_id(&self) -> Result<ExchangeLink, SessionError> {
        self.inner.store.set_exchange_link(Remote::Loading).await;
        match self.try_create_link_account_id().await {
            Ok(link) => {
                self.inner
                    .store
                    .set_exchange_link(Remote::Success(link.clone()))
                    .await;
                Ok(link)
            }
            Err(error) => {
                error!(%error, "failed to create exchange link");
                self.inner
                    .store
                    .set_exchange_link(Remote::Failure(error.to_string()))
                    .await;
                Err(error)
            }
        }
    }

    async fn try_create_link_account_id(&self) -> Result<ExchangeLink, SessionError> {
        let email = self
            .inner
            .wallet
            .email()
            .await
            .ok_or(SessionError::MissingValue("email"))?;
        let response = self.inner.api.create_link_account_id().await?;

        let mut url = self
            .inner
            .config
            .exchange_origin
            .join(&format!("trade/link/{}", response.link_id))?;
        url.query_pairs_mut().append_pair("email", email.as_str());

        Ok(ExchangeLink {
            link_id: response.link_id,
            url,
        })
    }

    /// Share deposit addresses for every supported coin the backend does
    /// not know yet, publishing the outcome. Never returns an error.
    ///
    /// Address derivation is the wallet's concern; coins the wallet cannot
    /// currently derive an address for are skipped.
    #[instrument(skip(self))]
    pub async fn share_addresses(&self) {
        self.inner.store.set_share_addresses(Remote::Loading).await;
        match self.try_share_addresses().await {
            Ok(data) => {
                self.inner
                    .store
                    .set_share_addresses(Remote::Success(data))
                    .await;
            }
            Err(error) => {
                error!(%error, "failed to share deposit addresses");
                self.inner
                    .store
                    .set_share_addresses(Remote::Failure(error.to_string()))
                    .await;
            }
        }
    }

    async fn try_share_addresses(&self) -> Result<serde_json::Value, SessionError> {
        let supported = self.inner.wallet.supported_coins().await;
        let user = self
            .inner
            .store
            .user()
            .await
            .into_success()
            .ok_or(SessionError::MissingValue("depositAddresses"))?;

        let mut addresses = user.wallet_addresses;
        for coin in supported {
            if addresses.contains_key(&coin) {
                continue;
            }
            if let Some(address) = self.inner.wallet.receive_address(coin).await {
                addresses.insert(coin, address);
            }
        }

        Ok(self.inner.api.share_deposit_addresses(&addresses).await?)
    }

    /// Request headers carrying campaign enrollment data, when the
    /// campaign requires them.
    ///
    /// # Errors
    ///
    /// Fails when the campaign needs the XLM account and none is derivable.
    pub async fn campaign_headers(
        &self,
        campaign: &Campaign,
    ) -> Result<Option<HashMap<String, String>>, SessionError> {
        if campaign.name != SUNRIVER_CAMPAIGN {
            return Ok(None);
        }

        let xlm_account = self
            .inner
            .wallet
            .receive_address(CoinType::Xlm)
            .await
            .ok_or(SessionError::MissingValue("xlmAccount"))?;

        Ok(Some(HashMap::from([
            ("x-campaign-address".to_string(), xlm_account),
            ("x-campaign-code".to_string(), campaign.code.clone()),
            ("x-campaign-email".to_string(), campaign.email.clone()),
        ])))
    }
}
