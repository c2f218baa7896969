//! User and tier synchronization.

use tracing::{error, instrument, warn};

use pelican_core::{Address, KycState, Remote, Tier, UserDetails, UserProfile};

use crate::engine::SessionEngine;
use crate::error::SessionError;
use crate::scheduler::USER_REFRESH_DELAY;

/// The externally visible tier list: ascending by index with the
/// implicit unverified tier 0 dropped.
fn visible_tiers(mut tiers: Vec<Tier>) -> Vec<Tier> {
    tiers.sort_unstable_by_key(|tier| tier.index);
    tiers.into_iter().skip(1).collect()
}

impl SessionEngine {
    /// Fetch and publish the user profile, then refresh the tier list.
    ///
    /// Starts the periodic user refresh when verification is pending and
    /// no refresh task is alive yet. Returns `None` when the fetch failed
    /// non-fatally; the failure has already been published and logged.
    ///
    /// # Errors
    ///
    /// Only the restored-user marker is returned as an error, so the
    /// session establishment path can react to it.
    #[instrument(skip(self))]
    pub async fn fetch_user(&self) -> Result<Option<UserProfile>, SessionError> {
        match self.inner.api.get_user().await {
            Ok(user) => {
                self.inner
                    .store
                    .set_user(Remote::Success(user.clone()))
                    .await;
                self.fetch_tiers().await;
                if user.kyc_state == KycState::Pending {
                    self.schedule_user_refresh(USER_REFRESH_DELAY).await;
                }
                Ok(Some(user))
            }
            Err(error) => {
                let error = SessionError::from(error);
                if error.is_user_restored() {
                    return Err(error);
                }
                error!(%error, "failed to fetch user");
                self.inner
                    .store
                    .set_user(Remote::Failure(error.to_string()))
                    .await;
                Ok(None)
            }
        }
    }

    /// Fetch and publish the visible tier list.
    ///
    /// Publishes `Loading` only when no successful list is cached, so a
    /// background refresh does not flicker an already-rendered list.
    #[instrument(skip(self))]
    pub async fn fetch_tiers(&self) {
        if !self.inner.store.tiers().await.is_success() {
            self.inner.store.set_tiers(Remote::Loading).await;
        }

        match self.inner.api.fetch_tiers().await {
            Ok(response) => {
                self.inner
                    .store
                    .set_tiers(Remote::Success(visible_tiers(response.tiers)))
                    .await;
            }
            Err(error) => {
                warn!(%error, "failed to fetch tiers");
                self.inner
                    .store
                    .set_tiers(Remote::Failure(error.to_string()))
                    .await;
            }
        }
    }

    /// Update the user's personal details.
    ///
    /// The patch is merged into the cached details; when nothing actually
    /// changes the cached profile is returned without a backend call.
    /// Otherwise the backend is updated and the profile re-fetched for
    /// canonical post-update state (falling back to the cached profile if
    /// the re-fetch fails).
    ///
    /// # Errors
    ///
    /// Fails when the backend update is rejected.
    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, patch: &UserDetails) -> Result<UserProfile, SessionError> {
        let user = self.inner.store.user().await.get_or_else(UserProfile::default());
        let merged = user.details.merged(patch);
        if merged == user.details {
            return Ok(user);
        }

        self.inner.api.update_user(&merged).await?;
        Ok(self.fetch_user().await?.unwrap_or(user))
    }

    /// Update the user's postal address, with the same no-op law as
    /// [`update_user`](Self::update_user).
    ///
    /// # Errors
    ///
    /// Fails when the backend update is rejected.
    #[instrument(skip(self, address))]
    pub async fn update_user_address(
        &self,
        address: &Address,
    ) -> Result<UserProfile, SessionError> {
        let user = self.inner.store.user().await.get_or_else(UserProfile::default());
        if user.address.as_ref() == Some(address) {
            return Ok(user);
        }

        self.inner.api.update_user_address(address).await?;
        Ok(self.fetch_user().await?.unwrap_or(user))
    }

    /// Push wallet-derived identity data to the backend user record and
    /// publish the returned profile.
    ///
    /// # Errors
    ///
    /// Fails on missing wallet identity values or a rejected backend call.
    #[instrument(skip(self))]
    pub async fn sync_user_with_wallet(&self) -> Result<(), SessionError> {
        let retail_token = self.generate_retail_token().await?;
        let user = self.inner.api.sync_user_with_wallet(&retail_token).await?;
        self.inner.store.set_user(Remote::Success(user)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(index: u32) -> Tier {
        Tier {
            index,
            name: format!("Tier {index}"),
            state: None,
            limits: None,
        }
    }

    #[test]
    fn test_visible_tiers_sorts_and_drops_tier_zero() {
        let tiers = visible_tiers(vec![tier(0), tier(2), tier(1)]);
        let indices: Vec<u32> = tiers.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_visible_tiers_empty_input() {
        assert!(visible_tiers(Vec::new()).is_empty());
    }

    #[test]
    fn test_visible_tiers_single_tier_is_hidden() {
        assert!(visible_tiers(vec![tier(0)]).is_empty());
    }
}
