//! Session orchestrator: sign-in, establishment, recovery, and teardown.
//!
//! The state machine is `Idle → Authenticating → SessionActive`, with a
//! `RecoveringUser` detour when the backend signals that the user record
//! was restored out-of-band, and back to `Idle` on teardown. States are
//! not reified; they are carried by the published token status and the
//! liveness of the renewal task.

use std::time::Duration;

use secrecy::SecretString;
use tracing::{info, instrument};

use pelican_core::{Credentials, Email, Remote, UserProfile};

use crate::api::ApiToken;
use crate::engine::SessionEngine;
use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::scheduler::renewal_delay;

/// Everything a renewal iteration needs to re-establish the session.
#[derive(Debug, Clone)]
pub(crate) struct AuthContext {
    pub(crate) credentials: Credentials,
    pub(crate) email: Email,
    pub(crate) guid: String,
}

impl SessionEngine {
    /// Begin the session lifecycle for a signed-in wallet.
    ///
    /// Reads the wallet email and guid, then the stored backend
    /// credentials. A wallet without credentials gets the terminal
    /// not-activated profile and no session; otherwise the renewal loop
    /// starts immediately and keeps the session alive until
    /// [`clear_session`](Self::clear_session).
    ///
    /// # Errors
    ///
    /// Fails if the wallet has no email or the metadata store is
    /// unreadable. Backend failures do not surface here; the renewal loop
    /// absorbs and retries them.
    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<(), SessionError> {
        let email = self
            .inner
            .wallet
            .email()
            .await
            .ok_or(SessionError::MissingValue("email"))?;
        let guid = self.inner.wallet.guid().await;

        let Some(credentials) = self.inner.metadata.credentials().await? else {
            info!("no stored credentials, user is not activated");
            self.inner
                .store
                .set_user(Remote::Success(UserProfile::not_activated()))
                .await;
            return Ok(());
        };

        self.inner.store.set_api_token(Remote::Loading).await;
        self.schedule_renewal(
            AuthContext {
                credentials,
                email,
                guid,
            },
            Duration::ZERO,
        )
        .await;
        Ok(())
    }

    /// Establish a session, recovering once if the user was restored.
    ///
    /// Returns the delay until the next renewal. Called only from the
    /// renewal loop and [`create_user`](Self::create_user).
    pub(crate) async fn establish_session(
        &self,
        ctx: &AuthContext,
    ) -> Result<Duration, SessionError> {
        match self.try_establish(ctx).await {
            Err(error) if error.is_user_restored() => {
                info!("backend user was restored, running recovery");
                self.recover_user().await?;
                self.try_establish(ctx).await
            }
            result => result,
        }
    }

    /// One establishment attempt: token exchange, profile sync, realtime
    /// restart. Only the restored-user marker escapes `fetch_user`.
    async fn try_establish(&self, ctx: &AuthContext) -> Result<Duration, SessionError> {
        let session = self
            .inner
            .api
            .generate_session(&ctx.credentials, &ctx.email, &ctx.guid)
            .await?;

        self.inner
            .api
            .set_session_token(session.token.clone())
            .await;
        self.inner
            .store
            .set_api_token(Remote::Success(ApiToken::new(
                session.token,
                session.expires_at,
            )))
            .await;

        self.fetch_user().await?;
        self.inner.events.publish(SessionEvent::RealtimeRestart);

        Ok(renewal_delay(session.expires_at))
    }

    /// Recover a backend user record that was reset out-of-band.
    ///
    /// Assumes credentials were previously known; their absence here is a
    /// fatal flow error, not a registration trigger.
    #[instrument(skip(self))]
    pub(crate) async fn recover_user(&self) -> Result<(), SessionError> {
        let retail_token = self.generate_retail_token().await?;
        let credentials = self
            .inner
            .metadata
            .credentials()
            .await?
            .ok_or(SessionError::MissingValue("credentials"))?;
        self.inner
            .api
            .recover_user(&credentials, &retail_token)
            .await?;
        Ok(())
    }

    /// Register a backend user if needed and establish a session.
    ///
    /// Idempotent entry point: when the session token status is anything
    /// but `NotAsked` a lifecycle is already in flight (or active) and the
    /// call returns without touching the backend.
    ///
    /// # Errors
    ///
    /// Fails on missing wallet values, metadata errors, or when the
    /// initial establishment fails. A failed attempt resets the token
    /// status to `NotAsked`, so the call can be retried.
    #[instrument(skip(self))]
    pub async fn create_user(&self) -> Result<(), SessionError> {
        if !self.inner.store.api_token().await.is_not_asked() {
            return Ok(());
        }

        let email = self
            .inner
            .wallet
            .email()
            .await
            .ok_or(SessionError::MissingValue("email"))?;
        let guid = self.inner.wallet.guid().await;

        let credentials = match self.inner.metadata.credentials().await? {
            Some(credentials) => credentials,
            None => self.generate_auth_credentials().await?,
        };

        let ctx = AuthContext {
            credentials,
            email,
            guid,
        };

        self.inner.store.set_api_token(Remote::Loading).await;
        match self.establish_session(&ctx).await {
            Ok(next) => {
                self.schedule_renewal(ctx, next).await;
                Ok(())
            }
            Err(error) => {
                // Back to NotAsked, not Failure: the guard above keys on
                // NotAsked, and a failed attempt must stay retryable.
                self.inner.store.set_api_token(Remote::NotAsked).await;
                Err(error)
            }
        }
    }

    /// Register a new backend user and persist the returned credentials.
    async fn generate_auth_credentials(&self) -> Result<Credentials, SessionError> {
        let retail_token = self.generate_retail_token().await?;
        let partner_id = self.inner.metadata.partner_id().await?;
        let created = self
            .inner
            .api
            .create_user(&retail_token, partner_id.as_deref())
            .await?;

        let credentials = Credentials::new(created.user_id, created.token);
        self.inner.metadata.store_credentials(&credentials).await?;
        Ok(credentials)
    }

    /// Derive a retail access token from the wallet's identity.
    pub(crate) async fn generate_retail_token(&self) -> Result<SecretString, SessionError> {
        let guid = self.inner.wallet.guid().await;
        let shared_key = self
            .inner
            .wallet
            .shared_key()
            .await
            .ok_or(SessionError::MissingValue("sharedKey"))?;
        let response = self
            .inner
            .api
            .generate_retail_token(&guid, &shared_key)
            .await?;
        Ok(response.token)
    }

    /// Tear down the session: cancel both scheduled tasks, drop the
    /// cached token, and reset the token status to `NotAsked`. Idempotent.
    #[instrument(skip(self))]
    pub async fn clear_session(&self) {
        self.cancel_all().await;
    }
}
