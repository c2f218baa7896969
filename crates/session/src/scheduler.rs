//! Renewal scheduler: the engine's two background tasks.
//!
//! Exactly two task kinds exist: session renewal and periodic user
//! refresh. Each kind has at most one live [`JoinHandle`] at any time,
//! tracked explicitly in [`TaskHandles`] so teardown is deterministic
//! rather than relying on runtime-level cancellation propagation.
//!
//! Both tasks are recurring loops that recompute their next delay each
//! iteration; cancellation aborts the loop at its current await point.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use pelican_core::Remote;

use crate::engine::SessionEngine;
use crate::orchestrator::AuthContext;

/// Delay before retrying a failed session renewal.
pub const AUTH_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Period of the user profile refresh while verification is pending.
pub const USER_REFRESH_DELAY: Duration = Duration::from_millis(30_000);

/// Sessions are renewed this long before the backend expiry.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(5);

/// Handles of the two scheduled task kinds.
///
/// `None` means no task of that kind is alive. Owned by the engine
/// instance, not process globals, so independent engines can coexist.
#[derive(Debug, Default)]
pub(crate) struct TaskHandles {
    renew_session: Option<JoinHandle<()>>,
    renew_user: Option<JoinHandle<()>>,
}

impl TaskHandles {
    pub(crate) const fn new() -> Self {
        Self {
            renew_session: None,
            renew_user: None,
        }
    }
}

/// Delay until a token expiring at `expires_at` should be renewed:
/// the remaining lifetime minus [`TOKEN_EXPIRY_MARGIN`], floored at zero.
#[must_use]
pub(crate) fn renewal_delay(expires_at: DateTime<Utc>) -> Duration {
    (expires_at - Utc::now())
        .to_std()
        .ok()
        .and_then(|remaining| remaining.checked_sub(TOKEN_EXPIRY_MARGIN))
        .unwrap_or(Duration::ZERO)
}

impl SessionEngine {
    /// Start the session renewal loop after `delay`.
    ///
    /// Each successful establishment yields the delay to the next renewal;
    /// a failure publishes `Failure` and retries after [`AUTH_RETRY_DELAY`]
    /// until it succeeds or the session is torn down. Any previously held
    /// renewal handle is aborted first, so at most one loop is ever alive.
    #[instrument(skip(self, ctx))]
    pub(crate) async fn schedule_renewal(&self, ctx: AuthContext, delay: Duration) {
        let mut tasks = self.inner.tasks.lock().await;
        if let Some(handle) = tasks.renew_session.take() {
            handle.abort();
        }

        let engine = self.clone();
        tasks.renew_session = Some(tokio::spawn(async move {
            let mut delay = delay;
            loop {
                tokio::time::sleep(delay).await;
                match engine.establish_session(&ctx).await {
                    Ok(next) => delay = next,
                    Err(error) => {
                        warn!(%error, "session renewal failed, retrying");
                        engine
                            .inner
                            .store
                            .set_api_token(Remote::Failure(error.to_string()))
                            .await;
                        delay = AUTH_RETRY_DELAY;
                    }
                }
            }
        }));
    }

    /// Start the periodic user refresh loop after `delay`.
    ///
    /// No-op when a refresh task is already alive. Refresh failures are
    /// logged and never fatal; the loop continues at [`USER_REFRESH_DELAY`].
    #[instrument(skip(self))]
    pub(crate) async fn schedule_user_refresh(&self, delay: Duration) {
        let mut tasks = self.inner.tasks.lock().await;
        if tasks.renew_user.is_some() {
            return;
        }

        let engine = self.clone();
        tasks.renew_user = Some(tokio::spawn(async move {
            let mut delay = delay;
            loop {
                tokio::time::sleep(delay).await;
                match engine.inner.api.get_user().await {
                    Ok(user) => {
                        engine.inner.store.set_user(Remote::Success(user)).await;
                    }
                    Err(error) => warn!(%error, "periodic user refresh failed"),
                }
                delay = USER_REFRESH_DELAY;
            }
        }));
    }

    /// Cancel both scheduled tasks and reset the session token status.
    ///
    /// Safe to call at any time, including while a task is asleep or
    /// awaiting the backend, and safe to call repeatedly.
    #[instrument(skip(self))]
    pub(crate) async fn cancel_all(&self) {
        {
            let mut tasks = self.inner.tasks.lock().await;
            if let Some(handle) = tasks.renew_session.take() {
                handle.abort();
            }
            if let Some(handle) = tasks.renew_user.take() {
                handle.abort();
            }
        }

        self.inner.api.clear_session_token().await;
        self.inner.store.set_api_token(Remote::NotAsked).await;
        info!("session tasks cancelled");
    }

    /// Whether a session renewal task is alive.
    pub async fn renewal_task_active(&self) -> bool {
        self.inner.tasks.lock().await.renew_session.is_some()
    }

    /// Whether a user refresh task is alive.
    pub async fn user_refresh_task_active(&self) -> bool {
        self.inner.tasks.lock().await.renew_user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renewal_delay_applies_margin() {
        let delay = renewal_delay(Utc::now() + chrono::Duration::seconds(60));
        // 60s lifetime minus the 5s margin, allowing for test scheduling slop.
        assert!(delay > Duration::from_secs(54));
        assert!(delay <= Duration::from_secs(55));
    }

    #[test]
    fn test_renewal_delay_floors_at_zero() {
        assert_eq!(
            renewal_delay(Utc::now() - chrono::Duration::seconds(10)),
            Duration::ZERO
        );
        // Expiry inside the margin also renews immediately.
        assert_eq!(
            renewal_delay(Utc::now() + chrono::Duration::seconds(2)),
            Duration::ZERO
        );
    }
}
