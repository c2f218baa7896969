//! The session engine: shared state and construction.
//!
//! [`SessionEngine`] is a cheap `Clone` handle over shared inner state.
//! Background tasks hold their own clone, so the handle the application
//! keeps and the handles inside renewal tasks all observe the same store,
//! task registry, and event bus.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::WalletApi;
use crate::config::SessionConfig;
use crate::events::EventBus;
use crate::metadata::MetadataStore;
use crate::scheduler::TaskHandles;
use crate::store::SessionStore;
use crate::wallet::WalletState;

/// Handle to the session lifecycle engine.
#[derive(Clone)]
pub struct SessionEngine {
    pub(crate) inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    pub(crate) config: SessionConfig,
    pub(crate) api: Arc<dyn WalletApi>,
    pub(crate) metadata: Arc<dyn MetadataStore>,
    pub(crate) wallet: Arc<dyn WalletState>,
    pub(crate) store: SessionStore,
    pub(crate) events: EventBus,
    pub(crate) tasks: Mutex<TaskHandles>,
}

impl SessionEngine {
    /// Create an engine over the given collaborators.
    ///
    /// Nothing runs until [`sign_in`](Self::sign_in) or
    /// [`create_user`](Self::create_user) is invoked.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        api: Arc<dyn WalletApi>,
        metadata: Arc<dyn MetadataStore>,
        wallet: Arc<dyn WalletState>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                api,
                metadata,
                wallet,
                store: SessionStore::default(),
                events: EventBus::new(),
                tasks: Mutex::new(TaskHandles::new()),
            }),
        }
    }

    /// The published session state.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    /// The event bus shared with the embedding application.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
