//! Pelican Session - session lifecycle engine.
//!
//! This crate drives the wallet's backend session from sign-in to logout:
//!
//! - exchanges long-lived credentials for a short-lived API token and
//!   proactively renews it before expiry
//! - recovers from the backend's "user restored" condition without
//!   surfacing it as a generic failure
//! - keeps the user profile and verification-tier list in sync, with a
//!   periodic refresh while identity verification is pending
//! - runs one-shot account-linking and address-sharing flows
//! - tears everything down deterministically on logout
//!
//! At most one renewal task and one user-refresh task are alive at any
//! time; both are cancelled atomically by [`SessionEngine::clear_session`].
//!
//! The backend API, the wallet's key-value metadata store, and the wallet
//! state are opaque collaborators behind the [`WalletApi`],
//! [`MetadataStore`], and [`WalletState`] traits.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod metadata;
pub mod scheduler;
pub mod store;
pub mod wallet;

mod linking;
mod orchestrator;
mod sync;

pub use api::{ApiError, ApiToken, RestClient, WalletApi};
pub use config::{ConfigError, SessionConfig};
pub use engine::SessionEngine;
pub use error::SessionError;
pub use events::{EventBus, SessionEvent};
pub use linking::ExchangeLink;
pub use metadata::{MetadataError, MetadataStore};
pub use scheduler::{AUTH_RETRY_DELAY, TOKEN_EXPIRY_MARGIN, USER_REFRESH_DELAY};
pub use store::SessionStore;
pub use wallet::WalletState;
