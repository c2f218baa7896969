//! Core types for Pelican Wallet.
//!
//! This module provides type-safe representations of the domain concepts
//! shared between the session engine and its consumers.

pub mod campaign;
pub mod coin;
pub mod credential;
pub mod email;
pub mod remote;
pub mod tier;
pub mod user;

pub use campaign::Campaign;
pub use coin::CoinType;
pub use credential::Credentials;
pub use email::{Email, EmailError};
pub use remote::Remote;
pub use tier::{Tier, TierLimits};
pub use user::{Address, KycState, UserActivationState, UserDetails, UserProfile};
