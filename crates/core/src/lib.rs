//! Pelican Core - Shared domain types.
//!
//! This crate provides common types used across all Pelican Wallet components:
//! - `session` - Session lifecycle engine (token renewal, user sync, linking)
//! - `integration-tests` - Behavioral tests with mock collaborators
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Remote data statuses, user/KYC records, tiers, coins, credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
