//! User profile and verification state types.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::coin::CoinType;
use super::email::Email;

/// Backend user activation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserActivationState {
    /// No backend user exists for this wallet.
    #[default]
    None,
    /// User record created but not yet active.
    Created,
    /// User is active.
    Active,
    /// User is blocked by the backend.
    Blocked,
}

/// Identity verification (KYC) state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycState {
    /// Verification never started.
    #[default]
    None,
    /// Documents submitted, decision pending. The engine refreshes the
    /// profile periodically while in this state.
    Pending,
    /// A manual review is in progress.
    UnderReview,
    /// Verification rejected.
    Rejected,
    /// Submitted documents expired before a decision.
    Expired,
    /// Verification complete.
    Verified,
}

/// Postal address attached to a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub post_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
}

/// Personal detail fields a user may update.
///
/// Kept separate from [`UserProfile`] because partial updates are diffed
/// against exactly these fields; identity and verification fields are
/// owned by the backend and excluded from the diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
}

impl UserDetails {
    /// Merge a patch into these details, returning the result.
    ///
    /// `None` fields in the patch leave the current value untouched, so a
    /// patch equal to the current state merges to an identical value.
    #[must_use]
    pub fn merged(&self, patch: &Self) -> Self {
        Self {
            email: patch.email.clone().or_else(|| self.email.clone()),
            first_name: patch.first_name.clone().or_else(|| self.first_name.clone()),
            last_name: patch.last_name.clone().or_else(|| self.last_name.clone()),
            date_of_birth: patch.date_of_birth.or(self.date_of_birth),
        }
    }
}

/// Backend-reported user record.
///
/// Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend user id; absent for the synthetic not-activated profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub state: UserActivationState,
    #[serde(default)]
    pub kyc_state: KycState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub mobile_verified: bool,
    /// Deposit addresses already shared with the backend, by coin.
    #[serde(default)]
    pub wallet_addresses: HashMap<CoinType, String>,
    #[serde(flatten)]
    pub details: UserDetails,
}

impl UserProfile {
    /// The terminal profile published when a wallet has no backend
    /// credentials: no user exists and none will be created implicitly.
    #[must_use]
    pub fn not_activated() -> Self {
        Self::default()
    }

    /// Whether no backend user exists for this wallet yet.
    #[must_use]
    pub const fn is_not_activated(&self) -> bool {
        matches!(self.state, UserActivationState::None)
    }
}
