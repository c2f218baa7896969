//! Long-lived backend credentials.

use serde::{Deserialize, Serialize};

/// Long-lived identifiers used to establish backend sessions.
///
/// Fetched from (and persisted to) the wallet's key-value metadata store.
/// The lifetime token never expires; it is exchanged for short-lived API
/// tokens by the session engine. Absence of either field means the wallet
/// has never registered a backend user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Backend user identifier.
    pub user_id: String,
    /// Long-lived token exchanged for short-lived session tokens.
    pub lifetime_token: String,
}

impl Credentials {
    /// Create credentials from their two parts.
    #[must_use]
    pub const fn new(user_id: String, lifetime_token: String) -> Self {
        Self {
            user_id,
            lifetime_token,
        }
    }
}
