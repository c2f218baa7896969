//! Verification tier descriptors.

use serde::{Deserialize, Serialize};

/// Trade limits attached to a verification tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierLimits {
    /// Fiat currency the limits are denominated in.
    pub currency: String,
    /// Daily limit, decimal string as reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<String>,
    /// Annual limit, decimal string as reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual: Option<String>,
}

/// A verification tier as reported by the backend.
///
/// Tiers are ordered by `index`; tier 0 is the implicit unverified tier
/// and is not user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub index: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<TierLimits>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_wire_format() {
        let json = serde_json::json!({
            "index": 1,
            "name": "Tier 1",
            "state": "verified",
            "limits": { "currency": "USD", "annual": "1000.0" }
        });
        let tier: Tier = serde_json::from_value(json).unwrap();
        assert_eq!(tier.index, 1);
        assert_eq!(tier.limits.unwrap().annual.as_deref(), Some("1000.0"));
    }
}
