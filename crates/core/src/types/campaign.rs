//! Marketing campaign descriptor.

use serde::{Deserialize, Serialize};

/// An airdrop/marketing campaign a user may enroll in.
///
/// Some campaigns require extra request headers carrying enrollment data;
/// the session engine derives those from this descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Campaign identifier, e.g. `sunriver`.
    pub name: String,
    /// Enrollment code.
    pub code: String,
    /// Email the user enrolled with.
    pub email: String,
}
