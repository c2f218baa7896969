//! Wallet state collaborator.
//!
//! Read-only view of the wallet the engine runs inside: identity values
//! used for authentication and per-coin receive addresses used by the
//! address-sharing flow. Address derivation itself is the wallet's
//! concern; the engine never touches key material.

use async_trait::async_trait;
use secrecy::SecretString;

use pelican_core::{CoinType, Email};

/// Read-only wallet state.
#[async_trait]
pub trait WalletState: Send + Sync {
    /// The wallet's email address, if one is set.
    async fn email(&self) -> Option<Email>;

    /// Whether the email address has been verified.
    async fn email_verified(&self) -> bool;

    /// The wallet's globally unique identifier.
    async fn guid(&self) -> String;

    /// The wallet's shared key, used to derive retail access tokens.
    async fn shared_key(&self) -> Option<SecretString>;

    /// Coin types this wallet can derive deposit addresses for.
    async fn supported_coins(&self) -> Vec<CoinType>;

    /// Next available receive address for a coin, if derivable.
    ///
    /// For account-based coins this is the default account identifier.
    async fn receive_address(&self, coin: CoinType) -> Option<String>;
}
