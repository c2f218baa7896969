//! Coin types supported for deposit address sharing.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A coin type the wallet can derive deposit addresses for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoinType {
    Btc,
    Bch,
    Eth,
    Xlm,
    /// ERC-20 stablecoin; shares the ETH account address.
    Pax,
}

impl CoinType {
    /// All coin types the engine knows how to derive addresses for.
    pub const ALL: [Self; 5] = [Self::Btc, Self::Bch, Self::Eth, Self::Xlm, Self::Pax];

    /// Ticker symbol as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Bch => "BCH",
            Self::Eth => "ETH",
            Self::Xlm => "XLM",
            Self::Pax => "PAX",
        }
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
