use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A cryptocurrency the service mints bounty wallets for.
///
/// Every per-currency constant lives in [`CurrencyInfo`]; adding a currency
/// means adding one variant here and one row in [`Cryptocurrency::info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cryptocurrency {
    Bitcoin,
    Ethereum,
}

/// Static capability row for one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    /// Lower-case ticker, as stored in the ledger `symbol` column.
    pub symbol: &'static str,
    pub name: &'static str,
    pub address_explorer: &'static str,
    pub tx_explorer: &'static str,
    /// Identifier understood by the USD rate service.
    pub rate_id: &'static str,
    /// Number of base units per whole coin, as a power of ten.
    pub decimals: u32,
}

const BITCOIN: CurrencyInfo = CurrencyInfo {
    symbol: "btc",
    name: "bitcoin",
    address_explorer: "https://blockchair.com/bitcoin/address",
    tx_explorer: "https://blockchair.com/bitcoin/transaction",
    rate_id: "bitcoin",
    decimals: 8,
};

const ETHEREUM: CurrencyInfo = CurrencyInfo {
    symbol: "eth",
    name: "ethereum",
    address_explorer: "https://etherscan.io/address",
    tx_explorer: "https://blockchair.com/ethereum/transaction",
    rate_id: "ethereum",
    decimals: 18,
};

impl Cryptocurrency {
    pub const ALL: [Cryptocurrency; 2] = [Cryptocurrency::Bitcoin, Cryptocurrency::Ethereum];

    pub const fn info(self) -> &'static CurrencyInfo {
        match self {
            Cryptocurrency::Bitcoin => &BITCOIN,
            Cryptocurrency::Ethereum => &ETHEREUM,
        }
    }

    pub fn symbol(self) -> &'static str {
        self.info().symbol
    }

    /// Upper-case ticker used in pull request bodies, e.g. `BTC`.
    pub fn ticker(self) -> String {
        self.symbol().to_ascii_uppercase()
    }

    pub fn address_url(self, address: &str) -> String {
        format!("{}/{}", self.info().address_explorer, address)
    }

    pub fn tx_url(self, txid: &str) -> String {
        format!("{}/{}", self.info().tx_explorer, txid)
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.symbol().eq_ignore_ascii_case(symbol))
    }
}

impl fmt::Display for Cryptocurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

impl FromStr for Cryptocurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.info().name.eq_ignore_ascii_case(s))
            .or_else(|| Self::from_symbol(s))
            .ok_or_else(|| format!("unsupported cryptocurrency: {s}"))
    }
}
