use crate::domain::currency::Cryptocurrency;
use crate::error::{BountyError, Result};

/// Fallback payout address per currency, used when a closed issue has no
/// usable contributor address. Loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultDestinations {
    bitcoin: String,
    ethereum: String,
}

impl DefaultDestinations {
    pub fn new(bitcoin: impl Into<String>, ethereum: impl Into<String>) -> Result<Self> {
        let table = Self {
            bitcoin: bitcoin.into().trim().to_string(),
            ethereum: ethereum.into().trim().to_string(),
        };
        for currency in Cryptocurrency::ALL {
            if table.get(currency).is_empty() {
                return Err(BountyError::InvalidRequest(format!(
                    "no default {currency} payout address configured"
                )));
            }
        }
        Ok(table)
    }

    pub fn get(&self, currency: Cryptocurrency) -> &str {
        match currency {
            Cryptocurrency::Bitcoin => &self.bitcoin,
            Cryptocurrency::Ethereum => &self.ethereum,
        }
    }
}
