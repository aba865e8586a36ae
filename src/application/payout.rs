use super::extractor::CandidateAddress;
use crate::config::DefaultDestinations;
use crate::domain::currency::Cryptocurrency;
use crate::domain::issue::Issue;
use crate::domain::ports::{TxId, WalletHandle};
use crate::error::{BountyError, Result};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Transactions sent to contributor-supplied addresses, by currency.
pub type PayoutReceipt = BTreeMap<Cryptocurrency, TxId>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Destination {
    /// Address taken from the closing pull request.
    Discovered(String),
    /// Project-wide fallback.
    Default(String),
}

/// Decides, per currency, where an issue's funds go and sends them.
pub struct PayoutDecider {
    wallets: WalletHandle,
    defaults: DefaultDestinations,
}

impl PayoutDecider {
    pub fn new(wallets: WalletHandle, defaults: DefaultDestinations) -> Self {
        Self { wallets, defaults }
    }

    /// Pays out every supported currency independently.
    ///
    /// Currencies without a candidate go to the default destination. The
    /// receipt only lists transfers to discovered addresses; default-routed
    /// transfers and failed currencies are logged and left out.
    pub async fn pay_out(&self, issue: &Issue, candidates: &[CandidateAddress]) -> PayoutReceipt {
        let attempts = Cryptocurrency::ALL.into_iter().map(|currency| {
            let candidate = candidates
                .iter()
                .find(|c| c.currency == currency)
                .cloned()
                .unwrap_or_else(|| CandidateAddress::absent(currency));
            async move { (currency, self.settle(issue, &candidate).await) }
        });

        join_all(attempts)
            .await
            .into_iter()
            .filter_map(|(currency, outcome)| match outcome {
                Ok(txid) => txid.map(|txid| (currency, txid)),
                Err(e @ (BountyError::InvalidAddress { .. } | BountyError::NotFound(_))) => {
                    warn!(repo = %issue.repo, issue = issue.id, %currency, "skipping payout: {e}");
                    None
                }
                Err(e) => {
                    error!(repo = %issue.repo, issue = issue.id, %currency, "payout failed: {e}");
                    None
                }
            })
            .collect()
    }

    async fn destination(&self, candidate: &CandidateAddress) -> Result<Destination> {
        let currency = candidate.currency;
        let Some(address) = candidate.address.as_deref() else {
            return Ok(Destination::Default(self.defaults.get(currency).to_string()));
        };

        // Validator errors skip the currency, same as a rejected address.
        if self.wallets.validate(currency, address).await? {
            Ok(Destination::Discovered(address.to_string()))
        } else {
            Err(BountyError::InvalidAddress {
                currency,
                address: address.to_string(),
            })
        }
    }

    /// Sends one currency. Returns the txid only for discovered destinations.
    async fn settle(&self, issue: &Issue, candidate: &CandidateAddress) -> Result<Option<TxId>> {
        let currency = candidate.currency;
        let wallet = issue
            .wallet(currency)
            .ok_or_else(|| BountyError::NotFound(format!("{currency} wallet")))?;
        let seed = wallet
            .seed
            .as_ref()
            .ok_or_else(|| BountyError::Integrity(format!("{currency} seed not loaded")))?;

        match self.destination(candidate).await? {
            Destination::Discovered(address) => {
                let txid = self.wallets.send_all(currency, seed, &address).await?;
                info!(repo = %issue.repo, issue = issue.id, %currency, %txid, "paid contributor");
                Ok(Some(txid))
            }
            Destination::Default(address) => {
                let txid = self.wallets.send_all(currency, seed, &address).await?;
                info!(repo = %issue.repo, issue = issue.id, %currency, %txid, "paid default destination");
                Ok(None)
            }
        }
    }
}
