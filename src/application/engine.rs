use super::extractor::extract_candidates;
use super::locks::IssueLocks;
use super::payout::{PayoutDecider, PayoutReceipt};
use super::timeline::find_closing_pull_request;
use crate::config::DefaultDestinations;
use crate::domain::currency::Cryptocurrency;
use crate::domain::issue::{Issue, IssueKey, RepoRef, SeedPrivacy};
use crate::domain::ports::{LedgerHandle, TrackerHandle, WalletHandle};
use crate::error::{BountyError, Result};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Which issues a `/query` request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSelector {
    All,
    Number(u64),
}

impl IssueSelector {
    /// A missing or empty value selects every issue.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Ok(Self::All),
            Some(n) => n
                .parse()
                .map(Self::Number)
                .map_err(|_| BountyError::InvalidRequest("invalid issue".into())),
        }
    }
}

/// The bounty resolution engine.
///
/// Registers wallet sets for open issues and resolves payouts for closed
/// ones. It keeps no state between requests apart from the per-issue locks
/// that serialize payout attempts on the same issue.
pub struct BountyEngine {
    ledger: LedgerHandle,
    tracker: TrackerHandle,
    wallets: WalletHandle,
    decider: PayoutDecider,
    locks: IssueLocks,
}

impl BountyEngine {
    pub fn new(
        ledger: LedgerHandle,
        tracker: TrackerHandle,
        wallets: WalletHandle,
        defaults: DefaultDestinations,
    ) -> Self {
        Self {
            decider: PayoutDecider::new(wallets.clone(), defaults),
            ledger,
            tracker,
            wallets,
            locks: IssueLocks::new(),
        }
    }

    /// Returns the wallet set of an issue, generating it the first time an
    /// open issue is queried. Seeds are never included.
    pub async fn query(&self, key: &IssueKey) -> Result<Issue> {
        if self.ledger.issue_exists(key).await? {
            return self.ledger.get_wallets(key, SeedPrivacy::Hide).await;
        }

        let tracked = self
            .tracker
            .get_issue(&key.repo, key.number)
            .await
            .map_err(|e| match e {
                BountyError::NotFound(_) => BountyError::NotFound("invalid repo/issue".into()),
                other => other,
            })?;
        if !tracked.is_open() {
            return Err(BountyError::NotOpen);
        }

        let mut wallets = BTreeMap::new();
        for currency in Cryptocurrency::ALL {
            wallets.insert(currency, self.wallets.generate_wallet(currency).await?);
        }

        match self.ledger.create_issue(key, wallets.clone()).await {
            Ok(()) => {
                info!(issue = %key, "registered bounty wallets");
                Ok(Issue::new(key, wallets).with_privacy(SeedPrivacy::Hide))
            }
            // Another request registered the issue first; its wallets win.
            Err(BountyError::Conflict { .. }) => {
                warn!(issue = %key, "concurrent registration, using stored wallets");
                self.ledger.get_wallets(key, SeedPrivacy::Hide).await
            }
            Err(e) => {
                if e.is_fatal_integrity() {
                    error!(issue = %key, "wallet uniqueness violated: {e}");
                }
                Err(e)
            }
        }
    }

    /// All registered issues of a repository, without seeds.
    pub async fn list(&self, repo: &RepoRef) -> Result<Vec<Issue>> {
        self.ledger.list_issues(repo, SeedPrivacy::Hide).await
    }

    /// Runs one payout attempt for a closed issue.
    pub async fn pay(&self, key: &IssueKey) -> Result<PayoutReceipt> {
        let guard = self.locks.acquire(key).await;
        let receipt = self.pay_locked(key).await;
        drop(guard);
        self.locks.prune().await;
        receipt
    }

    async fn pay_locked(&self, key: &IssueKey) -> Result<PayoutReceipt> {
        let issue = self
            .ledger
            .get_wallets(key, SeedPrivacy::Reveal)
            .await
            .map_err(|e| match e {
                BountyError::NotFound(_) => {
                    BountyError::NotFound("repo/issue not found in database".into())
                }
                other => other,
            })?;

        let tracked = self
            .tracker
            .get_issue(&key.repo, key.number)
            .await
            .map_err(|e| match e {
                BountyError::NotFound(_) => BountyError::NotFound("invalid repo/issue".into()),
                other => other,
            })?;
        if tracked.is_open() {
            return Err(BountyError::StillOpen);
        }

        let candidates = match find_closing_pull_request(self.tracker.as_ref(), key).await? {
            Some(body) => extract_candidates(&body),
            None => Vec::new(),
        };
        for candidate in &candidates {
            info!(
                issue = %key,
                currency = %candidate.currency,
                found = candidate.found(),
                "candidate address"
            );
        }

        let receipt = self.decider.pay_out(&issue, &candidates).await;
        info!(issue = %key, paid = receipt.len(), "payout attempt finished");
        Ok(receipt)
    }
}
