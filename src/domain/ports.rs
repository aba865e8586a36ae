use super::currency::Cryptocurrency;
use super::issue::{Issue, IssueKey, RepoRef, Seed, SeedPrivacy, Wallet};
use super::tracker::{Comment, IssueEvent, PullRequest, TrackerIssue};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type TxId = String;

/// Persistent store of issues and their per-currency wallets.
///
/// Multi-row writes are atomic: `create_issue` either stores the issue and
/// every wallet, or nothing.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn issue_exists(&self, key: &IssueKey) -> Result<bool>;

    /// Fails with `Conflict` when the issue is already registered and with
    /// `Integrity` when any wallet seed or address is already stored.
    async fn create_issue(
        &self,
        key: &IssueKey,
        wallets: BTreeMap<Cryptocurrency, Wallet>,
    ) -> Result<()>;

    /// Fails with `NotFound` when the issue is not registered.
    async fn get_wallets(&self, key: &IssueKey, privacy: SeedPrivacy) -> Result<Issue>;

    /// Issues of one repository in insertion order.
    async fn list_issues(&self, repo: &RepoRef, privacy: SeedPrivacy) -> Result<Vec<Issue>>;
}

/// Read/write access to the issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fails with `NotFound` when the tracker does not know the issue.
    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<TrackerIssue>;
    async fn list_issues(&self, repo: &RepoRef) -> Result<Vec<TrackerIssue>>;
    /// Timeline events in chronological order.
    async fn list_issue_events(&self, repo: &RepoRef, number: u64) -> Result<Vec<IssueEvent>>;
    async fn pull_requests_with_commit(
        &self,
        repo: &RepoRef,
        commit: &str,
    ) -> Result<Vec<PullRequest>>;
    async fn list_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<Comment>>;
    async fn create_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()>;
    async fn edit_comment(&self, repo: &RepoRef, comment_id: u64, body: &str) -> Result<()>;
}

/// Key generation, address validation and transfers, per currency.
#[async_trait]
pub trait WalletLibrary: Send + Sync {
    async fn generate_wallet(&self, currency: Cryptocurrency) -> Result<Wallet>;
    async fn validate(&self, currency: Cryptocurrency, address: &str) -> Result<bool>;
    /// Transfers the whole balance controlled by `seed` to `destination`.
    async fn send_all(
        &self,
        currency: Cryptocurrency,
        seed: &Seed,
        destination: &str,
    ) -> Result<TxId>;
}

/// Balance and exchange-rate lookups, used only for display text.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Balance in whole coins.
    async fn balance(&self, currency: Cryptocurrency, address: &str) -> Result<Decimal>;
    async fn usd_rate(&self, currency: Cryptocurrency) -> Result<Decimal>;
}

pub type LedgerHandle = Arc<dyn Ledger>;
pub type TrackerHandle = Arc<dyn IssueTracker>;
pub type WalletHandle = Arc<dyn WalletLibrary>;
pub type MarketHandle = Arc<dyn MarketData>;
