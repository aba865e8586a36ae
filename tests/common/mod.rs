#![allow(dead_code)]

use async_trait::async_trait;
use bountyd::application::engine::BountyEngine;
use bountyd::config::DefaultDestinations;
use bountyd::domain::currency::Cryptocurrency;
use bountyd::domain::issue::{IssueKey, RepoRef, Seed, Wallet};
use bountyd::domain::ports::{IssueTracker, LedgerHandle, MarketData, TxId, WalletLibrary};
use bountyd::domain::tracker::{Comment, IssueEvent, IssueState, PullRequest, TrackerIssue};
use bountyd::error::{BountyError, Result};
use bountyd::infrastructure::in_memory::InMemoryLedger;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const REPO: &str = "github.com/jollheef/donate";
pub const DEFAULT_BTC: &str = "bc1qdefault";
pub const DEFAULT_ETH: &str = "0xdefault";

pub fn key(number: u64) -> IssueKey {
    IssueKey::new(RepoRef::parse(REPO).unwrap(), number)
}

pub fn defaults() -> DefaultDestinations {
    DefaultDestinations::new(DEFAULT_BTC, DEFAULT_ETH).unwrap()
}

pub fn merged_pr(number: u64, body: &str) -> PullRequest {
    PullRequest {
        number,
        body: Some(body.to_string()),
        merged_at: Some(Utc::now()),
    }
}

pub fn unmerged_pr(number: u64, body: &str) -> PullRequest {
    PullRequest {
        number,
        body: Some(body.to_string()),
        merged_at: None,
    }
}

/// In-process tracker with scripted issues, timelines and pull requests.
#[derive(Default)]
pub struct ScriptedTracker {
    issues: Mutex<HashMap<u64, TrackerIssue>>,
    events: Mutex<HashMap<u64, Vec<IssueEvent>>>,
    pulls: Mutex<HashMap<String, Vec<PullRequest>>>,
    comments: Mutex<HashMap<u64, Vec<Comment>>>,
    broken_timelines: Mutex<HashSet<u64>>,
    next_comment_id: AtomicU64,
    edits: Mutex<Vec<(u64, String)>>,
    commit_lookups: Mutex<Vec<String>>,
}

impl ScriptedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_issue(&self, number: u64) {
        self.issues.lock().unwrap().insert(
            number,
            TrackerIssue {
                number,
                state: IssueState::Open,
                title: format!("issue {number}"),
                closed_at: None,
            },
        );
    }

    pub fn close_issue(&self, number: u64, closed_at: DateTime<Utc>) {
        self.issues.lock().unwrap().insert(
            number,
            TrackerIssue {
                number,
                state: IssueState::Closed,
                title: format!("issue {number}"),
                closed_at: Some(closed_at),
            },
        );
    }

    /// Adds a timeline event; `None` is an event without a commit.
    pub fn push_event(&self, number: u64, commit: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .entry(number)
            .or_default()
            .push(IssueEvent {
                event: if commit.is_some() { "referenced" } else { "labeled" }.to_string(),
                commit_id: commit.map(str::to_string),
            });
    }

    pub fn add_pull(&self, commit: &str, pr: PullRequest) {
        self.pulls
            .lock()
            .unwrap()
            .entry(commit.to_string())
            .or_default()
            .push(pr);
    }

    pub fn break_timeline(&self, number: u64) {
        self.broken_timelines.lock().unwrap().insert(number);
    }

    pub fn comments(&self, number: u64) -> Vec<Comment> {
        self.comments
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default()
    }

    pub fn edits(&self) -> Vec<(u64, String)> {
        self.edits.lock().unwrap().clone()
    }

    /// Commits passed to `pull_requests_with_commit`, in call order.
    pub fn commit_lookups(&self) -> Vec<String> {
        self.commit_lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTracker for ScriptedTracker {
    async fn get_issue(&self, _repo: &RepoRef, number: u64) -> Result<TrackerIssue> {
        self.issues
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| BountyError::NotFound(format!("issue {number}")))
    }

    async fn list_issues(&self, _repo: &RepoRef) -> Result<Vec<TrackerIssue>> {
        let mut issues: Vec<_> = self.issues.lock().unwrap().values().cloned().collect();
        issues.sort_by_key(|i| i.number);
        Ok(issues)
    }

    async fn list_issue_events(&self, _repo: &RepoRef, number: u64) -> Result<Vec<IssueEvent>> {
        if self.broken_timelines.lock().unwrap().contains(&number) {
            return Err(BountyError::Tracker("timeline unavailable".into()));
        }
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn pull_requests_with_commit(
        &self,
        _repo: &RepoRef,
        commit: &str,
    ) -> Result<Vec<PullRequest>> {
        self.commit_lookups.lock().unwrap().push(commit.to_string());
        Ok(self
            .pulls
            .lock()
            .unwrap()
            .get(commit)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_comments(&self, _repo: &RepoRef, number: u64) -> Result<Vec<Comment>> {
        Ok(self.comments(number))
    }

    async fn create_comment(&self, _repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        let id = self.next_comment_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.comments
            .lock()
            .unwrap()
            .entry(number)
            .or_default()
            .push(Comment {
                id,
                body: body.to_string(),
            });
        Ok(())
    }

    async fn edit_comment(&self, _repo: &RepoRef, comment_id: u64, body: &str) -> Result<()> {
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .values_mut()
            .flatten()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| BountyError::NotFound(format!("comment {comment_id}")))?;
        comment.body = body.to_string();
        self.edits.lock().unwrap().push((comment_id, body.to_string()));
        Ok(())
    }
}

/// One `send_all` call as seen by the wallet library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub currency: Cryptocurrency,
    pub seed: String,
    pub destination: String,
    pub txid: TxId,
}

/// Wallet library that hands out sequential wallets and records transfers.
#[derive(Default)]
pub struct RecordingWallets {
    counter: AtomicU64,
    invalid: Mutex<HashSet<String>>,
    validator_down: Mutex<HashSet<String>>,
    failing_sends: Mutex<HashSet<Cryptocurrency>>,
    constant_addresses: bool,
    send_delay: Option<Duration>,
    in_flight: Mutex<HashMap<Cryptocurrency, usize>>,
    max_in_flight: Mutex<HashMap<Cryptocurrency, usize>>,
    sends: Mutex<Vec<Transfer>>,
}

impl RecordingWallets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every generated wallet gets the same seed and address.
    pub fn colliding() -> Self {
        Self {
            constant_addresses: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            send_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn reject(&self, address: &str) {
        self.invalid.lock().unwrap().insert(address.to_string());
    }

    pub fn cannot_validate(&self, address: &str) {
        self.validator_down.lock().unwrap().insert(address.to_string());
    }

    pub fn fail_sends(&self, currency: Cryptocurrency) {
        self.failing_sends.lock().unwrap().insert(currency);
    }

    pub fn sends(&self) -> Vec<Transfer> {
        self.sends.lock().unwrap().clone()
    }

    pub fn sent_to(&self, currency: Cryptocurrency) -> Vec<String> {
        self.sends()
            .into_iter()
            .filter(|s| s.currency == currency)
            .map(|s| s.destination)
            .collect()
    }

    pub fn max_concurrent_sends(&self, currency: Cryptocurrency) -> usize {
        self.max_in_flight
            .lock()
            .unwrap()
            .get(&currency)
            .copied()
            .unwrap_or(0)
    }

    fn enter(&self, currency: Cryptocurrency) {
        let mut in_flight = self.in_flight.lock().unwrap();
        let now = in_flight.entry(currency).or_default();
        *now += 1;
        let mut max = self.max_in_flight.lock().unwrap();
        let peak = max.entry(currency).or_default();
        *peak = (*peak).max(*now);
    }

    fn leave(&self, currency: Cryptocurrency) {
        if let Some(now) = self.in_flight.lock().unwrap().get_mut(&currency) {
            *now -= 1;
        }
    }
}

#[async_trait]
impl WalletLibrary for RecordingWallets {
    async fn generate_wallet(&self, currency: Cryptocurrency) -> Result<Wallet> {
        let n = if self.constant_addresses {
            0
        } else {
            self.counter.fetch_add(1, Ordering::SeqCst) + 1
        };
        Ok(Wallet::new(
            Seed::new(format!("{}seed{n}", currency.symbol())),
            format!("{}addr{n}", currency.symbol()),
        ))
    }

    async fn validate(&self, _currency: Cryptocurrency, address: &str) -> Result<bool> {
        if self.validator_down.lock().unwrap().contains(address) {
            return Err(BountyError::Wallet("validator unreachable".into()));
        }
        Ok(!self.invalid.lock().unwrap().contains(address))
    }

    async fn send_all(
        &self,
        currency: Cryptocurrency,
        seed: &Seed,
        destination: &str,
    ) -> Result<TxId> {
        if self.failing_sends.lock().unwrap().contains(&currency) {
            return Err(BountyError::Wallet("insufficient funds for fee".into()));
        }

        self.enter(currency);
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        self.leave(currency);

        let mut sends = self.sends.lock().unwrap();
        let txid = format!("tx-{}-{}", currency.symbol(), sends.len() + 1);
        sends.push(Transfer {
            currency,
            seed: seed.expose().to_string(),
            destination: destination.to_string(),
            txid: txid.clone(),
        });
        Ok(txid)
    }
}

/// Market with one coin in every wallet at a flat rate.
pub struct FlatMarket;

#[async_trait]
impl MarketData for FlatMarket {
    async fn balance(&self, _currency: Cryptocurrency, _address: &str) -> Result<Decimal> {
        Ok(dec!(1))
    }

    async fn usd_rate(&self, currency: Cryptocurrency) -> Result<Decimal> {
        match currency {
            Cryptocurrency::Bitcoin => Ok(dec!(100)),
            Cryptocurrency::Ethereum => Ok(dec!(10)),
        }
    }
}

pub struct Harness {
    pub engine: Arc<BountyEngine>,
    pub ledger: LedgerHandle,
    pub tracker: Arc<ScriptedTracker>,
    pub wallets: Arc<RecordingWallets>,
}

pub fn harness_with(wallets: RecordingWallets) -> Harness {
    let ledger: LedgerHandle = Arc::new(InMemoryLedger::new());
    let tracker = Arc::new(ScriptedTracker::new());
    let wallets = Arc::new(wallets);
    let engine = Arc::new(BountyEngine::new(
        ledger.clone(),
        tracker.clone(),
        wallets.clone(),
        defaults(),
    ));
    Harness {
        engine,
        ledger,
        tracker,
        wallets,
    }
}

pub fn harness() -> Harness {
    harness_with(RecordingWallets::new())
}

impl Harness {
    /// Registers an open issue's wallets, then closes it.
    pub async fn funded_closed_issue(&self, number: u64) -> bountyd::domain::issue::Issue {
        self.tracker.open_issue(number);
        let issue = self.engine.query(&key(number)).await.unwrap();
        self.tracker.close_issue(number, Utc::now());
        issue
    }
}
