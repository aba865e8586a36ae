//! Repository walker run from CI: keeps donation comments on open issues up
//! to date and triggers payouts for recently closed ones.

use super::comment::{donation_comment, payout_comment};
use super::engine::BountyEngine;
use super::payout::PayoutReceipt;
use crate::domain::currency::Cryptocurrency;
use crate::domain::issue::{Issue, IssueKey, RepoRef};
use crate::domain::ports::{MarketHandle, TrackerHandle};
use crate::domain::tracker::TrackerIssue;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Issues closed longer ago than this are left alone.
pub const PAYOUT_WINDOW_HOURS: i64 = 24;

/// The bounty operations the walker needs, local or remote.
#[async_trait]
pub trait BountyService: Send + Sync {
    async fn query(&self, key: &IssueKey) -> Result<Issue>;
    async fn pay(&self, key: &IssueKey) -> Result<PayoutReceipt>;
}

#[async_trait]
impl BountyService for BountyEngine {
    async fn query(&self, key: &IssueKey) -> Result<Issue> {
        BountyEngine::query(self, key).await
    }

    async fn pay(&self, key: &IssueKey) -> Result<PayoutReceipt> {
        BountyEngine::pay(self, key).await
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    pub commented: usize,
    pub paid: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Action {
    Commented,
    Paid,
    Skipped,
}

pub struct CiWalker {
    tracker: TrackerHandle,
    service: Arc<dyn BountyService>,
    market: MarketHandle,
    dry_run: bool,
}

impl CiWalker {
    pub fn new(
        tracker: TrackerHandle,
        service: Arc<dyn BountyService>,
        market: MarketHandle,
        dry_run: bool,
    ) -> Self {
        Self {
            tracker,
            service,
            market,
            dry_run,
        }
    }

    /// Visits every issue of `repo`. A failing issue is logged and counted;
    /// it does not stop the walk.
    pub async fn walk(&self, repo: &RepoRef, now: DateTime<Utc>) -> Result<WalkSummary> {
        let issues = self.tracker.list_issues(repo).await?;
        let mut summary = WalkSummary::default();

        for issue in issues {
            let key = IssueKey::new(repo.clone(), issue.number);
            match self.walk_issue(&key, &issue, now).await {
                Ok(Action::Commented) => summary.commented += 1,
                Ok(Action::Paid) => summary.paid += 1,
                Ok(Action::Skipped) => summary.skipped += 1,
                Err(e) => {
                    warn!(issue = %key, "ci step failed: {e}");
                    summary.failed += 1;
                }
            }
        }

        info!(repo = %repo, ?summary, "walk finished");
        Ok(summary)
    }

    async fn walk_issue(
        &self,
        key: &IssueKey,
        issue: &TrackerIssue,
        now: DateTime<Utc>,
    ) -> Result<Action> {
        if let Some(closed_at) = issue.closed_at
            && closed_at < now - Duration::hours(PAYOUT_WINDOW_HOURS)
        {
            return Ok(Action::Skipped);
        }

        if issue.is_open() {
            self.update_comment(key).await?;
            Ok(Action::Commented)
        } else {
            self.trigger_payout(key).await
        }
    }

    async fn update_comment(&self, key: &IssueKey) -> Result<()> {
        let issue = self.service.query(key).await?;
        let body = donation_comment(&issue, self.market.as_ref()).await;

        // The bitcoin address identifies the comment this tool owns.
        let marker = issue
            .wallet(Cryptocurrency::Bitcoin)
            .map(|w| w.address.clone())
            .unwrap_or_default();
        let comments = self.tracker.list_comments(&key.repo, key.number).await?;
        let existing = comments
            .iter()
            .find(|c| !marker.is_empty() && c.body.contains(&marker));

        if self.dry_run {
            info!(issue = %key, existing = existing.is_some(), "dry run, comment body:\n{body}");
            return Ok(());
        }

        match existing {
            Some(comment) => {
                self.tracker
                    .edit_comment(&key.repo, comment.id, &body)
                    .await
            }
            None => {
                self.tracker
                    .create_comment(&key.repo, key.number, &body)
                    .await
            }
        }
    }

    async fn trigger_payout(&self, key: &IssueKey) -> Result<Action> {
        let receipt = self.service.pay(key).await?;
        let Some(body) = payout_comment(&receipt) else {
            info!(issue = %key, "no contributor payouts to announce");
            return Ok(Action::Skipped);
        };

        if self.dry_run {
            info!(issue = %key, "dry run, payout comment:\n{body}");
        } else {
            self.tracker
                .create_comment(&key.repo, key.number, &body)
                .await?;
        }
        Ok(Action::Paid)
    }
}
