mod common;

use bountyd::application::ci::{CiWalker, WalkSummary};
use bountyd::application::comment::DONATION_HEADER;
use bountyd::domain::issue::RepoRef;
use chrono::{Duration, Utc};
use common::*;
use std::sync::Arc;

fn walker(h: &Harness, dry_run: bool) -> CiWalker {
    CiWalker::new(
        h.tracker.clone(),
        h.engine.clone(),
        Arc::new(FlatMarket),
        dry_run,
    )
}

fn repo() -> RepoRef {
    RepoRef::parse(REPO).unwrap()
}

#[tokio::test]
async fn test_walk_comments_and_pays() {
    let h = harness();
    let now = Utc::now();

    h.tracker.open_issue(1);

    h.funded_closed_issue(2).await;
    h.tracker.close_issue(2, now - Duration::hours(1));
    h.tracker.push_event(2, Some("aa11"));
    h.tracker.add_pull("aa11", merged_pr(50, "BTC{1Contributor}"));

    h.funded_closed_issue(3).await;
    h.tracker.close_issue(3, now - Duration::days(3));

    h.funded_closed_issue(4).await;

    h.tracker.close_issue(5, now);

    let summary = walker(&h, false).walk(&repo(), now).await.unwrap();

    assert_eq!(summary, WalkSummary {
        commented: 1,
        paid: 1,
        skipped: 2,
        failed: 1,
    });

    let donation = h.tracker.comments(1);
    assert_eq!(donation.len(), 1);
    assert!(donation[0].body.starts_with(DONATION_HEADER));
    assert!(donation[0].body.contains("- Total $110.00"));

    let payout = h.tracker.comments(2);
    assert_eq!(payout.len(), 1);
    assert!(payout[0].body.starts_with("Payout transactions:\n- BTC: [tx-btc-"));

    assert!(h.tracker.comments(3).is_empty());
    assert!(h.tracker.comments(4).is_empty());
    // Issue 3 closed outside the window and was never paid out.
    assert_eq!(h.wallets.sends().len(), 4);
}

#[tokio::test]
async fn test_second_walk_edits_existing_comment() {
    let h = harness();
    h.tracker.open_issue(1);
    let walker = walker(&h, false);

    walker.walk(&repo(), Utc::now()).await.unwrap();
    walker.walk(&repo(), Utc::now()).await.unwrap();

    assert_eq!(h.tracker.comments(1).len(), 1);
    assert_eq!(h.tracker.edits().len(), 1);
}

#[tokio::test]
async fn test_dry_run_posts_nothing() {
    let h = harness();
    h.tracker.open_issue(1);
    h.funded_closed_issue(2).await;
    h.tracker.push_event(2, Some("bb22"));
    h.tracker.add_pull("bb22", merged_pr(51, "ETH{0xContributor}"));

    let summary = walker(&h, true).walk(&repo(), Utc::now()).await.unwrap();

    assert_eq!(summary.commented, 1);
    assert_eq!(summary.paid, 1);
    assert!(h.tracker.comments(1).is_empty());
    assert!(h.tracker.comments(2).is_empty());
}
