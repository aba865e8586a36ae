use crate::domain::issue::IssueKey;
use crate::domain::ports::IssueTracker;
use crate::error::Result;
use tracing::debug;

/// Finds the body of the merged pull request that closed an issue.
///
/// Walks the issue timeline in order and, for every commit-bearing event,
/// asks the tracker which pull requests contain that commit. The first merged
/// pull request ends the walk. `Ok(None)` means no merged pull request is
/// linked to the issue; any tracker failure is returned as an error so the
/// caller never mistakes it for "nothing found".
pub async fn find_closing_pull_request(
    tracker: &dyn IssueTracker,
    key: &IssueKey,
) -> Result<Option<String>> {
    let events = tracker.list_issue_events(&key.repo, key.number).await?;

    for commit in events.iter().filter_map(|e| e.commit_id.as_deref()) {
        let pulls = tracker.pull_requests_with_commit(&key.repo, commit).await?;
        if let Some(pr) = pulls.into_iter().find(|pr| pr.is_merged()) {
            debug!(issue = %key, commit, pull_request = pr.number, "found closing pull request");
            return Ok(Some(pr.body.unwrap_or_default()));
        }
    }

    debug!(issue = %key, "no merged pull request linked to issue");
    Ok(None)
}
