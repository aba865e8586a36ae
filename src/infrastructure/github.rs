//! GitHub REST client implementing [`IssueTracker`].

use crate::domain::issue::RepoRef;
use crate::domain::ports::IssueTracker;
use crate::domain::tracker::{Comment, IssueEvent, PullRequest, TrackerIssue};
use crate::error::{BountyError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PER_PAGE: u32 = 100;

#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("bountyd"));
        let auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| BountyError::InvalidRequest(format!("invalid tracker token: {e}")))?;
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| BountyError::Tracker(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn repo_url(&self, repo: &RepoRef, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, repo.owner, repo.project, rest
        )
    }

    async fn send(&self, method: Method, url: &str, body: Option<&str>) -> Result<reqwest::Response> {
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&CommentBody { body });
        }

        let response = request
            .send()
            .await
            .map_err(|e| BountyError::Tracker(format!("request to {url} failed: {e}")))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(BountyError::NotFound(url.to_string())),
            status => Err(BountyError::Tracker(format!("{url} returned HTTP {status}"))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.send(Method::GET, url, None)
            .await?
            .json()
            .await
            .map_err(|e| BountyError::Tracker(format!("invalid JSON from {url}: {e}")))
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<TrackerIssue> {
        self.get_json(&self.repo_url(repo, &format!("issues/{number}")))
            .await
    }

    async fn list_issues(&self, repo: &RepoRef) -> Result<Vec<TrackerIssue>> {
        self.get_json(&self.repo_url(repo, &format!("issues?state=all&per_page={PER_PAGE}")))
            .await
    }

    async fn list_issue_events(&self, repo: &RepoRef, number: u64) -> Result<Vec<IssueEvent>> {
        // A missing event list on an issue we already resolved is a tracker
        // failure, not an empty timeline.
        self.get_json(&self.repo_url(
            repo,
            &format!("issues/{number}/events?per_page={PER_PAGE}"),
        ))
        .await
        .map_err(|e| match e {
            BountyError::NotFound(url) => BountyError::Tracker(format!("{url} returned 404")),
            other => other,
        })
    }

    async fn pull_requests_with_commit(
        &self,
        repo: &RepoRef,
        commit: &str,
    ) -> Result<Vec<PullRequest>> {
        self.get_json(&self.repo_url(repo, &format!("commits/{commit}/pulls")))
            .await
            .map_err(|e| match e {
                BountyError::NotFound(url) => BountyError::Tracker(format!("{url} returned 404")),
                other => other,
            })
    }

    async fn list_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<Comment>> {
        self.get_json(&self.repo_url(
            repo,
            &format!("issues/{number}/comments?per_page={PER_PAGE}"),
        ))
        .await
    }

    async fn create_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        let url = self.repo_url(repo, &format!("issues/{number}/comments"));
        self.send(Method::POST, &url, Some(body)).await?;
        Ok(())
    }

    async fn edit_comment(&self, repo: &RepoRef, comment_id: u64, body: &str) -> Result<()> {
        let url = self.repo_url(repo, &format!("issues/comments/{comment_id}"));
        self.send(Method::PATCH, &url, Some(body)).await?;
        Ok(())
    }
}
