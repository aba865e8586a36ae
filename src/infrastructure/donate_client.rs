//! HTTP client for this service's `/query` and `/pay` endpoints.

use crate::application::ci::BountyService;
use crate::application::payout::PayoutReceipt;
use crate::domain::issue::{Issue, IssueKey};
use crate::error::{BountyError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

#[derive(Clone)]
pub struct DonateClient {
    http: reqwest::Client,
    endpoint: String,
}

impl DonateClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            // Payouts wait on the tracker and the wallet daemon.
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| BountyError::Tracker(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, key: &IssueKey) -> String {
        format!(
            "{}/{}?repo={}&issue={}",
            self.endpoint,
            path,
            key.repo.canonical(),
            key.number
        )
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BountyError::Tracker(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BountyError::InvalidRequest(format!(
                "{url} returned HTTP {status}: {}",
                text.trim()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| BountyError::Tracker(format!("invalid JSON from {url}: {e}")))
    }
}

#[async_trait]
impl BountyService for DonateClient {
    /// Wallet set of an open issue, registering it on first access.
    async fn query(&self, key: &IssueKey) -> Result<Issue> {
        self.fetch(&self.url("query", key)).await
    }

    /// Triggers the payout of a closed issue.
    async fn pay(&self, key: &IssueKey) -> Result<PayoutReceipt> {
        self.fetch(&self.url("pay", key)).await
    }
}
