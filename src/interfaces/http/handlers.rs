use crate::application::engine::{BountyEngine, IssueSelector};
use crate::application::payout::PayoutReceipt;
use crate::domain::issue::{IssueKey, RepoRef};
use crate::error::{BountyError, Result};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct IssueParams {
    repo: Option<String>,
    issue: Option<String>,
}

impl IssueParams {
    fn parse(&self) -> Result<(RepoRef, IssueSelector)> {
        let repo = self
            .repo
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| BountyError::InvalidRequest("No repo specified".into()))?;
        Ok((RepoRef::parse(repo)?, IssueSelector::parse(self.issue.as_deref())?))
    }
}

pub async fn query(
    State(engine): State<Arc<BountyEngine>>,
    Query(params): Query<IssueParams>,
) -> Result<Response> {
    let (repo, selector) = params.parse()?;
    match selector {
        IssueSelector::All => Ok(Json(engine.list(&repo).await?).into_response()),
        IssueSelector::Number(number) => {
            let key = IssueKey::new(repo, number);
            Ok(Json(engine.query(&key).await?).into_response())
        }
    }
}

pub async fn pay(
    State(engine): State<Arc<BountyEngine>>,
    Query(params): Query<IssueParams>,
) -> Result<(StatusCode, Json<PayoutReceipt>)> {
    let (repo, selector) = params.parse()?;
    let IssueSelector::Number(number) = selector else {
        return Err(BountyError::InvalidRequest("invalid issue".into()));
    };

    let key = IssueKey::new(repo, number);
    info!(issue = %key, "payout requested");
    let receipt = engine.pay(&key).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
