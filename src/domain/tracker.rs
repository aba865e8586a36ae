use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// Issue as reported by the tracker.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrackerIssue {
    pub number: u64,
    pub state: IssueState,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

impl TrackerIssue {
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }
}

/// One entry of an issue's timeline. Only commit-bearing events matter here.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct IssueEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub commit_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
}
