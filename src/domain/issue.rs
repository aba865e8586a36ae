use super::currency::Cryptocurrency;
use crate::error::{BountyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const GITHUB_HOST: &str = "github.com";
// GitHub caps user names at 39 and repository names at 100 characters.
const MAX_OWNER_LEN: usize = 39;
const MAX_PROJECT_LEN: usize = 100;

/// A repository on the tracker, in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoRef {
    pub owner: String,
    pub project: String,
}

impl RepoRef {
    /// Parses `github.com/owner/name` or `owner/name`.
    pub fn parse(raw: &str) -> Result<Self> {
        let fields: Vec<&str> = raw.trim().trim_end_matches('/').split('/').collect();
        let (owner, project) = match fields.as_slice() {
            [host, owner, project] if *host == GITHUB_HOST => (*owner, *project),
            [_, _, _] => {
                return Err(BountyError::InvalidRequest(
                    "non-github repos are not supported yet".into(),
                ));
            }
            [owner, project] => (*owner, *project),
            _ => return Err(BountyError::InvalidRequest("invalid repo".into())),
        };

        let valid_segment = |s: &str, max: usize| {
            !s.is_empty()
                && s.len() <= max
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid_segment(owner, MAX_OWNER_LEN) || !valid_segment(project, MAX_PROJECT_LEN) {
            return Err(BountyError::InvalidRequest("invalid repo".into()));
        }

        Ok(Self {
            owner: owner.to_string(),
            project: project.to_string(),
        })
    }

    /// Ledger key form, `github.com/owner/name`.
    pub fn canonical(&self) -> String {
        format!("{}/{}/{}", GITHUB_HOST, self.owner, self.project)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.project)
    }
}

/// Identifies one bounty target: a tracker issue number within a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssueKey {
    pub repo: RepoRef,
    pub number: u64,
}

impl IssueKey {
    pub fn new(repo: RepoRef, number: u64) -> Self {
        Self { repo, number }
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Private wallet restoration material.
///
/// `Debug` is redacted so a seed can never end up in a log line.
#[derive(Clone, PartialEq, Eq)]
pub struct Seed(String);

impl Seed {
    pub fn new(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

/// Whether ledger reads should carry wallet seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPrivacy {
    Hide,
    Reveal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(skip)]
    pub seed: Option<Seed>,
    pub address: String,
}

impl Wallet {
    pub fn new(seed: Seed, address: impl Into<String>) -> Self {
        Self {
            seed: Some(seed),
            address: address.into(),
        }
    }

    pub fn with_privacy(mut self, privacy: SeedPrivacy) -> Self {
        if privacy == SeedPrivacy::Hide {
            self.seed = None;
        }
        self
    }
}

/// A registered bounty issue and its per-currency donation wallets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Repository in ledger key form, e.g. `github.com/owner/name`.
    pub repo: String,
    /// Tracker issue number (not the ledger row id).
    pub id: u64,
    pub wallets: BTreeMap<Cryptocurrency, Wallet>,
}

impl Issue {
    pub fn new(key: &IssueKey, wallets: BTreeMap<Cryptocurrency, Wallet>) -> Self {
        Self {
            repo: key.repo.canonical(),
            id: key.number,
            wallets,
        }
    }

    pub fn wallet(&self, currency: Cryptocurrency) -> Option<&Wallet> {
        self.wallets.get(&currency)
    }

    pub fn with_privacy(mut self, privacy: SeedPrivacy) -> Self {
        self.wallets = self
            .wallets
            .into_iter()
            .map(|(c, w)| (c, w.with_privacy(privacy)))
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_forms() {
        let full = RepoRef::parse("github.com/jollheef/donate").unwrap();
        let short = RepoRef::parse("jollheef/donate").unwrap();
        assert_eq!(full, short);
        assert_eq!(full.canonical(), "github.com/jollheef/donate");
        assert_eq!(full.to_string(), "jollheef/donate");
    }

    #[test]
    fn test_parse_repo_rejects_other_hosts() {
        let err = RepoRef::parse("gitlab.com/a/b").unwrap_err();
        assert!(err.to_string().contains("non-github"));
    }

    #[test]
    fn test_parse_repo_rejects_garbage() {
        assert!(RepoRef::parse("").is_err());
        assert!(RepoRef::parse("justone").is_err());
        assert!(RepoRef::parse("a/b/c/d").is_err());
        assert!(RepoRef::parse("owner/<script>").is_err());
        assert!(RepoRef::parse(&format!("{}/x", "o".repeat(40))).is_err());
    }

    #[test]
    fn test_seed_debug_is_redacted() {
        let wallet = Wallet::new(Seed::new("very secret words"), "1abc");
        let printed = format!("{:?}", wallet);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("1abc"));
    }

    #[test]
    fn test_hidden_issue_serializes_without_seed() {
        let key = IssueKey::new(RepoRef::parse("a/b").unwrap(), 7);
        let mut wallets = BTreeMap::new();
        wallets.insert(
            Cryptocurrency::Bitcoin,
            Wallet::new(Seed::new("seed"), "addr"),
        );
        let issue = Issue::new(&key, wallets);

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["repo"], "github.com/a/b");
        assert_eq!(json["id"], 7);
        assert_eq!(json["wallets"]["bitcoin"]["address"], "addr");
        assert!(json["wallets"]["bitcoin"].get("seed").is_none());

        let hidden = issue.with_privacy(SeedPrivacy::Hide);
        assert!(hidden.wallets.values().all(|w| w.seed.is_none()));
    }
}
