use crate::domain::currency::Cryptocurrency;
use crate::domain::issue::{Issue, IssueKey, RepoRef, SeedPrivacy, Wallet};
use crate::domain::ports::Ledger;
use crate::error::{BountyError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    /// Issues in insertion order.
    issues: Vec<Issue>,
    index: HashMap<(String, u64), usize>,
    seeds: HashSet<String>,
    addresses: HashSet<String>,
}

/// A thread-safe in-memory ledger.
///
/// Uses `Arc<RwLock<..>>` so clones share the same tables. Every uniqueness
/// constraint is checked before anything is written, which makes a failed
/// `create_issue` leave no partial rows behind.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

fn index_key(key: &IssueKey) -> (String, u64) {
    (key.repo.canonical(), key.number)
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn issue_exists(&self, key: &IssueKey) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.index.contains_key(&index_key(key)))
    }

    async fn create_issue(
        &self,
        key: &IssueKey,
        wallets: BTreeMap<Cryptocurrency, Wallet>,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;

        let idx = index_key(key);
        if tables.index.contains_key(&idx) {
            return Err(BountyError::Conflict {
                repo: idx.0,
                issue: idx.1,
            });
        }

        let mut new_seeds = HashSet::new();
        let mut new_addresses = HashSet::new();
        for (currency, wallet) in &wallets {
            let seed = wallet.seed.as_ref().ok_or_else(|| {
                BountyError::Integrity(format!("{currency} wallet for {key} has no seed"))
            })?;
            if tables.seeds.contains(seed.expose()) || !new_seeds.insert(seed.expose()) {
                return Err(BountyError::Integrity(format!(
                    "duplicate {currency} seed for {key}"
                )));
            }
            if tables.addresses.contains(&wallet.address)
                || !new_addresses.insert(wallet.address.as_str())
            {
                return Err(BountyError::Integrity(format!(
                    "duplicate {currency} address {} for {key}",
                    wallet.address
                )));
            }
        }

        let new_seeds: Vec<String> = new_seeds.into_iter().map(str::to_string).collect();
        let new_addresses: Vec<String> = new_addresses.into_iter().map(str::to_string).collect();
        tables.seeds.extend(new_seeds);
        tables.addresses.extend(new_addresses);
        let position = tables.issues.len();
        tables.issues.push(Issue::new(key, wallets));
        tables.index.insert(idx, position);
        Ok(())
    }

    async fn get_wallets(&self, key: &IssueKey, privacy: SeedPrivacy) -> Result<Issue> {
        let tables = self.tables.read().await;
        let position = tables
            .index
            .get(&index_key(key))
            .ok_or_else(|| BountyError::NotFound(format!("issue {key}")))?;
        Ok(tables.issues[*position].clone().with_privacy(privacy))
    }

    async fn list_issues(&self, repo: &RepoRef, privacy: SeedPrivacy) -> Result<Vec<Issue>> {
        let tables = self.tables.read().await;
        let canonical = repo.canonical();
        Ok(tables
            .issues
            .iter()
            .filter(|issue| issue.repo == canonical)
            .map(|issue| issue.clone().with_privacy(privacy))
            .collect())
    }
}
