use crate::domain::currency::Cryptocurrency;
use crate::domain::issue::{Issue, IssueKey, RepoRef, Seed, SeedPrivacy, Wallet};
use crate::domain::ports::Ledger;
use crate::error::{BountyError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for issue rows, keyed by big-endian row id.
pub const CF_ISSUES: &str = "issues";
/// UNIQUE(repo, issue): `repo \0 issue` -> issue row id.
pub const CF_ISSUE_INDEX: &str = "issue_index";
/// Wallet rows, keyed by issue row id followed by the currency symbol.
pub const CF_WALLETS: &str = "wallets";
/// UNIQUE(seed).
pub const CF_WALLET_SEEDS: &str = "wallet_seeds";
/// UNIQUE(address).
pub const CF_WALLET_ADDRESSES: &str = "wallet_addresses";

const NEXT_ID_KEY: &[u8] = b"next_id";

#[derive(Serialize, Deserialize)]
struct IssueRow {
    id: u64,
    repo: String,
    issue: u64,
}

#[derive(Serialize, Deserialize)]
struct WalletRow {
    id: u64,
    issue_id: u64,
    symbol: String,
    seed: String,
    address: String,
}

/// A persistent ledger backed by RocksDB.
///
/// The relational layout (`issues`, `wallets` and their unique constraints)
/// is spread over column families. Creating an issue checks every unique key
/// while holding the writer lock and commits a single `WriteBatch`, so the
/// issue row and its wallet rows become visible together or not at all.
///
/// `Clone` shares the underlying `Arc<DB>` and writer lock.
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDbLedger {
    /// Opens or creates a ledger at `path`, creating missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [
            CF_ISSUES,
            CF_ISSUE_INDEX,
            CF_WALLETS,
            CF_WALLET_SEEDS,
            CF_WALLET_ADDRESSES,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| BountyError::storage(format!("{name} column family not found")))
    }

    fn lookup_row_id(&self, key: &IssueKey) -> Result<Option<u64>> {
        let cf = self.cf(CF_ISSUE_INDEX)?;
        match self.db.get_pinned_cf(cf, index_key(key))? {
            Some(bytes) => Ok(Some(decode_id(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load_issue(&self, row: IssueRow, privacy: SeedPrivacy) -> Result<Issue> {
        let cf = self.cf(CF_WALLETS)?;
        let prefix = row.id.to_be_bytes();
        let mut wallets = BTreeMap::new();

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let wallet: WalletRow = serde_json::from_slice(&value)?;
            let Some(currency) = Cryptocurrency::from_symbol(&wallet.symbol) else {
                tracing::warn!(symbol = %wallet.symbol, issue_id = row.id, "skipping wallet with unknown symbol");
                continue;
            };
            wallets.insert(
                currency,
                Wallet::new(Seed::new(wallet.seed), wallet.address).with_privacy(privacy),
            );
        }

        Ok(Issue {
            repo: row.repo,
            id: row.issue,
            wallets,
        })
    }

    fn next_id(&self) -> Result<u64> {
        match self.db.get(NEXT_ID_KEY)? {
            Some(bytes) => decode_id(&bytes),
            None => Ok(1),
        }
    }
}

fn index_key(key: &IssueKey) -> Vec<u8> {
    let mut bytes = key.repo.canonical().into_bytes();
    bytes.push(0);
    bytes.extend_from_slice(key.number.to_string().as_bytes());
    bytes
}

fn wallet_key(issue_id: u64, currency: Cryptocurrency) -> Vec<u8> {
    let mut bytes = issue_id.to_be_bytes().to_vec();
    bytes.extend_from_slice(currency.symbol().as_bytes());
    bytes
}

fn decode_id(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| BountyError::storage("malformed row id"))?;
    Ok(u64::from_be_bytes(raw))
}

#[async_trait]
impl Ledger for RocksDbLedger {
    async fn issue_exists(&self, key: &IssueKey) -> Result<bool> {
        Ok(self.lookup_row_id(key)?.is_some())
    }

    async fn create_issue(
        &self,
        key: &IssueKey,
        wallets: BTreeMap<Cryptocurrency, Wallet>,
    ) -> Result<()> {
        let _guard = self.writer.lock().await;

        if self.lookup_row_id(key)?.is_some() {
            return Err(BountyError::Conflict {
                repo: key.repo.canonical(),
                issue: key.number,
            });
        }

        let seeds_cf = self.cf(CF_WALLET_SEEDS)?;
        let addresses_cf = self.cf(CF_WALLET_ADDRESSES)?;
        let mut next_id = self.next_id()?;
        let issue_id = next_id;
        next_id += 1;

        let mut batch = WriteBatch::default();
        let issue_row = IssueRow {
            id: issue_id,
            repo: key.repo.canonical(),
            issue: key.number,
        };
        batch.put_cf(
            self.cf(CF_ISSUES)?,
            issue_id.to_be_bytes(),
            serde_json::to_vec(&issue_row)?,
        );
        batch.put_cf(self.cf(CF_ISSUE_INDEX)?, index_key(key), issue_id.to_be_bytes());

        let mut seen_seeds = Vec::new();
        let mut seen_addresses = Vec::new();
        for (currency, wallet) in wallets {
            let seed = wallet.seed.ok_or_else(|| {
                BountyError::Integrity(format!("{currency} wallet for {key} has no seed"))
            })?;
            let seed = seed.expose().to_string();

            if seen_seeds.contains(&seed) || self.db.get_pinned_cf(seeds_cf, &seed)?.is_some() {
                return Err(BountyError::Integrity(format!(
                    "duplicate {currency} seed for {key}"
                )));
            }
            if seen_addresses.contains(&wallet.address)
                || self.db.get_pinned_cf(addresses_cf, &wallet.address)?.is_some()
            {
                return Err(BountyError::Integrity(format!(
                    "duplicate {currency} address {} for {key}",
                    wallet.address
                )));
            }

            let wallet_id = next_id;
            next_id += 1;
            let row = WalletRow {
                id: wallet_id,
                issue_id,
                symbol: currency.symbol().to_string(),
                seed: seed.clone(),
                address: wallet.address.clone(),
            };
            batch.put_cf(
                self.cf(CF_WALLETS)?,
                wallet_key(issue_id, currency),
                serde_json::to_vec(&row)?,
            );
            batch.put_cf(seeds_cf, &seed, wallet_id.to_be_bytes());
            batch.put_cf(addresses_cf, &wallet.address, wallet_id.to_be_bytes());
            seen_seeds.push(seed);
            seen_addresses.push(wallet.address);
        }

        batch.put(NEXT_ID_KEY, next_id.to_be_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    async fn get_wallets(&self, key: &IssueKey, privacy: SeedPrivacy) -> Result<Issue> {
        let row_id = self
            .lookup_row_id(key)?
            .ok_or_else(|| BountyError::NotFound(format!("issue {key}")))?;

        let bytes = self
            .db
            .get_cf(self.cf(CF_ISSUES)?, row_id.to_be_bytes())?
            .ok_or_else(|| BountyError::storage(format!("dangling index entry for {key}")))?;
        let row: IssueRow = serde_json::from_slice(&bytes)?;
        self.load_issue(row, privacy)
    }

    async fn list_issues(&self, repo: &RepoRef, privacy: SeedPrivacy) -> Result<Vec<Issue>> {
        let canonical = repo.canonical();
        let mut issues = Vec::new();

        for item in self.db.iterator_cf(self.cf(CF_ISSUES)?, IteratorMode::Start) {
            let (_key, value) = item?;
            let row: IssueRow = serde_json::from_slice(&value)?;
            if row.repo == canonical {
                issues.push(self.load_issue(row, privacy)?);
            }
        }

        Ok(issues)
    }
}
