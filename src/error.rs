use crate::domain::currency::Cryptocurrency;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BountyError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("issue {repo}#{issue} is already registered")]
    Conflict { repo: String, issue: u64 },

    #[error("ledger integrity violation: {0}")]
    Integrity(String),

    #[error("issue is still open")]
    StillOpen,

    #[error("issue is not open")]
    NotOpen,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("tracker error: {0}")]
    Tracker(String),

    #[error("wallet library error: {0}")]
    Wallet(String),

    #[error("market data error: {0}")]
    Market(String),

    #[error("invalid {currency} address: {address}")]
    InvalidAddress {
        currency: Cryptocurrency,
        address: String,
    },

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BountyError {
    /// Seed/address collisions and duplicate rows point at an upstream bug
    /// and are reported at error level wherever they surface.
    pub fn is_fatal_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_) | Self::Conflict { .. })
    }

    #[cfg(feature = "storage-rocksdb")]
    pub(crate) fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(Box::new(std::io::Error::other(msg.into())))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for BountyError {
    fn from(e: rocksdb::Error) -> Self {
        Self::Storage(Box::new(e))
    }
}

impl From<serde_json::Error> for BountyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, BountyError>;
