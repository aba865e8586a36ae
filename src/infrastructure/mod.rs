//! Adapters implementing the domain ports.

pub mod donate_client;
pub mod github;
pub mod in_memory;
pub mod market;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod wallet_rpc;
