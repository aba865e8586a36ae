//! JSON-RPC client for the external wallet daemon that owns key generation,
//! address validation and transaction signing.

use crate::domain::currency::Cryptocurrency;
use crate::domain::issue::{Seed, Wallet};
use crate::domain::ports::{TxId, WalletLibrary};
use crate::error::{BountyError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct WalletRpcClient {
    http: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct GeneratedWallet {
    seed: String,
    address: String,
}

#[derive(Deserialize)]
struct Validation {
    valid: bool,
}

#[derive(Deserialize)]
struct Sent {
    txid: String,
}

impl WalletRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BountyError::Wallet(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({ "method": method, "params": params }))
            .send()
            .await
            .map_err(|e| BountyError::Wallet(format!("{method} request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BountyError::Wallet(format!(
                "{method} returned HTTP {}",
                response.status()
            )));
        }

        let envelope: RpcEnvelope<T> = response
            .json()
            .await
            .map_err(|e| BountyError::Wallet(format!("invalid {method} response: {e}")))?;

        if let Some(err) = envelope.error {
            return Err(BountyError::Wallet(format!("{method}: {err}")));
        }
        envelope
            .result
            .ok_or_else(|| BountyError::Wallet(format!("{method}: missing result")))
    }
}

#[async_trait]
impl WalletLibrary for WalletRpcClient {
    async fn generate_wallet(&self, currency: Cryptocurrency) -> Result<Wallet> {
        let generated: GeneratedWallet = self
            .call("generate_wallet", json!({ "currency": currency.symbol() }))
            .await?;
        Ok(Wallet::new(Seed::new(generated.seed), generated.address))
    }

    async fn validate(&self, currency: Cryptocurrency, address: &str) -> Result<bool> {
        let validation: Validation = self
            .call(
                "validate",
                json!({ "currency": currency.symbol(), "address": address }),
            )
            .await?;
        Ok(validation.valid)
    }

    async fn send_all(
        &self,
        currency: Cryptocurrency,
        seed: &Seed,
        destination: &str,
    ) -> Result<TxId> {
        let sent: Sent = self
            .call(
                "send_all",
                json!({
                    "currency": currency.symbol(),
                    "seed": seed.expose(),
                    "destination": destination,
                }),
            )
            .await?;
        Ok(sent.txid)
    }
}
