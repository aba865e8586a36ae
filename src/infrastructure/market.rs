use crate::domain::currency::Cryptocurrency;
use crate::domain::ports::MarketData;
use crate::error::{BountyError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const BLOCKCYPHER_URL: &str = "https://api.blockcypher.com/v1";
pub const COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Balance lookups via BlockCypher and USD rates via CoinGecko.
#[derive(Clone)]
pub struct HttpMarketData {
    http: reqwest::Client,
    balance_url: String,
    rate_url: String,
}

#[derive(Deserialize)]
struct BalanceResponse {
    #[serde(default)]
    error: Option<String>,
    /// Balance in base units (satoshi, wei).
    #[serde(default)]
    balance: u128,
}

#[derive(Deserialize)]
struct UsdQuote {
    usd: Decimal,
}

impl HttpMarketData {
    pub fn new() -> Result<Self> {
        Self::with_endpoints(BLOCKCYPHER_URL, COINGECKO_URL)
    }

    pub fn with_endpoints(balance_url: &str, rate_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| BountyError::Market(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            balance_url: balance_url.trim_end_matches('/').to_string(),
            rate_url: rate_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BountyError::Market(format!("request to {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(BountyError::Market(format!(
                "{url} returned HTTP {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| BountyError::Market(format!("invalid JSON from {url}: {e}")))
    }
}

/// Converts an integer amount of base units into whole coins.
pub fn units_to_coins(units: u128, currency: Cryptocurrency) -> Result<Decimal> {
    let units = i128::try_from(units)
        .map_err(|_| BountyError::Market(format!("{currency} balance out of range")))?;
    Decimal::try_from_i128_with_scale(units, currency.info().decimals)
        .map(|d| d.normalize())
        .map_err(|e| BountyError::Market(format!("{currency} balance out of range: {e}")))
}

#[async_trait]
impl MarketData for HttpMarketData {
    async fn balance(&self, currency: Cryptocurrency, address: &str) -> Result<Decimal> {
        let url = format!(
            "{}/{}/main/addrs/{}/balance",
            self.balance_url,
            currency.symbol(),
            address
        );
        let response: BalanceResponse = self.get(&url).await?;
        if let Some(err) = response.error {
            return Err(BountyError::Market(err));
        }
        units_to_coins(response.balance, currency)
    }

    async fn usd_rate(&self, currency: Cryptocurrency) -> Result<Decimal> {
        let id = currency.info().rate_id;
        let url = format!("{}/simple/price?ids={id}&vs_currencies=usd", self.rate_url);
        let mut quotes: HashMap<String, UsdQuote> = self.get(&url).await?;
        quotes
            .remove(id)
            .map(|q| q.usd)
            .ok_or_else(|| BountyError::Market(format!("no USD rate for {currency}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_units_to_coins() {
        assert_eq!(
            units_to_coins(150_000_000, Cryptocurrency::Bitcoin).unwrap(),
            dec!(1.5)
        );
        assert_eq!(
            units_to_coins(2_000_000_000_000_000_000, Cryptocurrency::Ethereum).unwrap(),
            dec!(2)
        );
        assert_eq!(units_to_coins(0, Cryptocurrency::Bitcoin).unwrap(), dec!(0));
    }

    #[test]
    fn test_quote_deserialization() {
        let quotes: HashMap<String, UsdQuote> =
            serde_json::from_str(r#"{"bitcoin": {"usd": 9123.5}}"#).unwrap();
        assert_eq!(quotes["bitcoin"].usd, dec!(9123.5));
    }

    #[test]
    fn test_balance_error_field() {
        let response: BalanceResponse =
            serde_json::from_str(r#"{"error": "address not found"}"#).unwrap();
        assert_eq!(response.error.as_deref(), Some("address not found"));
        assert_eq!(response.balance, 0);
    }
}
