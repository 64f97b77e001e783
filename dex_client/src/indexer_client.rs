//! Read-only Algorand indexer lookups: account balances, account holdings and
//! asset parameters.

use crate::http::ProviderHttp;
use crate::provider::ProviderClient;
use crate::{DexClientError, Result};
use async_trait::async_trait;
use config_manager::IndexerConfig;
use market_core::{AssetId, IndexerAsset, ProviderResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const ADDRESS_LENGTH: usize = 58;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAssetHolding {
    #[serde(rename = "asset-id")]
    pub asset_id: AssetId,
    #[serde(default)]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInformation {
    #[serde(default)]
    pub address: Option<String>,
    /// Balance in microAlgos
    #[serde(default)]
    pub amount: u64,
    #[serde(default)]
    pub assets: Vec<AccountAssetHolding>,
}

impl AccountInformation {
    pub fn holding(&self, asset_id: AssetId) -> Option<&AccountAssetHolding> {
        self.assets.iter().find(|h| h.asset_id == asset_id)
    }

    pub fn asset_amount(&self, asset_id: AssetId) -> u64 {
        self.holding(asset_id).map(|h| h.amount).unwrap_or(0)
    }
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account: AccountInformation,
}

#[derive(Debug, Deserialize)]
struct AccountAssetsResponse {
    #[serde(default)]
    assets: Vec<AccountAssetHolding>,
    #[serde(default, rename = "next-token")]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    asset: IndexerAsset,
}

/// Upper-case base32 of the expected length
pub fn validate_address(address: &str) -> Result<()> {
    let valid = address.len() == ADDRESS_LENGTH
        && address
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c));

    if valid {
        Ok(())
    } else {
        Err(DexClientError::InvalidAddress(address.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: ProviderHttp,
    assets_limit: u32,
}

impl IndexerClient {
    pub fn new(config: &IndexerConfig) -> Result<Self> {
        Ok(Self {
            http: ProviderHttp::new("indexer", &config.api_base_url, config.request_timeout())?,
            assets_limit: config.assets_limit,
        })
    }

    /// ALGO balance and asset holdings of an account
    pub async fn account_information(&self, address: &str) -> Result<AccountInformation> {
        validate_address(address)?;
        debug!("Fetching account information for {}", address);

        let response: AccountResponse = self
            .http
            .get_json(&format!("v2/accounts/{}", address), &[])
            .await
            .into_result()
            .map_err(|failure| DexClientError::Provider {
                provider: self.http.provider(),
                failure,
            })?;

        Ok(response.account)
    }

    /// Every asset holding of an account, following `next-token` pagination
    pub async fn account_assets(&self, address: &str) -> Result<Vec<AccountAssetHolding>> {
        validate_address(address)?;

        let mut holdings = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut query = vec![("limit", self.assets_limit.to_string())];
            if let Some(token) = &next_token {
                query.push(("next", token.clone()));
            }

            let page: AccountAssetsResponse = self
                .http
                .get_json(&format!("v2/accounts/{}/assets", address), &query)
                .await
                .into_result()
                .map_err(|failure| DexClientError::Provider {
                    provider: self.http.provider(),
                    failure,
                })?;

            let page_len = page.assets.len();
            holdings.extend(page.assets);

            match page.next_token {
                Some(token) if page_len > 0 && !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        info!("Account {} holds {} assets", address, holdings.len());
        Ok(holdings)
    }
}

#[async_trait]
impl ProviderClient for IndexerClient {
    type Request = AssetId;
    type Payload = IndexerAsset;

    fn name(&self) -> &'static str {
        "indexer-asset"
    }

    async fn fetch(&self, asset_id: &AssetId) -> ProviderResult<IndexerAsset> {
        self.http
            .get_json::<AssetResponse>(&format!("v2/assets/{}", asset_id), &[])
            .await
            .map(|response| response.asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        let valid = "A".repeat(56) + "27";
        assert!(validate_address(&valid).is_ok());
        assert!(validate_address("not-an-address").is_err());
        assert!(validate_address(&"a".repeat(58)).is_err());
    }

    #[test]
    fn test_account_response_shape() {
        let json = r#"{"account": {"address": "X", "amount": 2500000, "assets": [
            {"asset-id": 31566704, "amount": 1000000, "is-frozen": false}
        ]}}"#;
        let response: AccountResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.account.amount, 2_500_000);
        assert_eq!(response.account.asset_amount(AssetId(31566704)), 1_000_000);
        assert_eq!(response.account.asset_amount(AssetId(1)), 0);
    }
}
