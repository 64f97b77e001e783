use crate::http::ProviderHttp;
use crate::provider::ProviderClient;
use crate::Result;
use async_trait::async_trait;
use config_manager::PeraConfig;
use market_core::{AssetId, PeraAsset, ProviderResult};

/// Verification tier, logo and USD value of an asset
#[derive(Debug, Clone)]
pub struct PeraAssetClient {
    http: ProviderHttp,
}

impl PeraAssetClient {
    pub fn new(config: &PeraConfig) -> Result<Self> {
        Ok(Self {
            http: ProviderHttp::new("pera", &config.api_base_url, config.request_timeout())?,
        })
    }
}

#[async_trait]
impl ProviderClient for PeraAssetClient {
    type Request = AssetId;
    type Payload = PeraAsset;

    fn name(&self) -> &'static str {
        "pera-asset"
    }

    async fn fetch(&self, asset_id: &AssetId) -> ProviderResult<PeraAsset> {
        self.http
            .get_json(&format!("v1/public/assets/{}", asset_id), &[])
            .await
    }
}
