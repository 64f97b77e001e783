use crate::http::ProviderHttp;
use crate::provider::ProviderClient;
use crate::Result;
use async_trait::async_trait;
use config_manager::TinymanConfig;
use market_core::{PoolLiquidity, ProviderResult};

/// Current USD liquidity of a single pool, looked up by pool address
#[derive(Debug, Clone)]
pub struct TinymanPoolLiquidityClient {
    http: ProviderHttp,
}

impl TinymanPoolLiquidityClient {
    pub fn new(config: &TinymanConfig) -> Result<Self> {
        Ok(Self {
            http: ProviderHttp::new("tinyman", &config.api_base_url, config.request_timeout())?,
        })
    }
}

#[async_trait]
impl ProviderClient for TinymanPoolLiquidityClient {
    type Request = String;
    type Payload = PoolLiquidity;

    fn name(&self) -> &'static str {
        "tinyman-pool"
    }

    async fn fetch(&self, address: &String) -> ProviderResult<PoolLiquidity> {
        self.http
            .get_json(&format!("api/v1/pools/{}", address), &[])
            .await
    }
}
