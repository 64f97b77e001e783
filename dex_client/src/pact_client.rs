use crate::http::ProviderHttp;
use crate::provider::ProviderClient;
use crate::Result;
use async_trait::async_trait;
use config_manager::PactConfig;
use market_core::{PactPoolsPage, ProviderResult};

/// Free-text pool search; the term is an asset name or id
#[derive(Debug, Clone)]
pub struct PactPoolsClient {
    http: ProviderHttp,
    limit: u32,
}

impl PactPoolsClient {
    pub fn new(config: &PactConfig) -> Result<Self> {
        Ok(Self {
            http: ProviderHttp::new("pact", &config.api_base_url, config.request_timeout())?,
            limit: config.search_limit,
        })
    }
}

#[async_trait]
impl ProviderClient for PactPoolsClient {
    type Request = String;
    type Payload = PactPoolsPage;

    fn name(&self) -> &'static str {
        "pact-pools"
    }

    async fn fetch(&self, search: &String) -> ProviderResult<PactPoolsPage> {
        self.http
            .get_json(
                "api/internal/pools",
                &[
                    ("limit", self.limit.to_string()),
                    ("offset", "0".to_string()),
                    ("search", search.clone()),
                ],
            )
            .await
    }
}
