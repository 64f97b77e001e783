//! Vestige market data: pool directory, spot prices, candles, TVL history,
//! holder lists and asset search.

use crate::http::ProviderHttp;
use crate::provider::ProviderClient;
use crate::Result;
use async_trait::async_trait;
use config_manager::VestigeConfig;
use market_core::{
    AssetId, AssetSupplyInfo, HolderCount, PoolInfo, PriceInterval, PriceSample,
    ProviderFailure, ProviderResult, SpotPrice, TvlPoint,
};

const HOLDERS_LIMIT: &str = "10000000";
const DAY_SECONDS: i64 = 24 * 60 * 60;

/// Which Vestige host serves a time series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSource {
    /// Main API with explicit interval and `[start, end]` range
    Analytics,
    /// Free API, pre-bucketed by interval label
    Simple,
}

fn analytics_http(config: &VestigeConfig) -> Result<ProviderHttp> {
    ProviderHttp::new("vestige", &config.api_base_url, config.request_timeout())
}

fn free_api_http(config: &VestigeConfig) -> Result<ProviderHttp> {
    ProviderHttp::new("vestige-free", &config.free_api_base_url, config.request_timeout())
}

/// Pools an asset participates in (`asset_1_id` side of the directory)
#[derive(Debug, Clone)]
pub struct VestigePoolsClient {
    http: ProviderHttp,
    network_id: u32,
    limit: u32,
}

impl VestigePoolsClient {
    pub fn new(config: &VestigeConfig) -> Result<Self> {
        Ok(Self {
            http: analytics_http(config)?,
            network_id: config.network_id,
            limit: config.pools_limit,
        })
    }
}

#[async_trait]
impl ProviderClient for VestigePoolsClient {
    type Request = AssetId;
    type Payload = Vec<PoolInfo>;

    fn name(&self) -> &'static str {
        "vestige-pools"
    }

    async fn fetch(&self, asset_id: &AssetId) -> ProviderResult<Vec<PoolInfo>> {
        self.http
            .get_json(
                "pools",
                &[
                    ("network_id", self.network_id.to_string()),
                    ("asset_1_id", asset_id.to_string()),
                    ("limit", self.limit.to_string()),
                    ("offset", "0".to_string()),
                    ("order_dir", "desc".to_string()),
                ],
            )
            .await
    }
}

/// Latest USD price, denominated in the configured stable asset
#[derive(Debug, Clone)]
pub struct VestigeSpotPriceClient {
    http: ProviderHttp,
    network_id: u32,
    denominating_asset_id: u64,
}

impl VestigeSpotPriceClient {
    pub fn new(config: &VestigeConfig) -> Result<Self> {
        Ok(Self {
            http: analytics_http(config)?,
            network_id: config.network_id,
            denominating_asset_id: config.denominating_asset_id,
        })
    }
}

#[async_trait]
impl ProviderClient for VestigeSpotPriceClient {
    type Request = AssetId;
    type Payload = Vec<SpotPrice>;

    fn name(&self) -> &'static str {
        "vestige-price"
    }

    async fn fetch(&self, asset_id: &AssetId) -> ProviderResult<Vec<SpotPrice>> {
        self.http
            .get_json(
                "assets/price",
                &[
                    ("asset_ids", asset_id.to_string()),
                    ("network_id", self.network_id.to_string()),
                    ("denominating_asset_id", self.denominating_asset_id.to_string()),
                ],
            )
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSeriesRequest {
    pub asset_id: AssetId,
    pub interval: PriceInterval,
    /// Unix seconds the lookback window ends at
    pub end: i64,
}

#[derive(Debug, Clone)]
pub struct VestigePriceSeriesClient {
    http: ProviderHttp,
    source: SeriesSource,
    network_id: u32,
    denominating_asset_id: u64,
}

impl VestigePriceSeriesClient {
    /// Candles over the interval's lookback, used for ranking price changes
    pub fn candles(config: &VestigeConfig) -> Result<Self> {
        Ok(Self {
            http: analytics_http(config)?,
            source: SeriesSource::Analytics,
            network_id: config.network_id,
            denominating_asset_id: config.denominating_asset_id,
        })
    }

    /// Pre-bucketed price history, used for detail charts and the movers view
    pub fn simple(config: &VestigeConfig) -> Result<Self> {
        Ok(Self {
            http: free_api_http(config)?,
            source: SeriesSource::Simple,
            network_id: config.network_id,
            denominating_asset_id: config.denominating_asset_id,
        })
    }
}

#[async_trait]
impl ProviderClient for VestigePriceSeriesClient {
    type Request = PriceSeriesRequest;
    type Payload = Vec<PriceSample>;

    fn name(&self) -> &'static str {
        "vestige-price-series"
    }

    async fn fetch(&self, request: &PriceSeriesRequest) -> ProviderResult<Vec<PriceSample>> {
        match self.source {
            SeriesSource::Analytics => {
                let start = request.end - request.interval.lookback_seconds();
                self.http
                    .get_json(
                        &format!("assets/{}/candles", request.asset_id),
                        &[
                            ("network_id", self.network_id.to_string()),
                            ("denominating_asset_id", self.denominating_asset_id.to_string()),
                            ("interval", request.interval.candle_interval_seconds().to_string()),
                            ("start", start.to_string()),
                            ("end", request.end.to_string()),
                        ],
                    )
                    .await
            }
            SeriesSource::Simple => {
                self.http
                    .get_json(
                        &format!("asset/{}/prices/simple/{}", request.asset_id, request.interval),
                        &[],
                    )
                    .await
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TvlHistoryRequest {
    pub asset_id: AssetId,
    pub window: PriceInterval,
    pub end: i64,
}

/// Full TVL series; the last point is the asset's current full TVL
#[derive(Debug, Clone)]
pub struct VestigeTvlHistoryClient {
    http: ProviderHttp,
    source: SeriesSource,
    network_id: u32,
    denominating_asset_id: u64,
}

impl VestigeTvlHistoryClient {
    /// Daily points over the window from the main API
    pub fn history(config: &VestigeConfig) -> Result<Self> {
        Ok(Self {
            http: analytics_http(config)?,
            source: SeriesSource::Analytics,
            network_id: config.network_id,
            denominating_asset_id: config.denominating_asset_id,
        })
    }

    /// USD series from the free API, used for the detail chart
    pub fn simple(config: &VestigeConfig) -> Result<Self> {
        Ok(Self {
            http: free_api_http(config)?,
            source: SeriesSource::Simple,
            network_id: config.network_id,
            denominating_asset_id: config.denominating_asset_id,
        })
    }
}

#[async_trait]
impl ProviderClient for VestigeTvlHistoryClient {
    type Request = TvlHistoryRequest;
    type Payload = Vec<TvlPoint>;

    fn name(&self) -> &'static str {
        "vestige-tvl"
    }

    async fn fetch(&self, request: &TvlHistoryRequest) -> ProviderResult<Vec<TvlPoint>> {
        match self.source {
            SeriesSource::Analytics => {
                let start = request.end - request.window.lookback_seconds();
                self.http
                    .get_json(
                        &format!("assets/{}/history", request.asset_id),
                        &[
                            ("network_id", self.network_id.to_string()),
                            ("denominating_asset_id", self.denominating_asset_id.to_string()),
                            ("interval", DAY_SECONDS.to_string()),
                            ("start", start.to_string()),
                            ("end", request.end.to_string()),
                        ],
                    )
                    .await
            }
            SeriesSource::Simple => {
                self.http
                    .get_json(
                        &format!("asset/{}/tvl/simple/{}", request.asset_id, request.window),
                        &[("currency", "usd".to_string())],
                    )
                    .await
            }
        }
    }
}

/// Holder count, taken as the length of the holder list
#[derive(Debug, Clone)]
pub struct VestigeHoldersClient {
    http: ProviderHttp,
}

impl VestigeHoldersClient {
    pub fn new(config: &VestigeConfig) -> Result<Self> {
        Ok(Self {
            http: free_api_http(config)?,
        })
    }
}

#[async_trait]
impl ProviderClient for VestigeHoldersClient {
    type Request = AssetId;
    type Payload = HolderCount;

    fn name(&self) -> &'static str {
        "vestige-holders"
    }

    async fn fetch(&self, asset_id: &AssetId) -> ProviderResult<HolderCount> {
        self.http
            .get_json(
                &format!("asset/{}/holders", asset_id),
                &[("limit", HOLDERS_LIMIT.to_string())],
            )
            .await
    }
}

/// Supply, creator and flag details of a single asset
#[derive(Debug, Clone)]
pub struct VestigeAssetSearchClient {
    http: ProviderHttp,
}

impl VestigeAssetSearchClient {
    pub fn new(config: &VestigeConfig) -> Result<Self> {
        Ok(Self {
            http: free_api_http(config)?,
        })
    }
}

#[async_trait]
impl ProviderClient for VestigeAssetSearchClient {
    type Request = AssetId;
    type Payload = AssetSupplyInfo;

    fn name(&self) -> &'static str {
        "vestige-search"
    }

    async fn fetch(&self, asset_id: &AssetId) -> ProviderResult<AssetSupplyInfo> {
        let results: ProviderResult<Vec<AssetSupplyInfo>> = self
            .http
            .get_json(
                "assets/search",
                &[
                    ("query", asset_id.to_string()),
                    ("page", "0".to_string()),
                    ("page_size", "1".to_string()),
                ],
            )
            .await;

        match results {
            ProviderResult::Ok(mut matches) if !matches.is_empty() => {
                ProviderResult::Ok(matches.swap_remove(0))
            }
            ProviderResult::Ok(_) => ProviderResult::Failed(ProviderFailure::NoData),
            ProviderResult::Failed(reason) => ProviderResult::Failed(reason),
        }
    }
}
