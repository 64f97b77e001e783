//! Detail analytics for a single asset: headline metrics, supply breakdown,
//! chart series and the liquidity pools it trades in.

use crate::batch_scheduler::BatchScheduler;
use crate::pipeline::{MarketDataPipeline, PipelineProfile};
use crate::{OrchestratorError, Result};
use chrono::{DateTime, Utc};
use config_manager::SystemConfig;
use dex_client::{
    IndexerClient, PactPoolsClient, PeraAssetClient, PriceSeriesRequest, ProviderClient,
    TinymanPoolLiquidityClient, TvlHistoryRequest, VestigeAssetSearchClient, VestigePoolsClient,
    VestigePriceSeriesClient, VestigeTvlHistoryClient,
};
use market_core::metrics::latest_tvl;
use market_core::{
    AssetCatalog, AssetId, AssetMetricsRecord, AssetStaticInfo, AssetSupplyInfo, PriceInterval,
    PriceSample, ProviderResult, SupplyBreakdown, TvlPoint,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const TVL_HISTORY_WINDOW: PriceInterval = PriceInterval::ThirtyDays;
const POOL_ASSET_BATCH_SIZE: usize = 5;
const POOL_ASSET_BATCH_DELAY: Duration = Duration::from_millis(500);
const PACT_LABEL: &str = "PactFi";

/// Display label of a pool directory venue code
pub fn venue_label(provider: &str) -> String {
    match provider {
        "T2" => "Tinyman V1".to_string(),
        "T3" => "Tinyman V2".to_string(),
        other => format!("Tinyman {}", other),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolAssetLabel {
    pub asset_id: AssetId,
    pub unit_name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityPoolView {
    pub provider: String,
    pub address: Option<String>,
    pub asset_1: PoolAssetLabel,
    pub asset_2: PoolAssetLabel,
    pub tvl_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDetails {
    pub record: AssetMetricsRecord,
    pub supply: Option<AssetSupplyInfo>,
    pub supply_breakdown: SupplyBreakdown,
    pub interval: PriceInterval,
    pub price_history: Vec<PriceSample>,
    pub tvl_history: Vec<TvlPoint>,
    /// Last point of the 30-day TVL series
    pub current_tvl: f64,
    pub pools: Vec<LiquidityPoolView>,
}

/// Pool before its asset labels are resolved
#[derive(Debug, Clone, PartialEq)]
struct PoolRow {
    provider: String,
    address: Option<String>,
    asset_1_id: AssetId,
    asset_2_id: AssetId,
    tvl_usd: f64,
}

#[derive(Debug, Clone)]
pub struct TokenDetailsService {
    pipeline: Arc<MarketDataPipeline>,
    catalog: Arc<AssetCatalog>,
    search: VestigeAssetSearchClient,
    price_history: VestigePriceSeriesClient,
    tvl_history: VestigeTvlHistoryClient,
    pools: VestigePoolsClient,
    tinyman: TinymanPoolLiquidityClient,
    pact: PactPoolsClient,
    indexer: IndexerClient,
    pera: PeraAssetClient,
    label_scheduler: BatchScheduler,
    page_size: usize,
}

impl TokenDetailsService {
    pub fn new(
        pipeline: Arc<MarketDataPipeline>,
        catalog: Arc<AssetCatalog>,
        config: &SystemConfig,
    ) -> Result<Self> {
        Ok(Self {
            pipeline,
            catalog,
            search: VestigeAssetSearchClient::new(&config.vestige)?,
            price_history: VestigePriceSeriesClient::simple(&config.vestige)?,
            tvl_history: VestigeTvlHistoryClient::simple(&config.vestige)?,
            pools: VestigePoolsClient::new(&config.vestige)?,
            tinyman: TinymanPoolLiquidityClient::new(&config.tinyman)?,
            pact: PactPoolsClient::new(&config.pact)?,
            indexer: IndexerClient::new(&config.indexer)?,
            pera: PeraAssetClient::new(&config.pera)?,
            label_scheduler: BatchScheduler::new(POOL_ASSET_BATCH_SIZE, POOL_ASSET_BATCH_DELAY),
            page_size: config.ranking.token_page_size,
        })
    }

    /// Catalog asset by id, or a bare entry for assets outside the catalog
    pub fn static_info(&self, asset_id: AssetId) -> AssetStaticInfo {
        self.catalog
            .get(asset_id)
            .cloned()
            .unwrap_or_else(|| AssetStaticInfo::new(asset_id.to_string(), asset_id))
    }

    pub async fn load(
        &self,
        asset_id: AssetId,
        interval: PriceInterval,
        now: DateTime<Utc>,
    ) -> Result<TokenDetails> {
        info!("🔍 Loading details for asset {} ({})", asset_id, interval);

        let static_info = self.static_info(asset_id);
        let profile = PipelineProfile::token_ranking(self.page_size);
        let end = now.timestamp();

        let price_request = PriceSeriesRequest {
            asset_id,
            interval,
            end,
        };
        let tvl_request = TvlHistoryRequest {
            asset_id,
            window: TVL_HISTORY_WINDOW,
            end,
        };

        let (records, supply, prices, tvl, pools) = tokio::join!(
            self.pipeline.aggregate(
                std::slice::from_ref(&static_info),
                &self.catalog,
                &profile,
                interval,
                now
            ),
            self.search.fetch(&asset_id),
            self.price_history.fetch(&price_request),
            self.tvl_history.fetch(&tvl_request),
            self.liquidity_pools(asset_id),
        );

        let record = records?
            .pop()
            .ok_or_else(|| OrchestratorError::Pipeline(format!("no record for {}", asset_id)))?;

        let supply = log_failure("asset search", asset_id, supply);
        let supply_breakdown = supply
            .as_ref()
            .map(SupplyBreakdown::from_supply_info)
            .unwrap_or_default();
        let price_history = log_failure("price history", asset_id, prices).unwrap_or_default();
        let tvl_history = log_failure("tvl history", asset_id, tvl).unwrap_or_default();

        Ok(TokenDetails {
            record,
            supply,
            supply_breakdown,
            interval,
            price_history,
            current_tvl: latest_tvl(&tvl_history),
            tvl_history,
            pools,
        })
    }

    /// Trusted directory pools and Pact pools holding `asset_id`, labelled
    /// and without empty pools
    pub async fn liquidity_pools(&self, asset_id: AssetId) -> Vec<LiquidityPoolView> {
        let search = asset_id.to_string();
        let (directory, pact) = tokio::join!(self.pools.fetch(&asset_id), self.pact.fetch(&search));

        let trusted = self.pipeline.trusted_pool_providers();
        let directory_pools: Vec<_> = log_failure("pool directory", asset_id, directory)
            .unwrap_or_default()
            .into_iter()
            .filter(|pool| trusted.iter().any(|p| p == &pool.provider))
            .filter(|pool| pool.address.as_deref().map_or(false, |a| !a.is_empty()))
            .collect();

        let addresses: Vec<String> = directory_pools
            .iter()
            .filter_map(|pool| pool.address.clone())
            .collect();
        let liquidity = self
            .pipeline
            .scheduler()
            .fetch_all(&self.tinyman, &addresses)
            .await;

        let mut rows: Vec<PoolRow> = directory_pools
            .iter()
            .zip(liquidity)
            .map(|(pool, usd)| PoolRow {
                provider: venue_label(&pool.provider),
                address: pool.address.clone(),
                asset_1_id: pool.asset_1_id,
                asset_2_id: pool.asset_2_id,
                tvl_usd: usd.ok().map(|l| l.liquidity_in_usd).unwrap_or(0.0),
            })
            .collect();

        if let Some(page) = log_failure("pact pools", asset_id, pact) {
            rows.extend(page.results.iter().filter_map(|pool| {
                let (a, b) = pool.pair()?;
                if a != asset_id && b != asset_id {
                    return None;
                }
                Some(PoolRow {
                    provider: PACT_LABEL.to_string(),
                    address: pool.address.clone(),
                    asset_1_id: a,
                    asset_2_id: b,
                    tvl_usd: pool.tvl_usd,
                })
            }));
        }

        rows.retain(|row| row.tvl_usd > 0.0);
        debug!("{} pools with liquidity for {}", rows.len(), asset_id);

        let labels = self.pool_asset_labels(&rows).await;
        rows.into_iter()
            .map(|row| LiquidityPoolView {
                asset_1: label_for(&labels, row.asset_1_id),
                asset_2: label_for(&labels, row.asset_2_id),
                provider: row.provider,
                address: row.address,
                tvl_usd: row.tvl_usd,
            })
            .collect()
    }

    /// Unit names from the indexer and logos from Pera for every pool asset,
    /// looked up in small paced batches
    async fn pool_asset_labels(&self, rows: &[PoolRow]) -> HashMap<AssetId, PoolAssetLabel> {
        let ids: Vec<AssetId> = rows
            .iter()
            .flat_map(|row| [row.asset_1_id, row.asset_2_id])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let labels = self
            .label_scheduler
            .run(&ids, |asset_id| async move {
                let (asset, pera) =
                    tokio::join!(self.indexer.fetch(asset_id), self.pera.fetch(asset_id));

                let unit_name = if *asset_id == AssetId::ALGO {
                    Some("ALGO".to_string())
                } else {
                    asset.ok().and_then(|a| a.params.unit_name)
                };

                PoolAssetLabel {
                    asset_id: *asset_id,
                    unit_name: unit_name.unwrap_or_else(|| asset_id.to_string()),
                    logo_url: pera.ok().and_then(|p| p.logo_url().map(str::to_string)),
                }
            })
            .await;

        labels.into_iter().map(|label| (label.asset_id, label)).collect()
    }
}

fn label_for(labels: &HashMap<AssetId, PoolAssetLabel>, asset_id: AssetId) -> PoolAssetLabel {
    labels.get(&asset_id).cloned().unwrap_or_else(|| PoolAssetLabel {
        asset_id,
        unit_name: asset_id.to_string(),
        logo_url: None,
    })
}

fn log_failure<T>(what: &str, asset_id: AssetId, result: ProviderResult<T>) -> Option<T> {
    match result {
        ProviderResult::Ok(value) => Some(value),
        ProviderResult::Failed(reason) => {
            warn!("{} unavailable for {}: {}", what, asset_id, reason);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_labels() {
        assert_eq!(venue_label("T2"), "Tinyman V1");
        assert_eq!(venue_label("T3"), "Tinyman V2");
        assert_eq!(venue_label("TM"), "Tinyman TM");
    }

    #[test]
    fn test_missing_label_falls_back_to_id() {
        let label = label_for(&HashMap::new(), AssetId(77));
        assert_eq!(label.unit_name, "77");
        assert!(label.logo_url.is_none());
    }
}
