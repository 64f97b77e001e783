use crate::batch_scheduler::BatchScheduler;
use crate::{OrchestratorError, Result};
use chrono::{DateTime, Utc};
use config_manager::SystemConfig;
use dex_client::{
    PactPoolsClient, PeraAssetClient, PriceSeriesRequest, SeriesSource,
    TinymanPoolLiquidityClient, TvlHistoryRequest, VestigeHoldersClient, VestigePoolsClient,
    VestigePriceSeriesClient, VestigeSpotPriceClient, VestigeTvlHistoryClient,
};
use market_core::tvl::{select_anchor_pools, select_catalog_pact_pools};
use market_core::{
    combine, AssetCatalog, AssetId, AssetMetricsRecord, AssetStaticInfo, PoolInfo,
    PoolObservation, PriceInterval, ProviderResult, ProviderResults, ProviderStream, SortField,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Window of the TVL history whose last point is the full TVL
const FULL_TVL_WINDOW: PriceInterval = PriceInterval::SevenDays;

/// Which provider streams a view needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSet {
    pub trusted_tvl: bool,
    pub full_tvl: bool,
    pub spot_price: bool,
    pub price_change: bool,
    pub holders: bool,
    pub verification: bool,
}

impl ProviderSet {
    pub fn all() -> Self {
        Self {
            trusted_tvl: true,
            full_tvl: true,
            spot_price: true,
            price_change: true,
            holders: true,
            verification: true,
        }
    }

    pub fn none() -> Self {
        Self {
            trusted_tvl: false,
            full_tvl: false,
            spot_price: false,
            price_change: false,
            holders: false,
            verification: false,
        }
    }
}

/// One view's configuration of the shared pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineProfile {
    pub name: &'static str,
    pub providers: ProviderSet,
    pub page_size: usize,
    pub default_sort: SortField,
    pub price_series: SeriesSource,
}

impl PipelineProfile {
    /// Ranked token table
    pub fn token_ranking(page_size: usize) -> Self {
        Self {
            name: "token-ranking",
            providers: ProviderSet {
                verification: false,
                ..ProviderSet::all()
            },
            page_size,
            default_sort: SortField::TrustedTvl,
            price_series: SeriesSource::Analytics,
        }
    }

    /// Top movers bubble view
    pub fn token_bubbles(limit: usize) -> Self {
        Self {
            name: "token-bubbles",
            providers: ProviderSet {
                spot_price: true,
                price_change: true,
                full_tvl: true,
                holders: true,
                ..ProviderSet::none()
            },
            page_size: limit,
            default_sort: SortField::PriceChange,
            price_series: SeriesSource::Simple,
        }
    }

    /// Held assets of a connected wallet
    pub fn wallet_holdings(page_size: usize) -> Self {
        Self {
            name: "wallet-holdings",
            providers: ProviderSet {
                spot_price: true,
                verification: true,
                ..ProviderSet::none()
            },
            page_size,
            default_sort: SortField::UsdValue,
            price_series: SeriesSource::Analytics,
        }
    }
}

/// Every provider client the pipeline can fan out to
#[derive(Debug, Clone)]
pub struct PipelineClients {
    pub pools: VestigePoolsClient,
    pub tinyman: TinymanPoolLiquidityClient,
    pub pact: PactPoolsClient,
    pub spot_prices: VestigeSpotPriceClient,
    pub candles: VestigePriceSeriesClient,
    pub simple_prices: VestigePriceSeriesClient,
    pub tvl_history: VestigeTvlHistoryClient,
    pub holders: VestigeHoldersClient,
    pub pera: PeraAssetClient,
}

impl PipelineClients {
    pub fn from_config(config: &SystemConfig) -> Result<Self> {
        Ok(Self {
            pools: VestigePoolsClient::new(&config.vestige)?,
            tinyman: TinymanPoolLiquidityClient::new(&config.tinyman)?,
            pact: PactPoolsClient::new(&config.pact)?,
            spot_prices: VestigeSpotPriceClient::new(&config.vestige)?,
            candles: VestigePriceSeriesClient::candles(&config.vestige)?,
            simple_prices: VestigePriceSeriesClient::simple(&config.vestige)?,
            tvl_history: VestigeTvlHistoryClient::history(&config.vestige)?,
            holders: VestigeHoldersClient::new(&config.vestige)?,
            pera: PeraAssetClient::new(&config.pera)?,
        })
    }
}

/// Fans out to the enabled providers in batches and combines the partial
/// results into one record per asset
#[derive(Debug, Clone)]
pub struct MarketDataPipeline {
    clients: PipelineClients,
    scheduler: BatchScheduler,
    trusted_pool_providers: Vec<String>,
}

impl MarketDataPipeline {
    pub fn new(
        clients: PipelineClients,
        scheduler: BatchScheduler,
        trusted_pool_providers: Vec<String>,
    ) -> Self {
        Self {
            clients,
            scheduler,
            trusted_pool_providers,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Result<Self> {
        Ok(Self::new(
            PipelineClients::from_config(config)?,
            BatchScheduler::from_config(&config.scheduler),
            config.ranking.trusted_pool_providers.clone(),
        ))
    }

    pub fn scheduler(&self) -> &BatchScheduler {
        &self.scheduler
    }

    pub fn trusted_pool_providers(&self) -> &[String] {
        &self.trusted_pool_providers
    }

    /// One record per input asset, in input order.
    ///
    /// Individual provider failures only zero the affected fields; duplicate
    /// asset ids fail the whole cycle.
    pub async fn aggregate(
        &self,
        assets: &[AssetStaticInfo],
        catalog: &AssetCatalog,
        profile: &PipelineProfile,
        interval: PriceInterval,
        now: DateTime<Utc>,
    ) -> Result<Vec<AssetMetricsRecord>> {
        let ids = unique_ids(assets)?;
        let providers = profile.providers;
        let end = now.timestamp();

        info!(
            "🚀 Aggregating {} assets for {} ({})",
            assets.len(),
            profile.name,
            interval
        );

        let series_client = match profile.price_series {
            SeriesSource::Analytics => &self.clients.candles,
            SeriesSource::Simple => &self.clients.simple_prices,
        };
        let series_requests: Vec<PriceSeriesRequest> = ids
            .iter()
            .map(|&asset_id| PriceSeriesRequest {
                asset_id,
                interval,
                end,
            })
            .collect();
        let tvl_requests: Vec<TvlHistoryRequest> = ids
            .iter()
            .map(|&asset_id| TvlHistoryRequest {
                asset_id,
                window: FULL_TVL_WINDOW,
                end,
            })
            .collect();

        let (pools, spot_prices, price_series, tvl_history, holders, verification) = tokio::join!(
            async {
                if providers.trusted_tvl {
                    Some(self.trusted_pool_observations(assets, &ids, catalog).await)
                } else {
                    None
                }
            },
            async {
                if providers.spot_price {
                    Some(self.scheduler.fetch_all(&self.clients.spot_prices, &ids).await)
                } else {
                    None
                }
            },
            async {
                if providers.price_change {
                    Some(self.scheduler.fetch_all(series_client, &series_requests).await)
                } else {
                    None
                }
            },
            async {
                if providers.full_tvl {
                    Some(self.scheduler.fetch_all(&self.clients.tvl_history, &tvl_requests).await)
                } else {
                    None
                }
            },
            async {
                if providers.holders {
                    Some(self.scheduler.fetch_all(&self.clients.holders, &ids).await)
                } else {
                    None
                }
            },
            async {
                if providers.verification {
                    Some(self.scheduler.fetch_all(&self.clients.pera, &ids).await)
                } else {
                    None
                }
            },
        );

        let (dex_pools, pact_pools) = match pools {
            Some((dex, pact)) => (Some(dex), Some(pact)),
            None => (None, None),
        };

        let results = ProviderResults {
            dex_pools: stream_or_empty(&ids, dex_pools),
            pact_pools: stream_or_empty(&ids, pact_pools),
            spot_prices: stream_or_empty(&ids, spot_prices),
            price_series: stream_or_empty(&ids, price_series),
            tvl_history: stream_or_empty(&ids, tvl_history),
            holders: stream_or_empty(&ids, holders),
            verification: stream_or_empty(&ids, verification),
        };

        let failed = results.dex_pools.failed_count()
            + results.pact_pools.failed_count()
            + results.spot_prices.failed_count()
            + results.price_series.failed_count()
            + results.tvl_history.failed_count()
            + results.holders.failed_count()
            + results.verification.failed_count();
        if failed > 0 {
            warn!("{} provider calls failed for {}", failed, profile.name);
        }

        let records = combine(assets, &results);
        info!("✅ {} produced {} records", profile.name, records.len());
        Ok(records)
    }

    /// Per-asset trusted pools from the directory and from the Pact search.
    ///
    /// Directory pools are kept when they sit on a trusted venue against a
    /// stable anchor; their liquidity is looked up once per distinct address.
    async fn trusted_pool_observations(
        &self,
        assets: &[AssetStaticInfo],
        ids: &[AssetId],
        catalog: &AssetCatalog,
    ) -> (
        Vec<ProviderResult<Vec<PoolObservation>>>,
        Vec<ProviderResult<Vec<PoolObservation>>>,
    ) {
        let anchors = catalog.stable_anchor_ids();
        let catalog_ids: HashSet<AssetId> = catalog.asset_ids().into_iter().collect();
        let search_terms: Vec<String> = assets.iter().map(|a| a.name.clone()).collect();

        let (directory, pact_pages) = tokio::join!(
            self.scheduler.fetch_all(&self.clients.pools, ids),
            self.scheduler.fetch_all(&self.clients.pact, &search_terms),
        );

        let selected: Vec<ProviderResult<Vec<PoolInfo>>> = ids
            .iter()
            .zip(directory)
            .map(|(&asset_id, result)| {
                result.map(|pools| {
                    select_anchor_pools(asset_id, &pools, &anchors, &self.trusted_pool_providers)
                        .into_iter()
                        .cloned()
                        .collect()
                })
            })
            .collect();

        let mut addresses: Vec<String> = Vec::new();
        for pool in selected.iter().filter_map(|r| r.as_ok()).flatten() {
            if let Some(address) = pool.address.as_ref().filter(|a| !a.is_empty()) {
                if !addresses.contains(address) {
                    addresses.push(address.clone());
                }
            }
        }

        debug!("Looking up liquidity of {} trusted pools", addresses.len());
        let liquidity: HashMap<String, f64> = addresses
            .iter()
            .cloned()
            .zip(self.scheduler.fetch_all(&self.clients.tinyman, &addresses).await)
            .map(|(address, result)| {
                // an unreachable pool counts as empty
                let usd = result.ok().map(|l| l.liquidity_in_usd).unwrap_or(0.0);
                (address, usd)
            })
            .collect();

        let dex_pools = selected
            .into_iter()
            .map(|result| {
                result.map(|pools| {
                    pools
                        .iter()
                        .map(|pool| {
                            let usd = pool
                                .address
                                .as_ref()
                                .and_then(|a| liquidity.get(a))
                                .copied()
                                .unwrap_or(0.0);
                            PoolObservation::from_tinyman(pool, usd)
                        })
                        .collect()
                })
            })
            .collect();

        let pact_pools = pact_pages
            .into_iter()
            .map(|result| {
                result.map(|page| {
                    select_catalog_pact_pools(&page.results, &catalog_ids)
                        .into_iter()
                        .filter_map(PoolObservation::from_pact)
                        .collect()
                })
            })
            .collect();

        (dex_pools, pact_pools)
    }
}

fn stream_or_empty<T>(
    ids: &[AssetId],
    results: Option<Vec<ProviderResult<T>>>,
) -> ProviderStream<T> {
    results
        .map(|results| ProviderStream::from_results(ids, results))
        .unwrap_or_default()
}

fn unique_ids(assets: &[AssetStaticInfo]) -> Result<Vec<AssetId>> {
    let mut seen = HashSet::with_capacity(assets.len());
    let mut ids = Vec::with_capacity(assets.len());
    for asset in assets {
        if !seen.insert(asset.asset_id) {
            return Err(OrchestratorError::DuplicateAsset(asset.asset_id));
        }
        ids.push(asset.asset_id);
    }
    Ok(ids)
}
