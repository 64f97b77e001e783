use crate::cycle::{ViewState, ViewStore};
use crate::pipeline::{MarketDataPipeline, PipelineProfile};
use crate::Result;
use chrono::{DateTime, Utc};
use dex_client::IndexerClient;
use market_core::{
    rank, AssetCatalog, AssetId, AssetStaticInfo, IndexerAsset, PriceInterval, ProviderResult,
    RankedPage, RankingState, WalletAssetRecord, WalletPortfolio,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const ALGO_DECIMALS: u32 = 6;
const ALGO_UNIT_NAME: &str = "ALGO";

/// An account holding whose asset parameters are known
#[derive(Debug, Clone, PartialEq)]
struct ResolvedHolding {
    static_info: AssetStaticInfo,
    unit_name: Option<String>,
    raw_amount: u64,
    decimals: u32,
}

impl ResolvedHolding {
    fn algo(catalog: &AssetCatalog, raw_amount: u64) -> Self {
        let static_info = catalog
            .get(AssetId::ALGO)
            .cloned()
            .unwrap_or_else(|| AssetStaticInfo::new(ALGO_UNIT_NAME, AssetId::ALGO));

        Self {
            static_info,
            unit_name: Some(ALGO_UNIT_NAME.to_string()),
            raw_amount,
            decimals: ALGO_DECIMALS,
        }
    }

    fn from_indexer(catalog: &AssetCatalog, asset: IndexerAsset, raw_amount: u64) -> Self {
        let params = asset.params;
        let static_info = catalog.get(asset.index).cloned().unwrap_or_else(|| {
            let name = params
                .name
                .clone()
                .or_else(|| params.unit_name.clone())
                .unwrap_or_else(|| asset.index.to_string());
            AssetStaticInfo::new(name, asset.index)
        });

        Self {
            static_info,
            unit_name: params.unit_name,
            raw_amount,
            decimals: params.decimals,
        }
    }
}

/// Holdings of a connected wallet, valued in USD and ranked like the catalog
/// views
#[derive(Debug)]
pub struct WalletPortfolioService {
    pipeline: Arc<MarketDataPipeline>,
    catalog: Arc<AssetCatalog>,
    indexer: IndexerClient,
    profile: PipelineProfile,
    store: ViewStore<WalletAssetRecord>,
}

impl WalletPortfolioService {
    pub fn new(
        pipeline: Arc<MarketDataPipeline>,
        catalog: Arc<AssetCatalog>,
        indexer: IndexerClient,
        profile: PipelineProfile,
    ) -> Self {
        Self {
            pipeline,
            catalog,
            indexer,
            profile,
            store: ViewStore::new(),
        }
    }

    pub fn default_ranking_state(&self) -> RankingState {
        RankingState::new(self.profile.default_sort, self.profile.page_size)
    }

    /// Fetches and values every holding of `address`.
    ///
    /// The account lookup failing fails the load. Holdings whose asset cannot
    /// be resolved, or whose amount rounds to zero, are left out.
    pub async fn load_portfolio(
        &self,
        address: &str,
        interval: PriceInterval,
        now: DateTime<Utc>,
    ) -> Result<WalletPortfolio> {
        info!("👛 Loading portfolio for {}", address);

        let account = self.indexer.account_information(address).await?;
        let assets = self.indexer.account_assets(address).await?;

        let held: Vec<(AssetId, u64)> = assets
            .iter()
            .filter(|h| h.amount > 0 && h.asset_id != AssetId::ALGO)
            .map(|h| (h.asset_id, h.amount))
            .collect();
        let ids: Vec<AssetId> = held.iter().map(|(id, _)| *id).collect();

        let lookups = self
            .pipeline
            .scheduler()
            .fetch_all(&self.indexer, &ids)
            .await;

        let mut resolved = vec![ResolvedHolding::algo(&self.catalog, account.amount)];
        for ((asset_id, raw_amount), lookup) in held.into_iter().zip(lookups) {
            match lookup {
                ProviderResult::Ok(asset) => {
                    resolved.push(ResolvedHolding::from_indexer(&self.catalog, asset, raw_amount))
                }
                ProviderResult::Failed(reason) => {
                    warn!("Skipping holding {}: asset lookup failed ({})", asset_id, reason)
                }
            }
        }

        let statics: Vec<AssetStaticInfo> =
            resolved.iter().map(|h| h.static_info.clone()).collect();
        let records = self
            .pipeline
            .aggregate(&statics, &self.catalog, &self.profile, interval, now)
            .await?;

        let holdings = resolved
            .into_iter()
            .zip(records)
            .map(|(holding, record)| {
                WalletAssetRecord::new(
                    record,
                    holding.unit_name,
                    holding.raw_amount,
                    holding.decimals,
                )
            })
            .collect();

        let portfolio = WalletPortfolio::new(holdings);
        debug!(
            "Portfolio for {}: {} holdings, ${:.2}",
            address,
            portfolio.len(),
            portfolio.total_usd_value
        );
        Ok(portfolio)
    }

    /// Loads the portfolio and publishes it unless a newer load has started
    pub async fn refresh(&self, address: &str, interval: PriceInterval) -> Result<bool> {
        let token = self.store.begin();
        match self.load_portfolio(address, interval, Utc::now()).await {
            Ok(portfolio) => Ok(self.store.commit(token, portfolio.holdings, Utc::now())),
            Err(e) => {
                self.store.fail(token, e.to_string());
                Err(e)
            }
        }
    }

    pub fn view(&self) -> Arc<ViewState<WalletAssetRecord>> {
        self.store.snapshot()
    }

    /// Visible page of the published holdings; `None` unless Ready
    pub fn current_page(&self, state: &RankingState) -> Option<RankedPage<WalletAssetRecord>> {
        let view = self.store.snapshot();
        if !view.is_ready() {
            return None;
        }
        Some(rank(view.records(), state))
    }
}
