pub mod badge;
pub mod catalog;
pub mod combiner;
pub mod interval;
pub mod metrics;
pub mod payload;
pub mod portfolio;
pub mod provider;
pub mod ranking;
pub mod serde_util;
pub mod tvl;
pub mod types;

pub use badge::{classify_badge, BadgeInputs, BadgeStatus, BadgeThresholds, BadgeTier};
pub use catalog::AssetCatalog;
pub use combiner::{combine, ProviderResults, ProviderStream};
pub use interval::PriceInterval;
pub use metrics::{
    normalize_amount, portfolio_share, price_change_from_samples, price_change_percent,
    usd_valuation, SupplyBreakdown,
};
pub use payload::{
    AssetSupplyInfo, HolderCount, IndexerAsset, IndexerAssetParams, PactAsset, PactPool,
    PactPoolsPage, PeraAsset, PoolInfo, PoolLiquidity, PriceSample, SpotPrice, TvlPoint,
};
pub use portfolio::{WalletAssetRecord, WalletPortfolio};
pub use provider::{ProviderFailure, ProviderResult};
pub use ranking::{
    filter_records, paginate, rank, sort_records, top_movers, total_pages, MoverDirection,
    Rankable, RankedPage, RankingState, SortDirection, SortField, SortKey,
};
pub use tvl::{PoolObservation, PoolPair, PoolSource};
pub use types::{AssetId, AssetMetricsRecord, AssetStaticInfo, FALLBACK_LOGO_URL};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Invalid asset identifier: {0}")]
    InvalidAssetId(String),
    #[error("Duplicate asset identifier: {0}")]
    DuplicateAsset(AssetId),
    #[error("Invalid price interval: {0}")]
    InvalidInterval(String),
    #[error("Unknown sort field: {0}")]
    InvalidSortField(String),
    #[error("Asset catalog error: {0}")]
    Catalog(String),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MarketError>;
