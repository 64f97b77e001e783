use config_manager::SystemConfig;
use market_core::{AssetCatalog, AssetId, PriceInterval};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub mod badge_service;
pub mod batch_scheduler;
pub mod cycle;
pub mod pipeline;
pub mod session;
pub mod token_details;
pub mod wallet_portfolio;

pub use badge_service::BadgeService;
pub use batch_scheduler::{plan_batches, run_batched, BatchScheduler};
pub use cycle::{CycleToken, CycleTracker, ViewState, ViewStore};
pub use pipeline::{MarketDataPipeline, PipelineClients, PipelineProfile, ProviderSet};
pub use session::RankingSession;
pub use token_details::{LiquidityPoolView, PoolAssetLabel, TokenDetails, TokenDetailsService};
pub use wallet_portfolio::WalletPortfolioService;

#[derive(Error, Debug, Clone)]
pub enum OrchestratorError {
    #[error("Market data error: {0}")]
    Market(String),
    #[error("Provider client error: {0}")]
    Client(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Duplicate asset identifier in input: {0}")]
    DuplicateAsset(AssetId),
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl From<market_core::MarketError> for OrchestratorError {
    fn from(err: market_core::MarketError) -> Self {
        match err {
            market_core::MarketError::DuplicateAsset(id) => OrchestratorError::DuplicateAsset(id),
            other => OrchestratorError::Market(other.to_string()),
        }
    }
}

impl From<dex_client::DexClientError> for OrchestratorError {
    fn from(err: dex_client::DexClientError) -> Self {
        OrchestratorError::Client(err.to_string())
    }
}

impl From<config_manager::ConfigurationError> for OrchestratorError {
    fn from(err: config_manager::ConfigurationError) -> Self {
        OrchestratorError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Shared pipeline and catalog behind every view of one session
#[derive(Debug, Clone)]
pub struct MarketServices {
    config: SystemConfig,
    catalog: Arc<AssetCatalog>,
    pipeline: Arc<MarketDataPipeline>,
}

impl MarketServices {
    pub fn new(config: SystemConfig, catalog: AssetCatalog) -> Result<Self> {
        let pipeline = MarketDataPipeline::from_config(&config)?;
        info!(
            "Market services ready: {} catalog assets, batches of {}",
            catalog.len(),
            config.scheduler.batch_size
        );

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            pipeline: Arc::new(pipeline),
        })
    }

    /// Loads the catalog from the configured path
    pub fn from_config(config: SystemConfig) -> Result<Self> {
        let catalog = AssetCatalog::load(&config.catalog.path)?;
        Self::new(config, catalog)
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<AssetCatalog> {
        &self.catalog
    }

    pub fn pipeline(&self) -> &Arc<MarketDataPipeline> {
        &self.pipeline
    }

    pub fn default_interval(&self) -> Result<PriceInterval> {
        Ok(self.config.ranking.default_interval.parse()?)
    }

    pub fn ranking_session(&self) -> Result<RankingSession> {
        let profile = PipelineProfile::token_ranking(self.config.ranking.token_page_size);
        self.session(profile)
    }

    pub fn bubbles_session(&self) -> Result<RankingSession> {
        let profile = PipelineProfile::token_bubbles(self.config.ranking.top_movers_limit);
        self.session(profile)
    }

    fn session(&self, profile: PipelineProfile) -> Result<RankingSession> {
        Ok(
            RankingSession::new(self.pipeline.clone(), self.catalog.clone(), profile)
                .with_interval(self.default_interval()?),
        )
    }

    pub fn wallet_service(&self) -> Result<WalletPortfolioService> {
        Ok(WalletPortfolioService::new(
            self.pipeline.clone(),
            self.catalog.clone(),
            dex_client::IndexerClient::new(&self.config.indexer)?,
            PipelineProfile::wallet_holdings(self.config.ranking.wallet_page_size),
        ))
    }

    pub fn token_details(&self) -> Result<TokenDetailsService> {
        TokenDetailsService::new(self.pipeline.clone(), self.catalog.clone(), &self.config)
    }

    pub fn badge_service(&self) -> Result<BadgeService> {
        BadgeService::new(&self.config)
    }
}
