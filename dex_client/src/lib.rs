// Provider clients for Algorand market data
// Each client maps one upstream endpoint to a typed ProviderResult

pub mod http;
pub mod indexer_client;
pub mod pact_client;
pub mod pera_client;
pub mod provider;
pub mod tinyman_client;
pub mod vestige_client;

// Re-export configs from config_manager
pub use config_manager::{IndexerConfig, PactConfig, PeraConfig, TinymanConfig, VestigeConfig};

pub use http::ProviderHttp;
pub use indexer_client::{AccountAssetHolding, AccountInformation, IndexerClient};
pub use pact_client::PactPoolsClient;
pub use pera_client::PeraAssetClient;
pub use provider::ProviderClient;
pub use tinyman_client::TinymanPoolLiquidityClient;
pub use vestige_client::{
    PriceSeriesRequest, SeriesSource, TvlHistoryRequest, VestigeAssetSearchClient,
    VestigeHoldersClient, VestigePoolsClient, VestigePriceSeriesClient, VestigeSpotPriceClient,
    VestigeTvlHistoryClient,
};

use market_core::ProviderFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DexClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} request failed: {failure}")]
    Provider {
        provider: &'static str,
        failure: ProviderFailure,
    },
    #[error("Invalid account address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, DexClientError>;
