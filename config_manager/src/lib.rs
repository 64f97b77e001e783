use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] ConfigError),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

const ENV_PREFIX: &str = "ALGORANK";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Vestige market data APIs (pools, prices, candles, TVL, holders)
    pub vestige: VestigeConfig,

    /// Tinyman analytics API (per-pool liquidity)
    pub tinyman: TinymanConfig,

    /// Pact pool search API
    pub pact: PactConfig,

    /// Pera asset API (verification tier, logo, USD value)
    pub pera: PeraConfig,

    /// Algorand indexer used for read-only account and asset lookups
    pub indexer: IndexerConfig,

    /// Batch fan-out settings
    pub scheduler: SchedulerConfig,

    /// Ranking view defaults
    pub ranking: RankingConfig,

    /// Badge classification inputs and thresholds
    pub badge: BadgeConfig,

    /// Static asset catalog
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VestigeConfig {
    /// Main API base URL (pools, spot prices, candles, TVL history)
    pub api_base_url: String,

    /// Free API base URL (holders, simple price history, asset search)
    pub free_api_base_url: String,

    /// Network id passed as `network_id` (0 = mainnet)
    pub network_id: u32,

    /// Asset prices are denominated in (USDC)
    pub denominating_asset_id: u64,

    /// Page size for the pool directory
    pub pools_limit: u32,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TinymanConfig {
    pub api_base_url: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PactConfig {
    pub api_base_url: String,

    /// Maximum pools returned by one search
    pub search_limit: u32,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeraConfig {
    pub api_base_url: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub api_base_url: String,

    /// Page size for account asset listings
    pub assets_limit: u32,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Identifiers fetched concurrently per batch
    pub batch_size: usize,

    /// Pause between consecutive batches in milliseconds
    pub inter_batch_delay_ms: u64,

    /// Retries per failed provider call (0 disables retrying)
    pub retry_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Rows per page in the token ranking table
    pub token_page_size: usize,

    /// Rows per page in the wallet holdings view
    pub wallet_page_size: usize,

    /// Interval selected when a view opens (`1D`, `7D` or `30D`)
    pub default_interval: String,

    /// Pool venues whose pools count towards trusted TVL
    pub trusted_pool_providers: Vec<String>,

    /// Number of records shown in the movers view
    pub top_movers_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeConfig {
    /// Reward token whose USD value feeds the badge
    pub reward_asset_id: u64,
    pub reward_asset_decimals: u32,

    /// LP token representing the wallet's pool position
    pub lp_asset_id: u64,
    pub lp_asset_decimals: u32,

    pub lp_position_usd_threshold: f64,
    pub algo_balance_threshold: f64,
    pub token_usd_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path of the JSON asset catalog
    pub path: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            vestige: VestigeConfig {
                api_base_url: "https://api.vestigelabs.org".to_string(),
                free_api_base_url: "https://free-api.vestige.fi".to_string(),
                network_id: 0,
                denominating_asset_id: 31566704,
                pools_limit: 250,
                request_timeout_seconds: 5,
            },
            tinyman: TinymanConfig {
                api_base_url: "https://mainnet.analytics.tinyman.org".to_string(),
                request_timeout_seconds: 5,
            },
            pact: PactConfig {
                api_base_url: "https://api.pact.fi".to_string(),
                search_limit: 50,
                request_timeout_seconds: 5,
            },
            pera: PeraConfig {
                api_base_url: "https://mainnet.api.perawallet.app".to_string(),
                request_timeout_seconds: 5,
            },
            indexer: IndexerConfig {
                api_base_url: "https://mainnet-idx.algonode.cloud".to_string(),
                assets_limit: 100,
                request_timeout_seconds: 5,
            },
            scheduler: SchedulerConfig {
                batch_size: 5,
                inter_batch_delay_ms: 500,
                retry_attempts: 0,
            },
            ranking: RankingConfig {
                token_page_size: 15,
                wallet_page_size: 10,
                default_interval: "1D".to_string(),
                trusted_pool_providers: vec!["T2".to_string(), "T3".to_string(), "TM".to_string()],
                top_movers_limit: 25,
            },
            badge: BadgeConfig {
                reward_asset_id: 2004387843,
                reward_asset_decimals: 10,
                lp_asset_id: 2004411684,
                lp_asset_decimals: 6,
                lp_position_usd_threshold: 200.0,
                algo_balance_threshold: 100.0,
                token_usd_threshold: 100.0,
            },
            catalog: CatalogConfig {
                path: "assets.json".to_string(),
            },
        }
    }
}

fn require_url(section: &str, url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(ConfigurationError::InvalidValue(format!(
            "{} base URL cannot be empty",
            section
        )));
    }
    Ok(())
}

fn require_timeout(section: &str, seconds: u64) -> Result<()> {
    if seconds == 0 {
        return Err(ConfigurationError::InvalidValue(format!(
            "{} request timeout must be greater than 0",
            section
        )));
    }
    Ok(())
}

impl VestigeConfig {
    pub fn validate(&self) -> Result<()> {
        require_url("Vestige", &self.api_base_url)?;
        require_url("Vestige free API", &self.free_api_base_url)?;
        require_timeout("Vestige", self.request_timeout_seconds)?;

        if self.pools_limit == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Vestige pools limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl TinymanConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl PactConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl PeraConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl IndexerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Scheduler batch size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.token_page_size == 0 || self.wallet_page_size == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Page sizes must be greater than 0".to_string(),
            ));
        }

        if !matches!(
            self.default_interval.trim().to_uppercase().as_str(),
            "1D" | "7D" | "30D"
        ) {
            return Err(ConfigurationError::InvalidValue(format!(
                "Unsupported default interval '{}', expected 1D, 7D or 30D",
                self.default_interval
            )));
        }

        if self.trusted_pool_providers.is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "At least one trusted pool provider is required".to_string(),
            ));
        }

        Ok(())
    }
}

impl SystemConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config_builder = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&SystemConfig::default())?);

        if config_path.as_ref().exists() {
            info!(
                "Loading configuration from: {}",
                config_path.as_ref().display()
            );
            config_builder = config_builder.add_source(File::from(config_path.as_ref()));
        } else {
            debug!("Config file not found, using defaults and environment variables");
        }

        // e.g. ALGORANK__SCHEDULER__BATCH_SIZE=3
        config_builder = config_builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("ranking.trusted_pool_providers"),
        );

        let system_config: SystemConfig = config_builder.build()?.try_deserialize()?;

        system_config.validate()?;

        debug!(
            "Configuration: batch_size={}, delay={}ms, token_page_size={}",
            system_config.scheduler.batch_size,
            system_config.scheduler.inter_batch_delay_ms,
            system_config.ranking.token_page_size
        );

        Ok(system_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.vestige.validate()?;
        self.scheduler.validate()?;
        self.ranking.validate()?;

        require_url("Tinyman", &self.tinyman.api_base_url)?;
        require_timeout("Tinyman", self.tinyman.request_timeout_seconds)?;
        require_url("Pact", &self.pact.api_base_url)?;
        require_timeout("Pact", self.pact.request_timeout_seconds)?;
        require_url("Pera", &self.pera.api_base_url)?;
        require_timeout("Pera", self.pera.request_timeout_seconds)?;
        require_url("Indexer", &self.indexer.api_base_url)?;
        require_timeout("Indexer", self.indexer.request_timeout_seconds)?;

        if self.catalog.path.trim().is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "Asset catalog path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
