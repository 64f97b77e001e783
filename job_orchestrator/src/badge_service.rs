use crate::{OrchestratorError, Result};
use config_manager::{BadgeConfig, SystemConfig};
use dex_client::{IndexerClient, PeraAssetClient, ProviderClient, VestigeSpotPriceClient};
use market_core::combiner::normalize_spot_price;
use market_core::metrics::base_units;
use market_core::{
    classify_badge, AssetId, BadgeInputs, BadgeStatus, BadgeThresholds, BadgeTier, ProviderResult,
};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

const ALGO_DECIMALS: u32 = 6;

fn whole_units(raw_amount: u64, decimals: u32) -> f64 {
    base_units(raw_amount, decimals).to_f64().unwrap_or(0.0)
}

/// Classifies connected wallets into badge tiers.
///
/// The latest classification per wallet is kept in memory; the value returned
/// by [`BadgeService::status`] is always freshly computed.
#[derive(Debug, Clone)]
pub struct BadgeService {
    indexer: IndexerClient,
    prices: VestigeSpotPriceClient,
    pera: PeraAssetClient,
    config: BadgeConfig,
    cache: Arc<RwLock<HashMap<String, BadgeTier>>>,
}

impl BadgeService {
    pub fn new(config: &SystemConfig) -> Result<Self> {
        Ok(Self {
            indexer: IndexerClient::new(&config.indexer)?,
            prices: VestigeSpotPriceClient::new(&config.vestige)?,
            pera: PeraAssetClient::new(&config.pera)?,
            config: config.badge.clone(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn thresholds(&self) -> BadgeThresholds {
        BadgeThresholds {
            lp_position_usd: self.config.lp_position_usd_threshold,
            algo_balance: self.config.algo_balance_threshold,
            token_usd: self.config.token_usd_threshold,
        }
    }

    /// Balances and USD values the classifier needs.
    ///
    /// Prices are only fetched for positions the wallet actually holds.
    pub async fn inputs(&self, address: &str) -> Result<BadgeInputs> {
        let account = self.indexer.account_information(address).await?;

        let reward_id = AssetId(self.config.reward_asset_id);
        let lp_id = AssetId(self.config.lp_asset_id);
        let reward_amount = account.asset_amount(reward_id);
        let lp_amount = account.asset_amount(lp_id);

        let token_usd_value = if reward_amount > 0 {
            let prices = require("reward token price", self.prices.fetch(&reward_id).await)?;
            whole_units(reward_amount, self.config.reward_asset_decimals)
                * normalize_spot_price(reward_id, &prices)
        } else {
            0.0
        };

        let lp_position_usd_value = if lp_amount > 0 {
            let lp_asset = require("lp token value", self.pera.fetch(&lp_id).await)?;
            whole_units(lp_amount, self.config.lp_asset_decimals) * lp_asset.usd_value
        } else {
            0.0
        };

        Ok(BadgeInputs {
            algo_balance: whole_units(account.amount, ALGO_DECIMALS),
            token_usd_value,
            lp_position_usd_value,
        })
    }

    /// Badge for an optional connected wallet; any fetch failure leaves the
    /// tier unset
    pub async fn status(&self, address: Option<&str>) -> BadgeStatus {
        let Some(address) = address else {
            return BadgeStatus::NoWallet;
        };

        match self.inputs(address).await {
            Ok(inputs) => {
                let tier = classify_badge(&inputs, &self.thresholds());
                debug!("Badge inputs for {}: {:?}", address, inputs);
                info!("🏅 {} classified as {}", address, tier);
                if let Ok(mut cache) = self.cache.write() {
                    cache.insert(address.to_string(), tier);
                }
                BadgeStatus::Classified(tier)
            }
            Err(e) => {
                warn!("Badge unavailable for {}: {}", address, e);
                BadgeStatus::Unavailable(e.to_string())
            }
        }
    }

    pub fn cached_tier(&self, address: &str) -> Option<BadgeTier> {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(address).copied())
    }
}

fn require<T>(what: &str, result: ProviderResult<T>) -> Result<T> {
    result
        .into_result()
        .map_err(|failure| OrchestratorError::Pipeline(format!("{} unavailable: {}", what, failure)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_units() {
        assert_eq!(whole_units(150_000_000, 6), 150.0);
        assert_eq!(whole_units(20_000_000_000, 10), 2.0);
        assert_eq!(whole_units(0, 6), 0.0);
    }

    #[tokio::test]
    async fn test_no_wallet() {
        let service = BadgeService::new(&SystemConfig::default()).unwrap();
        assert_eq!(service.status(None).await, BadgeStatus::NoWallet);
        assert!(service.cached_tier("anything").is_none());
    }
}
