//! Liquidity pool selection and per-asset TVL aggregation.

use crate::payload::{PactPool, PoolInfo};
use crate::types::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Unordered pair of assets, stored sorted so `a/b == b/a`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolPair {
    low: AssetId,
    high: AssetId,
}

impl PoolPair {
    pub fn new(a: AssetId, b: AssetId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn contains(&self, asset: AssetId) -> bool {
        self.low == asset || self.high == asset
    }

    pub fn assets(&self) -> (AssetId, AssetId) {
        (self.low, self.high)
    }
}

impl fmt::Display for PoolPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.low, self.high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolSource {
    Tinyman,
    Pact,
}

/// One pool's USD liquidity as surfaced by one query path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolObservation {
    pub source: PoolSource,
    pub address: Option<String>,
    pub pair: PoolPair,
    pub liquidity_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Address(String),
    Pair(PoolSource, PoolPair),
}

impl PoolObservation {
    pub fn from_pact(pool: &PactPool) -> Option<Self> {
        let (a, b) = pool.pair()?;
        Some(Self {
            source: PoolSource::Pact,
            address: pool.address.clone(),
            pair: PoolPair::new(a, b),
            liquidity_usd: pool.tvl_usd,
        })
    }

    pub fn from_tinyman(pool: &PoolInfo, liquidity_usd: f64) -> Self {
        Self {
            source: PoolSource::Tinyman,
            address: pool.address.clone(),
            pair: PoolPair::new(pool.asset_1_id, pool.asset_2_id),
            liquidity_usd,
        }
    }

    /// Identity used for deduplication. Pact pools collapse onto their sorted
    /// pair; Tinyman pools are told apart by address when one is known.
    fn key(&self) -> PoolKey {
        match (self.source, &self.address) {
            (PoolSource::Tinyman, Some(address)) if !address.is_empty() => {
                PoolKey::Address(address.clone())
            }
            _ => PoolKey::Pair(self.source, self.pair),
        }
    }
}

/// Directory pools that count towards trusted TVL for `asset`: a trusted venue
/// and a stable-anchor counterpart
pub fn select_anchor_pools<'a>(
    asset: AssetId,
    pools: &'a [PoolInfo],
    anchors: &HashSet<AssetId>,
    trusted_providers: &[String],
) -> Vec<&'a PoolInfo> {
    pools
        .iter()
        .filter(|pool| trusted_providers.iter().any(|p| p == &pool.provider))
        .filter(|pool| {
            pool.counterpart(asset)
                .map(|other| other != asset && anchors.contains(&other))
                .unwrap_or(false)
        })
        .collect()
}

/// Pact pools whose both sides are catalog assets
pub fn select_catalog_pact_pools<'a>(
    pools: &'a [PactPool],
    catalog_ids: &HashSet<AssetId>,
) -> Vec<&'a PactPool> {
    pools
        .iter()
        .filter(|pool| {
            pool.pair()
                .map(|(a, b)| catalog_ids.contains(&a) && catalog_ids.contains(&b))
                .unwrap_or(false)
        })
        .collect()
}

/// Sum of USD liquidity over every distinct pool `asset` participates in.
///
/// The same pool reported by several query paths contributes once; the first
/// observation wins, so the result depends only on input order.
pub fn aggregate_tvl<'a, I>(asset: AssetId, observations: I) -> f64
where
    I: IntoIterator<Item = &'a PoolObservation>,
{
    let mut seen = HashSet::new();
    let mut total = 0.0;

    for observation in observations {
        if !observation.pair.contains(asset) {
            continue;
        }
        if !seen.insert(observation.key()) {
            continue;
        }
        if observation.liquidity_usd.is_finite() && observation.liquidity_usd > 0.0 {
            total += observation.liquidity_usd;
        }
    }

    total
}
