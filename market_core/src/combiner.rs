//! Merges independent per-provider, per-asset results into one record per asset.

use crate::metrics::{latest_tvl, price_change_from_samples};
use crate::payload::{HolderCount, PeraAsset, PriceSample, SpotPrice, TvlPoint};
use crate::provider::{ProviderFailure, ProviderResult};
use crate::tvl::{aggregate_tvl, PoolObservation};
use crate::types::{AssetId, AssetMetricsRecord, AssetStaticInfo, FALLBACK_LOGO_URL};
use std::collections::HashMap;
use tracing::debug;

/// Results of one provider, keyed by the asset they were fetched for
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStream<T> {
    entries: HashMap<AssetId, ProviderResult<T>>,
}

impl<T> Default for ProviderStream<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ProviderStream<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs each identifier with the result at the same index
    pub fn from_results(ids: &[AssetId], results: Vec<ProviderResult<T>>) -> Self {
        Self {
            entries: ids.iter().copied().zip(results).collect(),
        }
    }

    pub fn insert(&mut self, asset: AssetId, result: ProviderResult<T>) {
        self.entries.insert(asset, result);
    }

    /// Payload for `asset`, or `None` when the provider failed or has no entry
    pub fn payload(&self, asset: AssetId) -> Option<&T> {
        self.entries.get(&asset).and_then(ProviderResult::as_ok)
    }

    pub fn failure(&self, asset: AssetId) -> Option<&ProviderFailure> {
        self.entries.get(&asset).and_then(ProviderResult::failure)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_failed()).count()
    }
}

/// Everything the providers returned during one aggregation cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResults {
    /// Anchor pools found through the pool directory, with per-pool liquidity
    pub dex_pools: ProviderStream<Vec<PoolObservation>>,
    /// Catalog-to-catalog pools found through the Pact search
    pub pact_pools: ProviderStream<Vec<PoolObservation>>,
    pub spot_prices: ProviderStream<Vec<SpotPrice>>,
    pub price_series: ProviderStream<Vec<PriceSample>>,
    pub tvl_history: ProviderStream<Vec<TvlPoint>>,
    pub holders: ProviderStream<HolderCount>,
    pub verification: ProviderStream<PeraAsset>,
}

pub fn normalize_spot_price(asset: AssetId, prices: &[SpotPrice]) -> f64 {
    prices
        .iter()
        .find(|p| p.asset_id == Some(asset))
        .or_else(|| prices.iter().find(|p| p.asset_id.is_none()))
        .map(|p| p.price)
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
}

pub fn normalize_price_change(samples: &[PriceSample]) -> f64 {
    price_change_from_samples(samples)
}

pub fn normalize_full_tvl(history: &[TvlPoint]) -> f64 {
    latest_tvl(history)
}

pub fn normalize_holders(holders: &HolderCount) -> u64 {
    holders.0
}

/// `(verified, provider logo)`
pub fn normalize_verification(asset: &PeraAsset) -> (bool, Option<String>) {
    (asset.is_verified(), asset.logo_url().map(str::to_string))
}

/// Pera's own USD valuation, when it has one
pub fn normalize_verification_price(asset: &PeraAsset) -> Option<f64> {
    Some(asset.usd_value).filter(|v| v.is_finite() && *v > 0.0)
}

fn resolve_logo(static_info: &AssetStaticInfo, provider_logo: Option<String>) -> String {
    static_info
        .logo
        .clone()
        .filter(|logo| !logo.is_empty())
        .or(provider_logo)
        .unwrap_or_else(|| FALLBACK_LOGO_URL.to_string())
}

/// Builds one record per asset, in input order.
///
/// Missing or failed provider entries fall back to the record defaults. Pool
/// observations are pooled across every asset's query before aggregation so a
/// pool between two listed assets counts for both, but only once for each.
pub fn combine(assets: &[AssetStaticInfo], results: &ProviderResults) -> Vec<AssetMetricsRecord> {
    let observations: Vec<&PoolObservation> = assets
        .iter()
        .flat_map(|asset| {
            [
                results.dex_pools.payload(asset.asset_id),
                results.pact_pools.payload(asset.asset_id),
            ]
        })
        .flatten()
        .flatten()
        .collect();

    debug!(
        "Combining {} assets ({} pool observations, {} price failures, {} series failures)",
        assets.len(),
        observations.len(),
        results.spot_prices.failed_count(),
        results.price_series.failed_count()
    );

    assets
        .iter()
        .map(|static_info| {
            let id = static_info.asset_id;
            let mut record = AssetMetricsRecord::empty(static_info.clone());

            record.trusted_tvl = aggregate_tvl(id, observations.iter().copied());

            if let Some(history) = results.tvl_history.payload(id) {
                record.full_tvl = normalize_full_tvl(history);
            }
            if let Some(holders) = results.holders.payload(id) {
                record.holder_count = normalize_holders(holders);
            }
            if let Some(prices) = results.spot_prices.payload(id) {
                record.latest_price_usd = normalize_spot_price(id, prices);
            }
            if let Some(samples) = results.price_series.payload(id) {
                record.price_change_percent = normalize_price_change(samples);
            }

            let verification = results.verification.payload(id);
            let (verified, provider_logo) = verification
                .map(normalize_verification)
                .unwrap_or((false, None));
            record.verified = verified;

            // spot price first, Pera valuation when the spot price is missing
            if record.latest_price_usd <= 0.0 {
                if let Some(price) = verification.and_then(normalize_verification_price) {
                    record.latest_price_usd = price;
                }
            }
            record.logo_url = resolve_logo(static_info, provider_logo);

            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvl::{PoolPair, PoolSource};

    fn assets() -> Vec<AssetStaticInfo> {
        vec![
            AssetStaticInfo::new("ALGO", AssetId(0)).stable_anchor(),
            AssetStaticInfo::new("GOLD", AssetId(10)),
            AssetStaticInfo::new("GOLD", AssetId(11)),
        ]
    }

    fn ids() -> Vec<AssetId> {
        assets().iter().map(|a| a.asset_id).collect()
    }

    fn pool(address: &str, a: u64, b: u64, usd: f64) -> PoolObservation {
        PoolObservation {
            source: PoolSource::Tinyman,
            address: Some(address.to_string()),
            pair: PoolPair::new(AssetId(a), AssetId(b)),
            liquidity_usd: usd,
        }
    }

    fn populated() -> ProviderResults {
        let ids = ids();
        let mut results = ProviderResults::default();

        results.dex_pools = ProviderStream::from_results(
            &ids,
            vec![
                ProviderResult::Ok(vec![pool("P10", 10, 0, 500.0)]),
                ProviderResult::Ok(vec![pool("P10", 0, 10, 500.0), pool("P10B", 10, 0, 20.0)]),
                ProviderResult::Failed(ProviderFailure::Timeout),
            ],
        );
        results.spot_prices = ProviderStream::from_results(
            &ids,
            vec![
                ProviderResult::Ok(vec![SpotPrice { asset_id: Some(AssetId(0)), price: 0.2 }]),
                ProviderResult::Ok(vec![SpotPrice { asset_id: Some(AssetId(10)), price: 3.0 }]),
                ProviderResult::Ok(vec![SpotPrice { asset_id: Some(AssetId(11)), price: 7.0 }]),
            ],
        );
        results.price_series.insert(
            AssetId(10),
            ProviderResult::Ok(vec![
                PriceSample::Point { timestamp: 0, price: 2.0 },
                PriceSample::Point { timestamp: 1, price: 3.0 },
            ]),
        );
        results.holders.insert(AssetId(11), ProviderResult::Ok(HolderCount(42)));
        results.verification.insert(
            AssetId(10),
            ProviderResult::Ok(PeraAsset {
                verification_tier: Some("verified".into()),
                logo: Some("gold.png".into()),
                ..Default::default()
            }),
        );
        results
    }

    fn all_failed<T>(ids: &[AssetId]) -> ProviderStream<T> {
        let failures = ids
            .iter()
            .map(|_| ProviderResult::Failed(ProviderFailure::HttpStatus(500)))
            .collect();
        ProviderStream::from_results(ids, failures)
    }

    #[test]
    fn test_all_providers_failed_yields_defaults() {
        let ids = ids();
        let results = ProviderResults {
            dex_pools: all_failed(&ids),
            pact_pools: all_failed(&ids),
            spot_prices: all_failed(&ids),
            price_series: all_failed(&ids),
            tvl_history: all_failed(&ids),
            holders: all_failed(&ids),
            verification: all_failed(&ids),
        };

        let records = combine(&assets(), &results);
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.trusted_tvl, 0.0);
            assert_eq!(record.full_tvl, 0.0);
            assert_eq!(record.holder_count, 0);
            assert_eq!(record.latest_price_usd, 0.0);
            assert_eq!(record.price_change_percent, 0.0);
            assert!(!record.verified);
            assert_eq!(record.logo_url, FALLBACK_LOGO_URL);
        }
    }

    #[test]
    fn test_join_by_identifier_not_name() {
        let records = combine(&assets(), &populated());
        assert_eq!(records[1].name(), "GOLD");
        assert_eq!(records[2].name(), "GOLD");
        assert_eq!(records[1].latest_price_usd, 3.0);
        assert_eq!(records[2].latest_price_usd, 7.0);
        assert_eq!(records[1].holder_count, 0);
        assert_eq!(records[2].holder_count, 42);
        assert_eq!(records[1].price_change_percent, 50.0);
        assert!(records[1].verified);
        assert_eq!(records[1].logo_url, "gold.png");
    }

    #[test]
    fn test_pool_reported_twice_counted_once() {
        let records = combine(&assets(), &populated());
        // P10 seen from both the ALGO and GOLD queries, P10B once
        assert_eq!(records[1].trusted_tvl, 520.0);
        assert_eq!(records[0].trusted_tvl, 520.0);
        assert_eq!(records[2].trusted_tvl, 0.0);
    }

    #[test]
    fn test_combine_is_idempotent() {
        let results = populated();
        let first = combine(&assets(), &results);
        let second = combine(&assets(), &results);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_spot_price_ignores_other_assets() {
        let prices = vec![SpotPrice { asset_id: Some(AssetId(99)), price: 4.0 }];
        assert_eq!(normalize_spot_price(AssetId(10), &prices), 0.0);

        let untagged = vec![
            SpotPrice { asset_id: Some(AssetId(99)), price: 4.0 },
            SpotPrice { asset_id: None, price: 1.5 },
        ];
        assert_eq!(normalize_spot_price(AssetId(10), &untagged), 1.5);
    }

    #[test]
    fn test_verification_price_fills_missing_spot_price() {
        let mut results = populated();
        let pera = |usd_value| {
            ProviderResult::Ok(PeraAsset {
                verification_tier: Some("verified".into()),
                usd_value,
                ..Default::default()
            })
        };
        results.spot_prices.insert(AssetId(11), ProviderResult::Failed(ProviderFailure::Timeout));
        results.verification.insert(AssetId(11), pera(2.0));
        results.verification.insert(AssetId(10), pera(9.0));

        let records = combine(&assets(), &results);
        assert_eq!(records[2].latest_price_usd, 2.0);
        // a spot price is never overridden
        assert_eq!(records[1].latest_price_usd, 3.0);
    }

    #[test]
    fn test_catalog_logo_takes_precedence() {
        let mut assets = assets();
        assets[1].logo = Some("catalog.png".into());
        let records = combine(&assets, &populated());
        assert_eq!(records[1].logo_url, "catalog.png");
    }
}
