//! Provider payload shapes, exactly as the upstream APIs return them.
//!
//! Clients decode into these types and hand them over untouched; turning
//! them into record fields happens in [`crate::combiner`].

use crate::serde_util::{lenient_f64, lenient_opt_f64};
use crate::types::AssetId;
use serde::de::{IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Pool directory entry (`GET pools?asset=<id>`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolInfo {
    /// Venue code, e.g. `T2`, `T3`, `TM`
    #[serde(default)]
    pub provider: String,
    pub asset_1_id: AssetId,
    pub asset_2_id: AssetId,
    #[serde(default)]
    pub address: Option<String>,
}

impl PoolInfo {
    /// The other side of the pair, if `asset` is one side
    pub fn counterpart(&self, asset: AssetId) -> Option<AssetId> {
        if self.asset_1_id == asset {
            Some(self.asset_2_id)
        } else if self.asset_2_id == asset {
            Some(self.asset_1_id)
        } else {
            None
        }
    }
}

/// Per-pool analytics (`GET pools/<address>`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolLiquidity {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liquidity_in_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PactAsset {
    pub id: AssetId,
    #[serde(default)]
    pub unit_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PactPool {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub assets: Vec<PactAsset>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tvl_usd: f64,
}

impl PactPool {
    /// Both sides of the pool, when the provider listed exactly two assets
    pub fn pair(&self) -> Option<(AssetId, AssetId)> {
        match self.assets.as_slice() {
            [a, b] => Some((a.id, b.id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PactPoolsPage {
    #[serde(default)]
    pub results: Vec<PactPool>,
}

/// Spot price entry (`GET price?asset=<id>&currency=usd`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotPrice {
    #[serde(default)]
    pub asset_id: Option<AssetId>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,
}

/// One sample of a price history, either an OHLC candle or a bare price point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceSample {
    Candle {
        timestamp: i64,
        #[serde(deserialize_with = "lenient_f64")]
        open: f64,
        #[serde(deserialize_with = "lenient_f64")]
        close: f64,
    },
    Point {
        timestamp: i64,
        #[serde(deserialize_with = "lenient_f64")]
        price: f64,
    },
}

impl PriceSample {
    /// Price at the start of the sample's bucket
    pub fn opening_price(&self) -> f64 {
        match self {
            PriceSample::Candle { open, .. } => *open,
            PriceSample::Point { price, .. } => *price,
        }
    }

    /// Price at the end of the sample's bucket
    pub fn closing_price(&self) -> f64 {
        match self {
            PriceSample::Candle { close, .. } => *close,
            PriceSample::Point { price, .. } => *price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvlPoint {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tvl: f64,
}

/// Holder list reduced to its length while decoding.
///
/// The upstream endpoint returns one element per holder; only the count is
/// ever used, so elements are skipped instead of materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HolderCount(pub u64);

impl<'de> Deserialize<'de> for HolderCount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CountVisitor;

        impl<'de> Visitor<'de> for CountVisitor {
            type Value = HolderCount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an array of holders")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut count = 0u64;
                while seq.next_element::<IgnoredAny>()?.is_some() {
                    count += 1;
                }
                Ok(HolderCount(count))
            }
        }

        deserializer.deserialize_seq(CountVisitor)
    }
}

/// Verification / logo lookup (`GET assets/<id>`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeraAsset {
    #[serde(default)]
    pub asset_id: Option<AssetId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub fraction_decimals: Option<u32>,
    #[serde(default)]
    pub verification_tier: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_value: f64,
}

impl PeraAsset {
    pub fn is_verified(&self) -> bool {
        self.verification_tier.as_deref() == Some("verified")
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo.as_deref().filter(|logo| !logo.is_empty())
    }
}

/// Supply and creator details from the asset search endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetSupplyInfo {
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub supply: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub circulating_supply: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub burned_supply: Option<f64>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub reserve: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub has_clawback: Option<bool>,
    #[serde(default)]
    pub has_freeze: Option<bool>,
    #[serde(default)]
    pub created_round: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexerAssetParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "unit-name")]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub decimals: u32,
}

/// Read-only asset lookup from the ledger indexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerAsset {
    pub index: AssetId,
    #[serde(default)]
    pub params: IndexerAssetParams,
}
