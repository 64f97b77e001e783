use crate::{MarketError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image shown when neither the catalog nor the verification provider has a logo
pub const FALLBACK_LOGO_URL: &str = "https://app.perawallet.app/assets/images/tokens/unknown.svg";

/// On-chain asset index. `0` is the native ALGO.
///
/// This is the only key used to join partial results across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl AssetId {
    pub const ALGO: AssetId = AssetId(0);

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(AssetId)
            .map_err(|_| MarketError::InvalidAssetId(s.to_string()))
    }
}

impl From<u64> for AssetId {
    fn from(value: u64) -> Self {
        AssetId(value)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Providers disagree on whether ids are numbers or strings
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(AssetId(n)),
            RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Immutable per-asset configuration supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetStaticInfo {
    /// Display name (may collide between assets, never used as a join key)
    pub name: String,

    #[serde(rename = "assetID", alias = "asset_id")]
    pub asset_id: AssetId,

    /// Logo reference shipped with the catalog
    #[serde(default)]
    pub logo: Option<String>,

    #[serde(default, rename = "vestigeLink", alias = "vestige_link")]
    pub vestige_link: Option<String>,

    #[serde(default, rename = "xLink", alias = "x_link")]
    pub x_link: Option<String>,

    /// Pools against this asset count towards trusted TVL
    #[serde(default, rename = "stableTVL", alias = "is_stable_anchor")]
    pub is_stable_anchor: bool,

    #[serde(default, rename = "useCaseToken", alias = "is_use_case_token")]
    pub is_use_case_token: bool,

    #[serde(default, rename = "memeToken", alias = "is_meme_token")]
    pub is_meme_token: bool,

    #[serde(default, rename = "wrappedAsset", alias = "is_wrapped_asset")]
    pub is_wrapped_asset: bool,
}

impl AssetStaticInfo {
    pub fn new(name: impl Into<String>, asset_id: AssetId) -> Self {
        Self {
            name: name.into(),
            asset_id,
            logo: None,
            vestige_link: None,
            x_link: None,
            is_stable_anchor: false,
            is_use_case_token: false,
            is_meme_token: false,
            is_wrapped_asset: false,
        }
    }

    pub fn stable_anchor(mut self) -> Self {
        self.is_stable_anchor = true;
        self
    }
}

/// Combined, normalized metrics for one asset in one aggregation cycle.
///
/// Every numeric field is populated once combination completes; a provider
/// that failed or had no data contributes `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetricsRecord {
    pub asset_id: AssetId,
    pub static_info: AssetStaticInfo,

    /// USD liquidity of deduplicated pools against stable anchors / catalog assets
    pub trusted_tvl: f64,

    /// Latest point of the provider's TVL history
    pub full_tvl: f64,

    pub holder_count: u64,
    pub latest_price_usd: f64,
    pub price_change_percent: f64,

    /// Only set for views that hold a position in the asset
    pub usd_value: Option<f64>,

    pub verified: bool,
    pub logo_url: String,
}

impl AssetMetricsRecord {
    /// Record with every metric at its default
    pub fn empty(static_info: AssetStaticInfo) -> Self {
        let logo_url = static_info
            .logo
            .clone()
            .unwrap_or_else(|| FALLBACK_LOGO_URL.to_string());

        Self {
            asset_id: static_info.asset_id,
            static_info,
            trusted_tvl: 0.0,
            full_tvl: 0.0,
            holder_count: 0,
            latest_price_usd: 0.0,
            price_change_percent: 0.0,
            usd_value: None,
            verified: false,
            logo_url,
        }
    }

    pub fn name(&self) -> &str {
        &self.static_info.name
    }
}
