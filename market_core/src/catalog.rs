use crate::types::{AssetId, AssetStaticInfo};
use crate::{MarketError, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Ordered, duplicate-free list of the assets a session ranks.
///
/// Loaded once at session start and never mutated by the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetCatalog {
    assets: Vec<AssetStaticInfo>,
}

impl AssetCatalog {
    pub fn new(assets: Vec<AssetStaticInfo>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(assets.len());
        for asset in &assets {
            if !seen.insert(asset.asset_id) {
                return Err(MarketError::DuplicateAsset(asset.asset_id));
            }
        }
        Ok(Self { assets })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let assets: Vec<AssetStaticInfo> = serde_json::from_str(json)?;
        debug!("Parsed asset catalog with {} entries", assets.len());
        Self::new(assets)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MarketError::Catalog(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json_str(&json)?;
        info!(
            "Loaded {} assets from catalog {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn assets(&self) -> &[AssetStaticInfo] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, asset_id: AssetId) -> Option<&AssetStaticInfo> {
        self.assets.iter().find(|a| a.asset_id == asset_id)
    }

    pub fn contains(&self, asset_id: AssetId) -> bool {
        self.get(asset_id).is_some()
    }

    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.assets.iter().map(|a| a.asset_id).collect()
    }

    pub fn stable_anchor_ids(&self) -> HashSet<AssetId> {
        self.assets
            .iter()
            .filter(|a| a.is_stable_anchor)
            .map(|a| a.asset_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"name": "ALGO", "assetID": "0", "stableTVL": true},
        {"name": "USDC", "assetID": "31566704", "stableTVL": true},
        {"name": "AAA", "assetID": "2004387843", "memeToken": true}
    ]"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = AssetCatalog::from_json_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.stable_anchor_ids().len(), 2);
        assert!(catalog.contains(AssetId(2004387843)));
        assert_eq!(catalog.get(AssetId(31566704)).unwrap().name, "USDC");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"name": "A", "assetID": "1"},
            {"name": "B", "assetID": 1}
        ]"#;
        assert!(matches!(
            AssetCatalog::from_json_str(json),
            Err(MarketError::DuplicateAsset(AssetId(1)))
        ));
    }

    #[test]
    fn test_shared_names_are_allowed() {
        let json = r#"[
            {"name": "GOLD", "assetID": "1"},
            {"name": "GOLD", "assetID": "2"}
        ]"#;
        assert_eq!(AssetCatalog::from_json_str(json).unwrap().len(), 2);
    }
}
