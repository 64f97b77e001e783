use crate::metrics::{normalize_amount, portfolio_share, usd_valuation};
use crate::ranking::{Rankable, SortField, SortKey};
use crate::types::{AssetId, AssetMetricsRecord};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An asset held by a connected wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAssetRecord {
    pub record: AssetMetricsRecord,
    pub unit_name: Option<String>,
    /// On-chain integer amount
    pub raw_amount: u64,
    pub decimals: u32,
    /// `raw_amount / 10^decimals`, rounded for display
    pub amount: Decimal,
}

impl WalletAssetRecord {
    /// Sets `usd_value` on the record from the amount and its latest price
    pub fn new(
        mut record: AssetMetricsRecord,
        unit_name: Option<String>,
        raw_amount: u64,
        decimals: u32,
    ) -> Self {
        record.usd_value = Some(usd_valuation(raw_amount, decimals, record.latest_price_usd));

        Self {
            record,
            unit_name,
            raw_amount,
            decimals,
            amount: normalize_amount(raw_amount, decimals),
        }
    }

    pub fn asset_id(&self) -> AssetId {
        self.record.asset_id
    }

    pub fn usd_value(&self) -> f64 {
        self.record.usd_value.unwrap_or(0.0)
    }

    pub fn verified(&self) -> bool {
        self.record.verified
    }

    pub fn has_balance(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl Rankable for WalletAssetRecord {
    fn display_name(&self) -> &str {
        self.record.name()
    }

    fn identifier(&self) -> AssetId {
        self.record.asset_id
    }

    fn secondary_label(&self) -> Option<&str> {
        self.unit_name.as_deref()
    }

    fn sort_key(&self, field: SortField) -> SortKey {
        match field {
            SortField::Amount => SortKey::number(self.amount.to_f64()),
            other => self.record.sort_key(other),
        }
    }
}

/// Holdings of one wallet, largest USD position first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WalletPortfolio {
    pub holdings: Vec<WalletAssetRecord>,
    pub total_usd_value: f64,
}

impl WalletPortfolio {
    /// Drops holdings that round to a zero amount
    pub fn new(holdings: Vec<WalletAssetRecord>) -> Self {
        let mut holdings: Vec<WalletAssetRecord> =
            holdings.into_iter().filter(|h| h.has_balance()).collect();

        holdings.sort_by(|a, b| {
            b.usd_value()
                .partial_cmp(&a.usd_value())
                .unwrap_or(Ordering::Equal)
        });

        let total_usd_value = holdings.iter().map(|h| h.usd_value()).sum();

        Self {
            holdings,
            total_usd_value,
        }
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn get(&self, asset_id: AssetId) -> Option<&WalletAssetRecord> {
        self.holdings.iter().find(|h| h.asset_id() == asset_id)
    }

    /// Percent of the portfolio's USD value held in `asset_id`
    pub fn share(&self, asset_id: AssetId) -> f64 {
        self.get(asset_id)
            .map(|h| portfolio_share(h.usd_value(), self.total_usd_value))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetStaticInfo;
    use std::str::FromStr;

    fn holding(name: &str, id: u64, raw: u64, decimals: u32, price: f64) -> WalletAssetRecord {
        let mut record = AssetMetricsRecord::empty(AssetStaticInfo::new(name, AssetId(id)));
        record.latest_price_usd = price;
        WalletAssetRecord::new(record, Some(name.to_uppercase()), raw, decimals)
    }

    #[test]
    fn test_usd_value_from_amount_and_price() {
        let h = holding("Algo", 0, 12_500_000, 6, 0.2);
        assert_eq!(h.amount, Decimal::from_str("12.5").unwrap());
        assert!((h.usd_value() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_portfolio_orders_by_usd_value() {
        let portfolio = WalletPortfolio::new(vec![
            holding("small", 1, 1_000_000, 6, 1.0),
            holding("large", 2, 30_000_000, 6, 1.0),
            holding("dust", 3, 0, 6, 5.0),
        ]);

        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio.holdings[0].asset_id(), AssetId(2));
        assert!((portfolio.total_usd_value - 31.0).abs() < 1e-9);
        assert!((portfolio.share(AssetId(1)) - 100.0 / 31.0).abs() < 1e-9);
        assert_eq!(portfolio.share(AssetId(3)), 0.0);
    }

    #[test]
    fn test_secondary_label_is_unit_name() {
        let h = holding("Tinyman", 2200000000, 1, 0, 0.0);
        assert_eq!(h.secondary_label(), Some("TINYMAN"));
        assert_eq!(h.sort_key(SortField::Amount), SortKey::Number(1.0));
    }
}
