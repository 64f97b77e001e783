//! Derived numeric metrics. Every function here is total: no input produces
//! `NaN` or an infinity.

use crate::payload::{AssetSupplyInfo, PriceSample, TvlPoint};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Percentage change from `start` to `end`; `0` when `start <= 0`
pub fn price_change_percent(start: f64, end: f64) -> f64 {
    if !start.is_finite() || !end.is_finite() || start <= 0.0 {
        return 0.0;
    }
    finite_or_zero((end - start) / start * 100.0)
}

/// Percentage change between the first and last sample of a series.
///
/// Uses the opening price of the first sample and the closing price of the
/// last. Fewer than two samples yields `0`.
pub fn price_change_from_samples(samples: &[PriceSample]) -> f64 {
    match samples {
        [first, .., last] => price_change_percent(first.opening_price(), last.closing_price()),
        _ => 0.0,
    }
}

/// Most recent TVL of a history series, `0` for an empty series
pub fn latest_tvl(history: &[TvlPoint]) -> f64 {
    history.last().map(|p| finite_or_zero(p.tvl)).unwrap_or(0.0)
}

/// Decimal places shown for an asset with `decimals` on-chain decimals
pub fn display_decimals(decimals: u32) -> u32 {
    if decimals > 2 {
        4
    } else {
        2
    }
}

/// Exact `raw / 10^decimals`, without display rounding
pub fn base_units(raw_amount: u64, decimals: u32) -> Decimal {
    Decimal::try_from_i128_with_scale(raw_amount as i128, decimals).unwrap_or(Decimal::ZERO)
}

/// `raw / 10^decimals` rounded for display
pub fn normalize_amount(raw_amount: u64, decimals: u32) -> Decimal {
    base_units(raw_amount, decimals).round_dp_with_strategy(
        display_decimals(decimals),
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// `normalizedAmount × unitPriceUSD`
pub fn usd_valuation(raw_amount: u64, decimals: u32, unit_price_usd: f64) -> f64 {
    let amount = normalize_amount(raw_amount, decimals).to_f64().unwrap_or(0.0);
    finite_or_zero(amount * finite_or_zero(unit_price_usd))
}

/// Share of `value` in `total`, in percent; `0` for an empty portfolio
pub fn portfolio_share(value: f64, total: f64) -> f64 {
    if !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    finite_or_zero(value / total * 100.0)
}

/// Circulating and burned supply as percentages of total supply
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SupplyBreakdown {
    pub circulating_percent: f64,
    pub burned_percent: f64,
}

impl SupplyBreakdown {
    pub fn from_supplies(total: Option<f64>, circulating: Option<f64>, burned: Option<f64>) -> Self {
        let total = match total {
            Some(t) if t.is_finite() && t > 0.0 => t,
            _ => return Self::default(),
        };

        let percent_of_total =
            |part: Option<f64>| part.map(|p| finite_or_zero(p / total * 100.0)).unwrap_or(0.0);

        Self {
            circulating_percent: percent_of_total(circulating),
            burned_percent: percent_of_total(burned),
        }
    }

    pub fn from_supply_info(info: &AssetSupplyInfo) -> Self {
        Self::from_supplies(info.supply, info.circulating_supply, info.burned_supply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn point(price: f64) -> PriceSample {
        PriceSample::Point { timestamp: 0, price }
    }

    #[test]
    fn test_price_change_basic() {
        assert_eq!(price_change_percent(2.0, 3.0), 50.0);
        assert_eq!(price_change_percent(4.0, 3.0), -25.0);
    }

    #[test]
    fn test_price_change_zero_start() {
        assert_eq!(price_change_percent(0.0, 3.0), 0.0);
        assert_eq!(price_change_percent(-1.0, 3.0), 0.0);
        assert_eq!(price_change_percent(f64::NAN, 3.0), 0.0);
        assert_eq!(price_change_percent(1.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_price_change_needs_two_samples() {
        assert_eq!(price_change_from_samples(&[]), 0.0);
        assert_eq!(price_change_from_samples(&[point(5.0)]), 0.0);
        assert_eq!(price_change_from_samples(&[point(1.0), point(9.0), point(2.0)]), 100.0);
    }

    #[test]
    fn test_candles_use_open_then_close() {
        let samples = vec![
            PriceSample::Candle { timestamp: 0, open: 10.0, close: 50.0 },
            PriceSample::Candle { timestamp: 1, open: 50.0, close: 12.0 },
        ];
        assert!((price_change_from_samples(&samples) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_amount_rounding() {
        // 6 decimals -> rounded to 4 places
        assert_eq!(normalize_amount(1_234_567, 6), Decimal::from_str("1.2346").unwrap());
        // 2 decimals -> 2 places
        assert_eq!(normalize_amount(12_345, 2), Decimal::from_str("123.45").unwrap());
        // 0 decimals
        assert_eq!(normalize_amount(42, 0), Decimal::from(42));
        // midpoint rounds away from zero
        assert_eq!(normalize_amount(125, 3), Decimal::from_str("0.125").unwrap());
        assert_eq!(normalize_amount(1_000_050, 6), Decimal::from_str("1.0001").unwrap());
    }

    #[test]
    fn test_usd_valuation() {
        let value = usd_valuation(2_500_000, 6, 0.2);
        assert!((value - 0.5).abs() < 1e-12);
        assert_eq!(usd_valuation(2_500_000, 6, f64::NAN), 0.0);
    }

    #[test]
    fn test_supply_breakdown() {
        let s = SupplyBreakdown::from_supplies(Some(1000.0), Some(250.0), Some(100.0));
        assert_eq!(s.circulating_percent, 25.0);
        assert_eq!(s.burned_percent, 10.0);

        assert_eq!(
            SupplyBreakdown::from_supplies(Some(0.0), Some(250.0), Some(100.0)),
            SupplyBreakdown::default()
        );
        assert_eq!(
            SupplyBreakdown::from_supplies(None, Some(250.0), None),
            SupplyBreakdown::default()
        );
    }

    #[test]
    fn test_portfolio_share() {
        assert_eq!(portfolio_share(25.0, 100.0), 25.0);
        assert_eq!(portfolio_share(25.0, 0.0), 0.0);
    }

    #[test]
    fn test_latest_tvl() {
        let history = vec![
            TvlPoint { timestamp: Some(1), tvl: 10.0 },
            TvlPoint { timestamp: Some(2), tvl: 15.0 },
        ];
        assert_eq!(latest_tvl(&history), 15.0);
        assert_eq!(latest_tvl(&[]), 0.0);
    }
}
