//! Filter, sort and paginate over already-combined records. No I/O.

use crate::interval::PriceInterval;
use crate::types::{AssetId, AssetMetricsRecord};
use crate::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TOP_MOVERS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    TrustedTvl,
    FullTvl,
    Holders,
    LatestPrice,
    PriceChange,
    UsdValue,
    Amount,
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortField::Name => "name",
            SortField::TrustedTvl => "trusted_tvl",
            SortField::FullTvl => "full_tvl",
            SortField::Holders => "holders",
            SortField::LatestPrice => "latest_price",
            SortField::PriceChange => "price_change",
            SortField::UsdValue => "usd_value",
            SortField::Amount => "amount",
        };
        f.write_str(name)
    }
}

impl FromStr for SortField {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "name" => Ok(SortField::Name),
            "trustedtvl" | "tvl" => Ok(SortField::TrustedTvl),
            "fulltvl" => Ok(SortField::FullTvl),
            "holders" | "holdercount" => Ok(SortField::Holders),
            "price" | "latestprice" => Ok(SortField::LatestPrice),
            "pricechange" | "change" => Ok(SortField::PriceChange),
            "usdvalue" | "value" => Ok(SortField::UsdValue),
            "amount" => Ok(SortField::Amount),
            _ => Err(MarketError::InvalidSortField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Value a record exposes for one sort field
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    /// Numeric key with missing and non-finite values treated as `0`
    pub fn number(value: Option<f64>) -> Self {
        SortKey::Number(value.filter(|v| v.is_finite()).unwrap_or(0.0))
    }

    /// `a > b ? 1 : a < b ? -1 : 0`
    pub fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Text(a), SortKey::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            _ => Ordering::Equal,
        }
    }
}

/// Anything the ranking engine can filter and order
pub trait Rankable {
    fn display_name(&self) -> &str;

    fn identifier(&self) -> AssetId;

    /// Extra text matched by the filter, e.g. a unit name
    fn secondary_label(&self) -> Option<&str> {
        None
    }

    fn sort_key(&self, field: SortField) -> SortKey;
}

impl<T: Rankable + ?Sized> Rankable for &T {
    fn display_name(&self) -> &str {
        (**self).display_name()
    }

    fn identifier(&self) -> AssetId {
        (**self).identifier()
    }

    fn secondary_label(&self) -> Option<&str> {
        (**self).secondary_label()
    }

    fn sort_key(&self, field: SortField) -> SortKey {
        (**self).sort_key(field)
    }
}

impl Rankable for AssetMetricsRecord {
    fn display_name(&self) -> &str {
        self.name()
    }

    fn identifier(&self) -> AssetId {
        self.asset_id
    }

    fn sort_key(&self, field: SortField) -> SortKey {
        match field {
            SortField::Name => SortKey::Text(self.name().to_string()),
            SortField::TrustedTvl => SortKey::number(Some(self.trusted_tvl)),
            SortField::FullTvl => SortKey::number(Some(self.full_tvl)),
            SortField::Holders => SortKey::number(Some(self.holder_count as f64)),
            SortField::LatestPrice => SortKey::number(Some(self.latest_price_usd)),
            SortField::PriceChange => SortKey::number(Some(self.price_change_percent)),
            SortField::UsdValue => SortKey::number(self.usd_value),
            SortField::Amount => SortKey::number(None),
        }
    }
}

/// Sort, filter and paging controls of one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingState {
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
    pub filter: String,
    pub interval: PriceInterval,
}

impl RankingState {
    pub fn new(sort_field: SortField, page_size: usize) -> Self {
        Self {
            sort_field,
            sort_direction: SortDirection::Desc,
            page: 1,
            page_size,
            filter: String::new(),
            interval: PriceInterval::default(),
        }
    }

    /// Same field flips the direction, a new field starts descending
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Desc;
        }
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.page = 1;
    }

    /// Not clamped against the record count; out-of-range pages render empty
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_interval(&mut self, interval: PriceInterval) {
        self.interval = interval;
    }
}

/// One display page plus the counts needed for navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPage<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
}

impl<T> RankedPage<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

fn matches_filter<T: Rankable>(record: &T, needle: &str) -> bool {
    record.display_name().to_lowercase().contains(needle)
        || record.identifier().to_string().contains(needle)
        || record
            .secondary_label()
            .map(|label| label.to_lowercase().contains(needle))
            .unwrap_or(false)
}

/// Case-insensitive substring match on the name (or secondary label), or a
/// substring of the identifier. An empty filter keeps everything.
pub fn filter_records<'a, T: Rankable>(records: &'a [T], filter: &str) -> Vec<&'a T> {
    if filter.is_empty() {
        return records.iter().collect();
    }
    let needle = filter.to_lowercase();
    records.iter().filter(|r| matches_filter(*r, &needle)).collect()
}

pub fn sort_records<T: Rankable>(records: &mut [T], field: SortField, direction: SortDirection) {
    records.sort_by(|a, b| {
        let ordering = a.sort_key(field).compare(&b.sort_key(field));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Items `[(page-1)*page_size, page*page_size)`, empty outside the valid range
pub fn paginate<T>(records: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= records.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(records.len());
    &records[start..end]
}

/// Filter, sort, then slice the requested page
pub fn rank<T: Rankable + Clone>(records: &[T], state: &RankingState) -> RankedPage<T> {
    let mut filtered = filter_records(records, &state.filter);
    sort_records(&mut filtered, state.sort_field, state.sort_direction);

    let items = paginate(&filtered, state.page, state.page_size)
        .iter()
        .map(|r| T::clone(r))
        .collect();

    RankedPage {
        items,
        page: state.page,
        page_size: state.page_size,
        total_pages: total_pages(filtered.len(), state.page_size),
        filtered_count: filtered.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoverDirection {
    Gainers,
    Losers,
}

/// Records with the largest absolute price change first, at most `limit`
pub fn top_movers<T: Rankable + Clone>(
    records: &[T],
    limit: usize,
    direction: Option<MoverDirection>,
) -> Vec<T> {
    let change = |r: &T| match r.sort_key(SortField::PriceChange) {
        SortKey::Number(n) => n,
        SortKey::Text(_) => 0.0,
    };

    let mut movers: Vec<&T> = records
        .iter()
        .filter(|r| match direction {
            Some(MoverDirection::Gainers) => change(*r) > 0.0,
            Some(MoverDirection::Losers) => change(*r) < 0.0,
            None => true,
        })
        .collect();

    movers.sort_by(|a, b| {
        change(*b)
            .abs()
            .partial_cmp(&change(*a).abs())
            .unwrap_or(Ordering::Equal)
    });

    movers.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetStaticInfo;

    fn record(name: &str, id: u64, tvl: f64, change: f64) -> AssetMetricsRecord {
        let mut r = AssetMetricsRecord::empty(AssetStaticInfo::new(name, AssetId(id)));
        r.trusted_tvl = tvl;
        r.price_change_percent = change;
        r
    }

    fn sample() -> Vec<AssetMetricsRecord> {
        (1..=23)
            .map(|i| record(&format!("Token{}", i), 1000 + i, i as f64 * 10.0, i as f64 - 12.0))
            .collect()
    }

    #[test]
    fn test_toggle_sort_direction() {
        let mut state = RankingState::new(SortField::TrustedTvl, 15);
        assert_eq!(state.sort_direction, SortDirection::Desc);

        state.toggle_sort(SortField::TrustedTvl);
        assert_eq!(state.sort_direction, SortDirection::Asc);

        state.toggle_sort(SortField::Holders);
        assert_eq!(state.sort_field, SortField::Holders);
        assert_eq!(state.sort_direction, SortDirection::Desc);
    }

    #[test]
    fn test_toggle_reverses_order() {
        let records = sample();
        let mut state = RankingState::new(SortField::TrustedTvl, 30);
        let desc = rank(&records, &state);
        assert_eq!(desc.items[0].asset_id, AssetId(1023));

        state.toggle_sort(SortField::TrustedTvl);
        let asc = rank(&records, &state);
        assert_eq!(asc.items[0].asset_id, AssetId(1001));
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let records = sample();
        let filtered = filter_records(&records, "");
        assert_eq!(filtered.len(), records.len());
        assert!(filtered.iter().zip(&records).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_filter_by_name_and_identifier() {
        let records = vec![
            record("Tiny", 2200000000, 0.0, 0.0),
            record("USDC", 31566704, 0.0, 0.0),
            record("goUSD", 672913181, 0.0, 0.0),
        ];
        let by_name: Vec<_> = filter_records(&records, "usd").iter().map(|r| r.asset_id).collect();
        assert_eq!(by_name, vec![AssetId(31566704), AssetId(672913181)]);

        let by_id = filter_records(&records, "315667");
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].name(), "USDC");
    }

    #[test]
    fn test_filter_resets_page() {
        let mut state = RankingState::new(SortField::TrustedTvl, 15);
        state.set_page(2);
        state.set_filter("tok");
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_page_lengths() {
        let records = sample();
        let mut state = RankingState::new(SortField::TrustedTvl, 5);
        let pages = total_pages(records.len(), 5);
        assert_eq!(pages, 5);

        for page in 1..=pages {
            state.set_page(page);
            let ranked = rank(&records, &state);
            let expected = 5.min(records.len() - (page - 1) * 5);
            assert_eq!(ranked.items.len(), expected);
        }
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let records = sample();
        assert!(paginate(&records, 0, 15).is_empty());
        assert!(paginate(&records, 3, 15).is_empty());
        assert_eq!(paginate(&records, 2, 15).len(), 8);
        assert_eq!(total_pages(0, 15), 0);
    }

    #[test]
    fn test_total_pages_with_huge_page_size() {
        assert_eq!(total_pages(23, usize::MAX), 1);
        assert_eq!(total_pages(usize::MAX, usize::MAX), 1);
        assert_eq!(total_pages(23, 0), 0);
    }

    #[test]
    fn test_page_navigation_flags() {
        let records = sample();
        let mut state = RankingState::new(SortField::TrustedTvl, 15);

        let first = rank(&records, &state);
        assert!(first.has_next());
        assert!(!first.has_previous());

        state.set_page(2);
        let last = rank(&records, &state);
        assert!(!last.has_next());
        assert!(last.has_previous());
    }

    #[test]
    fn test_missing_values_sort_as_zero() {
        let mut with_value = record("A", 1, 0.0, 0.0);
        with_value.usd_value = Some(-5.0);
        let without_value = record("B", 2, 0.0, 0.0);
        let mut nan_value = record("C", 3, 0.0, 0.0);
        nan_value.usd_value = Some(f64::NAN);

        let mut records = vec![with_value, without_value, nan_value];
        sort_records(&mut records, SortField::UsdValue, SortDirection::Asc);
        assert_eq!(records[0].asset_id, AssetId(1));
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let mut records = vec![record("beta", 1, 0.0, 0.0), record("Alpha", 2, 0.0, 0.0)];
        sort_records(&mut records, SortField::Name, SortDirection::Asc);
        assert_eq!(records[0].name(), "Alpha");
    }

    #[test]
    fn test_top_movers() {
        let records = vec![
            record("A", 1, 0.0, 3.0),
            record("B", 2, 0.0, -40.0),
            record("C", 3, 0.0, 12.0),
            record("D", 4, 0.0, 0.0),
        ];
        let ids = |v: Vec<AssetMetricsRecord>| v.iter().map(|r| r.asset_id.0).collect::<Vec<_>>();

        assert_eq!(ids(top_movers(&records, 2, None)), vec![2, 3]);
        assert_eq!(ids(top_movers(&records, 25, Some(MoverDirection::Gainers))), vec![3, 1]);
        assert_eq!(ids(top_movers(&records, 25, Some(MoverDirection::Losers))), vec![2]);
    }

    #[test]
    fn test_parse_sort_field() {
        assert_eq!("trustedTVL".parse::<SortField>().unwrap(), SortField::TrustedTvl);
        assert_eq!("price_change".parse::<SortField>().unwrap(), SortField::PriceChange);
        assert!("volume".parse::<SortField>().is_err());
    }
}
