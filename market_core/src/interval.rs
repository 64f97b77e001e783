use crate::{MarketError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HOUR_SECONDS: i64 = 60 * 60;
const DAY_SECONDS: i64 = 24 * HOUR_SECONDS;

/// Price-change window selectable in the ranking views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PriceInterval {
    #[default]
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "7D")]
    SevenDays,
    #[serde(rename = "30D")]
    ThirtyDays,
}

impl PriceInterval {
    pub const ALL: [PriceInterval; 3] = [
        PriceInterval::OneDay,
        PriceInterval::SevenDays,
        PriceInterval::ThirtyDays,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PriceInterval::OneDay => "1D",
            PriceInterval::SevenDays => "7D",
            PriceInterval::ThirtyDays => "30D",
        }
    }

    /// Candle bucket width: hourly candles for a day, daily candles otherwise
    pub fn candle_interval_seconds(self) -> i64 {
        match self {
            PriceInterval::OneDay => HOUR_SECONDS,
            PriceInterval::SevenDays | PriceInterval::ThirtyDays => DAY_SECONDS,
        }
    }

    pub fn lookback_seconds(self) -> i64 {
        match self {
            PriceInterval::OneDay => DAY_SECONDS,
            PriceInterval::SevenDays => 7 * DAY_SECONDS,
            PriceInterval::ThirtyDays => 30 * DAY_SECONDS,
        }
    }

    /// `(start, end)` unix seconds of the lookback window ending at `now`
    pub fn window_ending_at(self, now: DateTime<Utc>) -> (i64, i64) {
        let start = now - Duration::seconds(self.lookback_seconds());
        (start.timestamp(), now.timestamp())
    }
}

impl fmt::Display for PriceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PriceInterval {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(PriceInterval::OneDay),
            "7D" => Ok(PriceInterval::SevenDays),
            "30D" => Ok(PriceInterval::ThirtyDays),
            _ => Err(MarketError::InvalidInterval(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_intervals_map_to_distinct_pairs() {
        let pairs: Vec<(i64, i64)> = PriceInterval::ALL
            .iter()
            .map(|i| (i.candle_interval_seconds(), i.lookback_seconds()))
            .collect();
        assert_eq!(pairs[0], (3600, 86400));
        assert_eq!(pairs[1], (86400, 604800));
        assert_eq!(pairs[2], (86400, 2592000));
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("7d".parse::<PriceInterval>().unwrap(), PriceInterval::SevenDays);
        assert_eq!(PriceInterval::ThirtyDays.to_string(), "30D");
        assert!("2W".parse::<PriceInterval>().is_err());
    }

    #[test]
    fn test_window() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let (start, end) = PriceInterval::OneDay.window_ending_at(now);
        assert_eq!(end - start, 86400);
        assert_eq!(end, 1_700_000_000);
    }
}
