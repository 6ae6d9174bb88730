//! Pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum HistoricalPeriod {
    OneDay,
    OneWeek,
    OneMonth,
    OneYear,
    FiveYears,
    YearToDate,
    Max,
}

impl Display for HistoricalPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                HistoricalPeriod::OneDay => "1D",
                HistoricalPeriod::OneWeek => "1W",
                HistoricalPeriod::OneMonth => "1M",
                HistoricalPeriod::OneYear => "1Y",
                HistoricalPeriod::FiveYears => "5Y",
                HistoricalPeriod::YearToDate => "YTD",
                HistoricalPeriod::Max => "MAX",
            }
        )
    }
}

impl HistoricalPeriod {
    /// First calendar day covered by the period, or `None` for the full history.
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let lookback = match self {
            HistoricalPeriod::OneDay => Duration::days(1),
            HistoricalPeriod::OneWeek => Duration::days(7),
            HistoricalPeriod::OneMonth => Duration::days(30),
            HistoricalPeriod::OneYear => Duration::days(365),
            HistoricalPeriod::FiveYears => Duration::days(365 * 5),
            HistoricalPeriod::YearToDate => {
                return NaiveDate::from_ymd_opt(today.year(), 1, 1);
            }
            HistoricalPeriod::Max => return None,
        };
        Some(today - lookback)
    }

    /// Range token understood by the Yahoo chart endpoint.
    pub fn yahoo_range(&self) -> &'static str {
        match self {
            HistoricalPeriod::OneDay => "1d",
            HistoricalPeriod::OneWeek => "5d",
            HistoricalPeriod::OneMonth => "1mo",
            HistoricalPeriod::OneYear => "1y",
            HistoricalPeriod::FiveYears => "5y",
            HistoricalPeriod::YearToDate => "ytd",
            HistoricalPeriod::Max => "max",
        }
    }
}

impl FromStr for HistoricalPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1D" => Ok(HistoricalPeriod::OneDay),
            "1W" | "7D" => Ok(HistoricalPeriod::OneWeek),
            "1M" => Ok(HistoricalPeriod::OneMonth),
            "1Y" => Ok(HistoricalPeriod::OneYear),
            "5Y" => Ok(HistoricalPeriod::FiveYears),
            "YTD" => Ok(HistoricalPeriod::YearToDate),
            "MAX" => Ok(HistoricalPeriod::Max),
            _ => Err(anyhow::anyhow!("Invalid historical period: {}", s)),
        }
    }
}

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// A source of market prices.
///
/// Implementations return an error when the request fails, the payload cannot be
/// parsed, or it holds no usable rows. They never retry.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short name used in warnings and logs.
    fn name(&self) -> &str;

    /// Most recent daily close for `ticker`.
    async fn latest_close(&self, ticker: &str) -> Result<f64>;

    /// Daily closes covering `period`, oldest first.
    async fn history(&self, ticker: &str, period: HistoricalPeriod) -> Result<Vec<PricePoint>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_round_trips_through_display() {
        for period in [
            HistoricalPeriod::OneDay,
            HistoricalPeriod::OneWeek,
            HistoricalPeriod::OneMonth,
            HistoricalPeriod::OneYear,
            HistoricalPeriod::FiveYears,
            HistoricalPeriod::YearToDate,
            HistoricalPeriod::Max,
        ] {
            assert_eq!(period.to_string().parse::<HistoricalPeriod>().unwrap(), period);
        }
        assert_eq!("ytd".parse::<HistoricalPeriod>().unwrap(), HistoricalPeriod::YearToDate);
        assert!("2Q".parse::<HistoricalPeriod>().is_err());
    }

    #[test]
    fn test_start_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(
            HistoricalPeriod::YearToDate.start_date(today),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            HistoricalPeriod::OneWeek.start_date(today),
            NaiveDate::from_ymd_opt(2024, 6, 8)
        );
        assert_eq!(HistoricalPeriod::Max.start_date(today), None);
    }
}
