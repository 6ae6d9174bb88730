//! Price trend of a ticker with the user's purchases marked on it.

use crate::core::price::{HistoricalPeriod, PricePoint};
use crate::core::transaction::Transaction;

#[derive(Debug, Clone, PartialEq)]
pub struct BuyMarker {
    pub point: PricePoint,
    pub shares: f64,
    pub price_paid: f64,
}

#[derive(Debug, Clone)]
pub struct Trend {
    pub ticker: String,
    pub period: HistoricalPeriod,
    pub series: Vec<PricePoint>,
    pub buys: Vec<BuyMarker>,
}

impl Trend {
    pub fn first_close(&self) -> Option<f64> {
        self.series.first().map(|p| p.close)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.series.last().map(|p| p.close)
    }

    /// Percent change from the first to the last close of the series.
    pub fn change_pct(&self) -> Option<f64> {
        match (self.first_close(), self.last_close()) {
            (Some(first), Some(last)) if first != 0.0 => Some((last - first) / first * 100.0),
            _ => None,
        }
    }

    pub fn low(&self) -> Option<&PricePoint> {
        self.series.iter().min_by(|a, b| a.close.total_cmp(&b.close))
    }

    pub fn high(&self) -> Option<&PricePoint> {
        self.series.iter().max_by(|a, b| a.close.total_cmp(&b.close))
    }
}

/// Builds the trend for `ticker`. Purchases are marked at the close of their trading
/// day when that day lies inside the series; other purchases are left out.
pub fn trend(
    ticker: &str,
    period: HistoricalPeriod,
    mut series: Vec<PricePoint>,
    transactions: &[Transaction],
) -> Trend {
    series.sort_by_key(|p| p.date);

    let buys = match (series.first(), series.last()) {
        (Some(start), Some(end)) => transactions
            .iter()
            .filter(|t| t.ticker == ticker && t.date >= start.date && t.date <= end.date)
            .filter_map(|t| {
                series.iter().find(|p| p.date == t.date).map(|p| BuyMarker {
                    point: *p,
                    shares: t.shares,
                    price_paid: t.price_paid,
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    Trend {
        ticker: ticker.to_string(),
        period,
        series,
        buys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_marks_purchases_on_trading_days() {
        let series = vec![
            PricePoint { date: day(5), close: 12.0 },
            PricePoint { date: day(4), close: 10.0 },
            PricePoint { date: day(7), close: 15.0 },
        ];
        let transactions = vec![
            Transaction::new("A", "AAA", 1.0, 9.5, day(4)).unwrap(),
            // weekend, no close
            Transaction::new("A", "AAA", 1.0, 11.0, day(6)).unwrap(),
            // outside window
            Transaction::new("A", "AAA", 1.0, 8.0, day(1)).unwrap(),
            Transaction::new("B", "BBB", 1.0, 8.0, day(5)).unwrap(),
        ];

        let trend = trend("AAA", HistoricalPeriod::OneMonth, series, &transactions);
        assert_eq!(trend.series[0].date, day(4));
        assert_eq!(trend.buys.len(), 1);
        assert_eq!(trend.buys[0].point.close, 10.0);
        assert_eq!(trend.buys[0].price_paid, 9.5);
        assert_eq!(trend.change_pct(), Some(50.0));
        assert_eq!(trend.high().unwrap().date, day(7));
        assert_eq!(trend.low().unwrap().date, day(4));
    }

    #[test]
    fn test_empty_series() {
        let trend = trend("AAA", HistoricalPeriod::Max, vec![], &[]);
        assert!(trend.buys.is_empty());
        assert_eq!(trend.change_pct(), None);
    }
}
