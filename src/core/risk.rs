//! Risk metrics of a ticker against a benchmark, from daily closes.

use crate::core::price::{HistoricalPeriod, PricePoint};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub drawdown: f64,
}

#[derive(Debug, Clone)]
pub struct RiskMetrics {
    pub ticker: String,
    pub benchmark: String,
    pub period: HistoricalPeriod,
    /// Number of daily returns the metrics were computed from.
    pub observations: usize,
    pub volatility: f64,
    /// `None` when returns have no dispersion.
    pub sharpe_ratio: Option<f64>,
    /// `None` when the benchmark returns have no dispersion.
    pub beta: Option<f64>,
    pub max_drawdown: f64,
    pub drawdowns: Vec<DrawdownPoint>,
}

/// Keeps only the dates present in both series, oldest first.
pub fn align(series: &[PricePoint], benchmark: &[PricePoint]) -> Vec<(NaiveDate, f64, f64)> {
    let benchmark_by_date: HashMap<NaiveDate, f64> =
        benchmark.iter().map(|p| (p.date, p.close)).collect();
    let mut aligned: Vec<_> = series
        .iter()
        .filter_map(|p| benchmark_by_date.get(&p.date).map(|b| (p.date, p.close, *b)))
        .collect();
    aligned.sort_by_key(|(date, _, _)| *date);
    aligned.dedup_by_key(|(date, _, _)| *date);
    aligned
}

/// Percent change between consecutive closes; one shorter than the input.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population covariance.
fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let (mean_a, mean_b) = (mean(a), mean(b));
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / a.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    covariance(values, values).sqrt()
}

/// Drawdown of the compounded return series against its running peak.
pub fn drawdown_series(returns: &[f64]) -> Vec<f64> {
    let mut cumulative = 1.0;
    let mut peak = f64::MIN;
    returns
        .iter()
        .map(|r| {
            cumulative *= 1.0 + r;
            peak = peak.max(cumulative);
            (cumulative - peak) / peak
        })
        .collect()
}

/// Risk of `series` against `benchmark_series` over their common dates. Beta is
/// the population covariance of daily returns over the benchmark's population
/// variance, both with an `n` denominator, not the sample covariance.
pub fn analyze(
    ticker: &str,
    benchmark: &str,
    period: HistoricalPeriod,
    series: &[PricePoint],
    benchmark_series: &[PricePoint],
) -> Result<RiskMetrics> {
    let aligned = align(series, benchmark_series);
    if aligned.len() < 2 {
        bail!(
            "Not enough overlapping price history for {} and {} ({} common days)",
            ticker,
            benchmark,
            aligned.len()
        );
    }

    let closes: Vec<f64> = aligned.iter().map(|(_, c, _)| *c).collect();
    let benchmark_closes: Vec<f64> = aligned.iter().map(|(_, _, b)| *b).collect();
    if closes.iter().chain(&benchmark_closes).any(|c| *c <= 0.0) {
        bail!("Price history for {} or {} holds non-positive closes", ticker, benchmark);
    }

    let returns = daily_returns(&closes);
    let benchmark_returns = daily_returns(&benchmark_closes);
    debug!("{} aligned returns for {} vs {}", returns.len(), ticker, benchmark);

    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();
    let sd = std_dev(&returns);
    let volatility = sd * annualizer;
    let sharpe_ratio = (sd > 0.0).then(|| mean(&returns) / sd * annualizer);

    let benchmark_variance = covariance(&benchmark_returns, &benchmark_returns);
    let beta = (benchmark_variance > 0.0)
        .then(|| covariance(&returns, &benchmark_returns) / benchmark_variance);

    let drawdowns: Vec<DrawdownPoint> = drawdown_series(&returns)
        .into_iter()
        .zip(aligned.iter().skip(1))
        .map(|(drawdown, (date, _, _))| DrawdownPoint {
            date: *date,
            drawdown,
        })
        .collect();
    let max_drawdown = drawdowns
        .iter()
        .map(|d| d.drawdown)
        .fold(0.0_f64, f64::min);

    Ok(RiskMetrics {
        ticker: ticker.to_string(),
        benchmark: benchmark.to_string(),
        period,
        observations: returns.len(),
        volatility,
        sharpe_ratio,
        beta,
        max_drawdown,
        drawdowns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close: *close,
            })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_daily_returns_drop_first_observation() {
        let returns = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!(approx(returns[0], 0.1));
        assert!(approx(returns[1], -0.1));
    }

    #[test]
    fn test_drawdown_tracks_running_peak() {
        let dd = drawdown_series(&[0.1, -0.1, 0.05]);
        assert!(approx(dd[0], 0.0));
        assert!(approx(dd[1], -0.1));
        assert!(approx(dd[2], 1.0395 / 1.1 - 1.0));
    }

    #[test]
    fn test_metrics_against_identical_benchmark() {
        let closes = [100.0, 102.0, 99.0, 105.0, 103.0];
        let metrics = analyze(
            "AAA",
            "SPY",
            HistoricalPeriod::OneYear,
            &series(&closes),
            &series(&closes),
        )
        .unwrap();

        assert_eq!(metrics.observations, 4);
        assert!(approx(metrics.beta.unwrap(), 1.0));

        let returns = daily_returns(&closes);
        let m = returns.iter().sum::<f64>() / 4.0;
        let var = returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / 4.0;
        assert!(approx(metrics.volatility, var.sqrt() * 252f64.sqrt()));
        assert!(approx(
            metrics.sharpe_ratio.unwrap(),
            m / var.sqrt() * 252f64.sqrt()
        ));
        // peak 102 -> trough 99
        assert!(approx(metrics.max_drawdown, 99.0 / 102.0 - 1.0));
        assert_eq!(metrics.drawdowns.len(), 4);
        assert_eq!(metrics.drawdowns[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_beta_uses_population_moments() {
        let closes = [100.0, 104.0, 100.0, 110.0];
        let benchmark = [100.0, 102.0, 100.0, 105.0];
        let metrics = analyze(
            "AAA",
            "SPY",
            HistoricalPeriod::OneYear,
            &series(&closes),
            &series(&benchmark),
        )
        .unwrap();

        let r = daily_returns(&closes);
        let b = daily_returns(&benchmark);
        let n = r.len() as f64;
        let (mr, mb) = (r.iter().sum::<f64>() / n, b.iter().sum::<f64>() / n);
        let cov = r.iter().zip(&b).map(|(x, y)| (x - mr) * (y - mb)).sum::<f64>() / n;
        let var = b.iter().map(|y| (y - mb).powi(2)).sum::<f64>() / n;
        assert!(approx(metrics.beta.unwrap(), cov / var));
        assert!(!approx(metrics.beta.unwrap(), cov * n / (n - 1.0) / var));
    }

    #[test]
    fn test_flat_series_has_undefined_ratios() {
        let flat = series(&[50.0, 50.0, 50.0]);
        let moving = series(&[10.0, 11.0, 12.0]);

        let metrics = analyze("FLAT", "SPY", HistoricalPeriod::OneYear, &flat, &moving).unwrap();
        assert_eq!(metrics.volatility, 0.0);
        assert!(metrics.sharpe_ratio.is_none());
        assert_eq!(metrics.max_drawdown, 0.0);

        let metrics = analyze("MOVE", "FLAT", HistoricalPeriod::OneYear, &moving, &flat).unwrap();
        assert!(metrics.beta.is_none());
    }

    #[test]
    fn test_only_common_dates_are_used() {
        let mut ticker = series(&[100.0, 101.0, 102.0, 103.0]);
        ticker.remove(1);
        let benchmark = series(&[200.0, 201.0, 202.0, 203.0]);

        let aligned = align(&ticker, &benchmark);
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[1].1, 102.0);
        assert_eq!(aligned[1].2, 202.0);
    }

    #[test]
    fn test_insufficient_history() {
        let one = series(&[100.0]);
        assert!(analyze("AAA", "SPY", HistoricalPeriod::OneDay, &one, &one).is_err());
        assert!(analyze("AAA", "SPY", HistoricalPeriod::OneDay, &[], &one).is_err());
    }
}
