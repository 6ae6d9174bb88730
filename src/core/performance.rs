//! Joins transactions with resolved prices into profit and loss figures.
use crate::core::transaction::Transaction;
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::*};
use rust_finprim::rate::cagr;
use std::collections::HashMap;
use tracing::debug;

/// Performance of a single purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRow {
    pub stock: String,
    pub ticker: String,
    pub shares: f64,
    pub price_paid: f64,
    /// Resolved market price, or the price paid when no provider answered.
    pub live_price: f64,
    pub price_resolved: bool,
    pub invested: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    /// Compound annual growth since purchase, in percent. Only for holdings of a
    /// year or longer.
    pub annualized_return: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceTotals {
    pub invested: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
}

/// Share of the portfolio's current value held in one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub ticker: String,
    pub current_value: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioPerformance {
    pub rows: Vec<PerformanceRow>,
    pub totals: PerformanceTotals,
    pub allocation: Vec<Allocation>,
}

/// Profit or loss as a percentage of the invested amount; 0 when nothing was
/// invested.
pub fn percent_of(profit_loss: f64, invested: f64) -> f64 {
    if invested == 0.0 {
        0.0
    } else {
        profit_loss / invested * 100.0
    }
}

/// Computes per-transaction and aggregate performance.
///
/// `prices` maps tickers to resolved prices; a missing entry or `None` means the
/// ticker could not be priced and the purchase price is used instead, leaving that
/// position at zero profit.
pub fn compute(
    transactions: &[Transaction],
    prices: &HashMap<String, Option<f64>>,
    as_of: NaiveDate,
) -> PortfolioPerformance {
    let mut performance = PortfolioPerformance::default();

    for t in transactions {
        let resolved = prices.get(&t.ticker).copied().flatten();
        let live_price = resolved.unwrap_or(t.price_paid);
        let invested = t.invested();
        let current_value = t.shares * live_price;
        let profit_loss = current_value - invested;

        let annualized_return = match annualized_return(invested, current_value, t.date, as_of)
        {
            Ok(r) => r,
            Err(e) => {
                debug!("Annualized return unavailable for {}: {}", t.ticker, e);
                None
            }
        };

        performance.totals.invested += invested;
        performance.totals.current_value += current_value;

        performance.rows.push(PerformanceRow {
            stock: t.stock.clone(),
            ticker: t.ticker.clone(),
            shares: t.shares,
            price_paid: t.price_paid,
            live_price,
            price_resolved: resolved.is_some(),
            invested,
            current_value,
            profit_loss,
            profit_loss_pct: percent_of(profit_loss, invested),
            annualized_return,
        });
    }

    let totals = &mut performance.totals;
    totals.profit_loss = totals.current_value - totals.invested;
    totals.profit_loss_pct = percent_of(totals.profit_loss, totals.invested);

    performance.allocation = allocation(&performance.rows, performance.totals.current_value);
    performance
}

fn allocation(rows: &[PerformanceRow], total: f64) -> Vec<Allocation> {
    let mut allocation: Vec<Allocation> = Vec::new();
    for row in rows {
        match allocation.iter_mut().find(|a| a.ticker == row.ticker) {
            Some(existing) => existing.current_value += row.current_value,
            None => allocation.push(Allocation {
                ticker: row.ticker.clone(),
                current_value: row.current_value,
                weight: 0.0,
            }),
        }
    }
    if total > 0.0 {
        for a in &mut allocation {
            a.weight = a.current_value / total * 100.0;
        }
    }
    allocation
}

fn annualized_return(
    invested: f64,
    current_value: f64,
    purchased: NaiveDate,
    as_of: NaiveDate,
) -> Result<Option<f64>> {
    let days_held = (as_of - purchased).num_days();
    if days_held < 365 || invested <= 0.0 || current_value <= 0.0 {
        return Ok(None);
    }

    let begin_bal = Decimal::from_f64(invested).ok_or_else(|| anyhow!("Invalid invested amount"))?;
    let end_bal =
        Decimal::from_f64(current_value).ok_or_else(|| anyhow!("Invalid current value"))?;
    let n_years = Decimal::from_f64(days_held as f64 / 365.0)
        .ok_or_else(|| anyhow!("Invalid holding period"))?;

    let rate = cagr(begin_bal, end_bal, n_years);
    let percentage = (rate * Decimal::from(100))
        .to_f64()
        .ok_or_else(|| anyhow!("CAGR percentage conversion failed"))?;
    debug!("cagr: {begin_bal}, {end_bal}, {n_years} = {rate}, {percentage}");
    Ok(Some(percentage))
}
