//! Raw financial statement inputs used by the rating engine.

use crate::core::resolver::ProviderWarning;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Financial inputs for one ticker. Every field is optional; providers fill what
/// they know and leave the rest as `None`.
///
/// Margins and returns are fractions (0.25 = 25%). Debt to equity is expressed in
/// percent (45.0 = 0.45x), the convention used by Yahoo Finance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub trailing_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ebitda: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    /// Signed negative for cash spent, as reported in cash flow statements.
    pub capital_expenditure: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub operating_margin: Option<f64>,
    pub gross_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub ebit: Option<f64>,
    pub interest_expense: Option<f64>,
}

const FIELD_COUNT: usize = 15;

impl Fundamentals {
    fn fields(&self) -> [Option<f64>; FIELD_COUNT] {
        [
            self.trailing_pe,
            self.price_to_book,
            self.earnings_growth,
            self.market_cap,
            self.enterprise_value,
            self.ebitda,
            self.operating_cash_flow,
            self.capital_expenditure,
            self.return_on_equity,
            self.return_on_assets,
            self.operating_margin,
            self.gross_margin,
            self.debt_to_equity,
            self.ebit,
            self.interest_expense,
        ]
    }

    fn fields_mut(&mut self) -> [&mut Option<f64>; FIELD_COUNT] {
        [
            &mut self.trailing_pe,
            &mut self.price_to_book,
            &mut self.earnings_growth,
            &mut self.market_cap,
            &mut self.enterprise_value,
            &mut self.ebitda,
            &mut self.operating_cash_flow,
            &mut self.capital_expenditure,
            &mut self.return_on_equity,
            &mut self.return_on_assets,
            &mut self.operating_margin,
            &mut self.gross_margin,
            &mut self.debt_to_equity,
            &mut self.ebit,
            &mut self.interest_expense,
        ]
    }

    /// Fills fields that are still `None` from `other`. Present values are never
    /// replaced. Returns how many fields were filled.
    pub fn fill_missing(&mut self, other: &Fundamentals) -> usize {
        let mut filled = 0;
        for (slot, value) in self.fields_mut().into_iter().zip(other.fields()) {
            if slot.is_none() && value.is_some() {
                *slot = value;
                filled += 1;
            }
        }
        filled
    }

    pub fn missing_count(&self) -> usize {
        self.fields().iter().filter(|f| f.is_none()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_count() == 0
    }

    pub fn is_empty(&self) -> bool {
        *self == Fundamentals::default()
    }
}

#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals>;
}

/// Fundamentals gathered across sources, with the failures met on the way.
#[derive(Debug, Clone, Default)]
pub struct GatheredFundamentals {
    pub fundamentals: Fundamentals,
    pub sources: Vec<String>,
    pub warnings: Vec<ProviderWarning>,
}

/// Fetches from the first source, then asks each alternate source once for the
/// fields that are still missing. Alternates are not consulted when the data is
/// already complete.
pub async fn gather(
    sources: &[Arc<dyn FundamentalsProvider>],
    ticker: &str,
) -> GatheredFundamentals {
    let mut gathered = GatheredFundamentals::default();

    for source in sources {
        if !gathered.sources.is_empty() && gathered.fundamentals.is_complete() {
            break;
        }
        match source.fetch_fundamentals(ticker).await {
            Ok(fetched) => {
                let filled = gathered.fundamentals.fill_missing(&fetched);
                debug!("{} filled {} fundamental fields for {}", source.name(), filled, ticker);
                if filled > 0 {
                    gathered.sources.push(source.name().to_string());
                }
            }
            Err(e) => {
                warn!("{} fundamentals failed for {}: {:#}", source.name(), ticker, e);
                gathered.warnings.push(ProviderWarning {
                    provider: source.name().to_string(),
                    ticker: ticker.to_string(),
                    message: format!("{e:#}"),
                });
            }
        }
    }

    gathered
}
