//! Fundamental rating: maps value and quality ratios through fixed score bands and
//! combines the subtotals into a categorical rating.

use crate::core::fundamentals::{self, Fundamentals, FundamentalsProvider};
use crate::core::resolver::ProviderWarning;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatioGroup {
    Value,
    Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Ratio {
    PriceToEarnings,
    PriceToBook,
    PriceEarningsToGrowth,
    PriceToFreeCashFlow,
    EvToEbitda,
    EarningsYield,
    ReturnOnEquity,
    ReturnOnAssets,
    OperatingMargin,
    GrossMargin,
    DebtToEquity,
    InterestCoverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

/// A score band: values beyond `threshold` (strictly) earn `score`.
type Band = (f64, u8);

const PE_BANDS: &[Band] = &[(15.0, 5), (25.0, 4), (35.0, 3), (50.0, 2), (75.0, 1)];
const PB_BANDS: &[Band] = &[(1.0, 5), (2.0, 4), (3.0, 3), (5.0, 2), (7.0, 1)];
const PEG_BANDS: &[Band] = &[(1.0, 5), (1.5, 4), (2.0, 3), (2.5, 2), (3.0, 1)];
const PFCF_BANDS: &[Band] = &[(10.0, 5), (15.0, 4), (20.0, 3), (30.0, 2), (40.0, 1)];
const EV_EBITDA_BANDS: &[Band] = &[(8.0, 5), (10.0, 4), (15.0, 3), (20.0, 2), (30.0, 1)];
const EARNINGS_YIELD_BANDS: &[Band] = &[(0.08, 5), (0.06, 4), (0.04, 3), (0.02, 2), (0.0, 1)];
const ROE_BANDS: &[Band] = &[(0.2, 5), (0.1, 3), (0.05, 1)];
const ROA_BANDS: &[Band] = &[(0.1, 5), (0.05, 3), (0.02, 1)];
const OPERATING_MARGIN_BANDS: &[Band] = &[(0.2, 5), (0.1, 3), (0.05, 1)];
const GROSS_MARGIN_BANDS: &[Band] = &[(0.5, 5), (0.3, 3), (0.1, 1)];
const DEBT_TO_EQUITY_BANDS: &[Band] = &[(50.0, 5), (100.0, 3), (200.0, 1)];
const INTEREST_COVERAGE_BANDS: &[Band] = &[(10.0, 5), (5.0, 3), (2.0, 1)];

pub const VALUE_RATIOS: [Ratio; 6] = [
    Ratio::PriceToEarnings,
    Ratio::PriceToBook,
    Ratio::PriceEarningsToGrowth,
    Ratio::PriceToFreeCashFlow,
    Ratio::EvToEbitda,
    Ratio::EarningsYield,
];

pub const QUALITY_RATIOS: [Ratio; 6] = [
    Ratio::ReturnOnEquity,
    Ratio::ReturnOnAssets,
    Ratio::OperatingMargin,
    Ratio::GrossMargin,
    Ratio::DebtToEquity,
    Ratio::InterestCoverage,
];

impl Ratio {
    pub fn group(&self) -> RatioGroup {
        if VALUE_RATIOS.contains(self) {
            RatioGroup::Value
        } else {
            RatioGroup::Quality
        }
    }

    fn direction(&self) -> Direction {
        match self {
            Ratio::EarningsYield
            | Ratio::ReturnOnEquity
            | Ratio::ReturnOnAssets
            | Ratio::OperatingMargin
            | Ratio::GrossMargin
            | Ratio::InterestCoverage => Direction::HigherIsBetter,
            Ratio::PriceToEarnings
            | Ratio::PriceToBook
            | Ratio::PriceEarningsToGrowth
            | Ratio::PriceToFreeCashFlow
            | Ratio::EvToEbitda
            | Ratio::DebtToEquity => Direction::LowerIsBetter,
        }
    }

    fn bands(&self) -> &'static [Band] {
        match self {
            Ratio::PriceToEarnings => PE_BANDS,
            Ratio::PriceToBook => PB_BANDS,
            Ratio::PriceEarningsToGrowth => PEG_BANDS,
            Ratio::PriceToFreeCashFlow => PFCF_BANDS,
            Ratio::EvToEbitda => EV_EBITDA_BANDS,
            Ratio::EarningsYield => EARNINGS_YIELD_BANDS,
            Ratio::ReturnOnEquity => ROE_BANDS,
            Ratio::ReturnOnAssets => ROA_BANDS,
            Ratio::OperatingMargin => OPERATING_MARGIN_BANDS,
            Ratio::GrossMargin => GROSS_MARGIN_BANDS,
            Ratio::DebtToEquity => DEBT_TO_EQUITY_BANDS,
            Ratio::InterestCoverage => INTEREST_COVERAGE_BANDS,
        }
    }

    /// Score in 0..=5 for a raw ratio value.
    pub fn score(&self, value: f64) -> u8 {
        let direction = self.direction();
        self.bands()
            .iter()
            .find(|(threshold, _)| match direction {
                Direction::LowerIsBetter => value < *threshold,
                Direction::HigherIsBetter => value > *threshold,
            })
            .map_or(0, |(_, score)| *score)
    }

    /// Computes the ratio from raw inputs. Derived ratios require every operand to
    /// be present and non-zero.
    pub fn compute(&self, f: &Fundamentals) -> Option<f64> {
        match self {
            Ratio::PriceToEarnings => f.trailing_pe,
            Ratio::PriceToBook => f.price_to_book,
            Ratio::PriceEarningsToGrowth => divide(f.trailing_pe, f.earnings_growth),
            Ratio::PriceToFreeCashFlow => {
                let free_cash_flow = match (f.operating_cash_flow, f.capital_expenditure) {
                    (Some(ocf), Some(capex)) => Some(ocf + capex),
                    _ => None,
                };
                divide(f.market_cap, free_cash_flow)
            }
            Ratio::EvToEbitda => divide(f.enterprise_value, f.ebitda),
            Ratio::EarningsYield => divide(Some(1.0), f.trailing_pe),
            Ratio::ReturnOnEquity => f.return_on_equity,
            Ratio::ReturnOnAssets => f.return_on_assets,
            Ratio::OperatingMargin => f.operating_margin,
            Ratio::GrossMargin => f.gross_margin,
            Ratio::DebtToEquity => f.debt_to_equity,
            Ratio::InterestCoverage => divide(f.ebit, f.interest_expense).map(f64::abs),
        }
        .filter(|v| v.is_finite())
    }
}

fn divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if n != 0.0 && d != 0.0 => Some(n / d),
        _ => None,
    }
}

impl Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Ratio::PriceToEarnings => "P/E Ratio",
                Ratio::PriceToBook => "P/B Ratio",
                Ratio::PriceEarningsToGrowth => "PEG Ratio",
                Ratio::PriceToFreeCashFlow => "Price to FCF",
                Ratio::EvToEbitda => "EV/EBITDA",
                Ratio::EarningsYield => "Earnings Yield",
                Ratio::ReturnOnEquity => "ROE",
                Ratio::ReturnOnAssets => "ROA",
                Ratio::OperatingMargin => "Operating Margin",
                Ratio::GrossMargin => "Gross Margin",
                Ratio::DebtToEquity => "Debt to Equity",
                Ratio::InterestCoverage => "Interest Coverage Ratio",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum RatingLabel {
    Sell,
    Hold,
    Buy,
    StrongBuy,
    VeryStrongBuy,
}

impl RatingLabel {
    pub fn from_total(total: u32) -> Self {
        match total {
            45.. => RatingLabel::VeryStrongBuy,
            35..=44 => RatingLabel::StrongBuy,
            25..=34 => RatingLabel::Buy,
            15..=24 => RatingLabel::Hold,
            _ => RatingLabel::Sell,
        }
    }

    pub fn from_subtotals(value_score: u32, quality_score: u32) -> Self {
        Self::from_total(value_score + quality_score)
    }
}

impl Display for RatingLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RatingLabel::Sell => "Sell",
                RatingLabel::Hold => "Hold",
                RatingLabel::Buy => "Buy",
                RatingLabel::StrongBuy => "Strong Buy",
                RatingLabel::VeryStrongBuy => "Very Strong Buy",
            }
        )
    }
}

/// Rating of one ticker. Ratios that could not be computed appear in neither map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingResult {
    pub ticker: String,
    pub ratios: BTreeMap<Ratio, f64>,
    pub scores: BTreeMap<Ratio, u8>,
    pub value_score: u32,
    pub quality_score: u32,
    pub label: RatingLabel,
}

impl RatingResult {
    pub fn total(&self) -> u32 {
        self.value_score + self.quality_score
    }

    pub fn subtotal(&self, group: RatioGroup) -> u32 {
        self.scores
            .iter()
            .filter(|(ratio, _)| ratio.group() == group)
            .map(|(_, score)| u32::from(*score))
            .sum()
    }
}

/// Rates a ticker from its raw fundamentals.
pub fn rate_fundamentals(ticker: &str, fundamentals: &Fundamentals) -> RatingResult {
    let mut ratios = BTreeMap::new();
    let mut scores = BTreeMap::new();

    for ratio in VALUE_RATIOS.iter().chain(QUALITY_RATIOS.iter()) {
        if let Some(value) = ratio.compute(fundamentals) {
            let score = ratio.score(value);
            debug!("{ticker}: {ratio} = {value} -> {score}");
            ratios.insert(*ratio, value);
            scores.insert(*ratio, score);
        }
    }

    let mut result = RatingResult {
        ticker: ticker.to_string(),
        ratios,
        scores,
        value_score: 0,
        quality_score: 0,
        label: RatingLabel::Sell,
    };
    result.value_score = result.subtotal(RatioGroup::Value);
    result.quality_score = result.subtotal(RatioGroup::Quality);
    result.label = RatingLabel::from_subtotals(result.value_score, result.quality_score);
    result
}

/// A rating together with the raw inputs and provider failures behind it.
#[derive(Debug, Clone)]
pub struct RatingReport {
    pub rating: RatingResult,
    pub fundamentals: Fundamentals,
    pub sources: Vec<String>,
    pub warnings: Vec<ProviderWarning>,
}

pub struct RatingEngine {
    sources: Vec<Arc<dyn FundamentalsProvider>>,
}

impl RatingEngine {
    /// `sources` are consulted in order: the first is primary, the rest only fill
    /// fields the primary left empty.
    pub fn new(sources: Vec<Arc<dyn FundamentalsProvider>>) -> Self {
        Self { sources }
    }

    #[instrument(name = "RateTicker", skip(self))]
    pub async fn rate(&self, ticker: &str) -> Result<RatingReport> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            bail!("Ticker must not be empty");
        }

        let gathered = fundamentals::gather(&self.sources, &ticker).await;
        let rating = rate_fundamentals(&ticker, &gathered.fundamentals);
        Ok(RatingReport {
            rating,
            fundamentals: gathered.fundamentals,
            sources: gathered.sources,
            warnings: gathered.warnings,
        })
    }
}
