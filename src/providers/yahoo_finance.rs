use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::fundamentals::{Fundamentals, FundamentalsProvider};
use crate::core::price::{HistoricalPeriod, PricePoint, PriceProvider};
use crate::providers::util::{get_json, http_client};

const QUOTE_SUMMARY_MODULES: &str = "defaultKeyStatistics,financialData,summaryDetail,cashflowStatementHistory,incomeStatementHistory";

/// Primary source for prices and fundamentals. Needs no API key.
pub struct YahooFinanceProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client()?,
        })
    }

    async fn fetch_chart(&self, ticker: &str, range: &str) -> Result<PriceChartItem> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range={}",
            self.base_url, ticker, range
        );
        debug!("Requesting price data from {}", url);

        let data: YahooPriceResponse = get_json(&self.client, &url, ticker).await?;
        data.chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", ticker))
    }
}

#[derive(Deserialize, Debug)]
struct YahooPriceResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

impl PriceChartItem {
    /// Daily closes with null bars skipped, oldest first. With `adjusted` the
    /// dividend and split adjusted series is used when the payload carries one.
    fn points(&self, adjusted: bool) -> Vec<PricePoint> {
        let indicators = self.indicators.as_ref();
        let adjusted_closes = indicators
            .filter(|_| adjusted)
            .and_then(|inds| inds.adjclose.as_ref())
            .and_then(|a| a.first())
            .and_then(|a| a.adjclose.as_ref());
        let closes = adjusted_closes.or_else(|| {
            indicators
                .and_then(|inds| inds.quote.first())
                .and_then(|q| q.close.as_ref())
        });
        let (Some(timestamps), Some(closes)) = (self.timestamp.as_ref(), closes) else {
            return Vec::new();
        };

        let mut points: Vec<PricePoint> = timestamps
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let close = (*close).filter(|c| c.is_finite())?;
                Some(PricePoint {
                    date: timestamp_to_date(*ts)?,
                    close,
                })
            })
            .collect();
        points.sort_by_key(|p| p.date);
        points
    }
}

fn timestamp_to_date(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    #[instrument(name = "YahooPriceFetch", skip(self), fields(ticker = %ticker))]
    async fn latest_close(&self, ticker: &str) -> Result<f64> {
        let item = self.fetch_chart(ticker, "5d").await?;
        item.points(false)
            .last()
            .map(|p| p.close)
            .ok_or_else(|| anyhow!("No closing price found for symbol: {}", ticker))
    }

    #[instrument(name = "YahooHistoryFetch", skip(self), fields(ticker = %ticker, period = %period))]
    async fn history(&self, ticker: &str, period: HistoricalPeriod) -> Result<Vec<PricePoint>> {
        let item = self.fetch_chart(ticker, period.yahoo_range()).await?;
        let points = item.points(true);
        if points.is_empty() {
            return Err(anyhow!("No price history found for symbol: {}", ticker));
        }
        debug!("Received {} daily closes", points.len());
        Ok(points)
    }
}

/// A quoteSummary number; Yahoo sends `{}` when the value is unknown.
#[derive(Deserialize, Debug, Default)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Deserialize, Debug)]
struct QuoteSummaryResult {
    result: Option<Vec<QuoteSummaryItem>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct QuoteSummaryItem {
    financial_data: Option<FinancialData>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
    cashflow_statement_history: Option<CashflowHistory>,
    income_statement_history: Option<IncomeHistory>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct FinancialData {
    return_on_equity: Option<RawValue>,
    return_on_assets: Option<RawValue>,
    operating_margins: Option<RawValue>,
    gross_margins: Option<RawValue>,
    debt_to_equity: Option<RawValue>,
    ebitda: Option<RawValue>,
    earnings_growth: Option<RawValue>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    price_to_book: Option<RawValue>,
    enterprise_value: Option<RawValue>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct CashflowHistory {
    cashflow_statements: Vec<CashflowStatement>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct CashflowStatement {
    total_cash_from_operating_activities: Option<RawValue>,
    capital_expenditures: Option<RawValue>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct IncomeHistory {
    income_statement_history: Vec<IncomeStatement>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct IncomeStatement {
    ebit: Option<RawValue>,
    interest_expense: Option<RawValue>,
}

impl From<QuoteSummaryItem> for Fundamentals {
    fn from(item: QuoteSummaryItem) -> Self {
        let financial = item.financial_data.unwrap_or_default();
        let summary = item.summary_detail.unwrap_or_default();
        let stats = item.default_key_statistics.unwrap_or_default();
        let cashflow = item
            .cashflow_statement_history
            .and_then(|h| h.cashflow_statements.into_iter().next())
            .unwrap_or_default();
        let income = item
            .income_statement_history
            .and_then(|h| h.income_statement_history.into_iter().next())
            .unwrap_or_default();

        Fundamentals {
            trailing_pe: raw(&summary.trailing_pe),
            price_to_book: raw(&stats.price_to_book),
            earnings_growth: raw(&financial.earnings_growth),
            market_cap: raw(&summary.market_cap),
            enterprise_value: raw(&stats.enterprise_value),
            ebitda: raw(&financial.ebitda),
            operating_cash_flow: raw(&cashflow.total_cash_from_operating_activities),
            capital_expenditure: raw(&cashflow.capital_expenditures),
            return_on_equity: raw(&financial.return_on_equity),
            return_on_assets: raw(&financial.return_on_assets),
            operating_margin: raw(&financial.operating_margins),
            gross_margin: raw(&financial.gross_margins),
            debt_to_equity: raw(&financial.debt_to_equity),
            ebit: raw(&income.ebit),
            interest_expense: raw(&income.interest_expense),
        }
    }
}

#[async_trait]
impl FundamentalsProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    #[instrument(name = "YahooFundamentalsFetch", skip(self), fields(ticker = %ticker))]
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}",
            self.base_url, ticker, QUOTE_SUMMARY_MODULES
        );
        debug!("Requesting fundamentals from {}", url);

        let data: QuoteSummaryResponse = get_json(&self.client, &url, ticker).await?;
        let item = data
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| anyhow!("No fundamentals found for symbol: {}", ticker))?;

        let fundamentals = Fundamentals::from(item);
        if fundamentals.is_empty() {
            return Err(anyhow!("No fundamentals found for symbol: {}", ticker));
        }
        Ok(fundamentals)
    }
}
