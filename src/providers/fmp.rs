use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::fundamentals::{Fundamentals, FundamentalsProvider};
use crate::core::price::{HistoricalPeriod, PricePoint, PriceProvider};
use crate::providers::util::{get_json, http_client, redact};

/// Financial Modeling Prep: tertiary price source and alternate fundamentals source.
pub struct FmpProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize, Debug)]
struct QuoteShort {
    price: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct HistoricalResponse {
    #[serde(default)]
    historical: Vec<HistoricalBar>,
}

#[derive(Deserialize, Debug)]
struct HistoricalBar {
    date: String,
    close: Option<f64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Profile {
    mkt_cap: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct RatiosTtm {
    #[serde(rename = "peRatioTTM")]
    pe_ratio: Option<f64>,
    #[serde(rename = "priceToBookRatioTTM")]
    price_to_book: Option<f64>,
    #[serde(rename = "returnOnEquityTTM")]
    return_on_equity: Option<f64>,
    #[serde(rename = "returnOnAssetsTTM")]
    return_on_assets: Option<f64>,
    #[serde(rename = "operatingProfitMarginTTM")]
    operating_margin: Option<f64>,
    #[serde(rename = "grossProfitMarginTTM")]
    gross_margin: Option<f64>,
    #[serde(rename = "debtEquityRatioTTM")]
    debt_to_equity: Option<f64>,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl FmpProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(FmpProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client()?,
        })
    }

    fn url(&self, endpoint: &str, ticker: &str, query: &str) -> String {
        format!(
            "{}/api/v3/{}/{}?{}apikey={}",
            self.base_url, endpoint, ticker, query, self.api_key
        )
    }

    async fn fetch_profile(&self, ticker: &str) -> Result<Option<Profile>> {
        let url = self.url("profile", ticker, "");
        debug!("Requesting profile from {}", redact(&url));
        let profiles: Vec<Profile> = get_json(&self.client, &url, ticker).await?;
        Ok(profiles.into_iter().next())
    }

    async fn fetch_ratios(&self, ticker: &str) -> Result<Option<RatiosTtm>> {
        let url = self.url("ratios-ttm", ticker, "");
        debug!("Requesting ratios from {}", redact(&url));
        let ratios: Vec<RatiosTtm> = get_json(&self.client, &url, ticker).await?;
        Ok(ratios.into_iter().next())
    }
}

#[async_trait]
impl PriceProvider for FmpProvider {
    fn name(&self) -> &str {
        "Financial Modeling Prep"
    }

    #[instrument(name = "FmpPriceFetch", skip(self), fields(ticker = %ticker))]
    async fn latest_close(&self, ticker: &str) -> Result<f64> {
        let url = self.url("quote-short", ticker, "");
        debug!("Requesting quote from {}", redact(&url));
        let quotes: Vec<QuoteShort> = get_json(&self.client, &url, ticker).await?;
        quotes
            .into_iter()
            .find_map(|q| finite(q.price))
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", ticker))
    }

    #[instrument(name = "FmpHistoryFetch", skip(self), fields(ticker = %ticker, period = %period))]
    async fn history(&self, ticker: &str, period: HistoricalPeriod) -> Result<Vec<PricePoint>> {
        let query = period
            .start_date(Local::now().date_naive())
            .map(|from| format!("from={}&", from.format("%Y-%m-%d")))
            .unwrap_or_default();
        let url = self.url("historical-price-full", ticker, &query);
        debug!("Requesting price history from {}", redact(&url));

        let response: HistoricalResponse = get_json(&self.client, &url, ticker).await?;
        let mut points: Vec<PricePoint> = response
            .historical
            .into_iter()
            .filter_map(|bar| {
                Some(PricePoint {
                    date: NaiveDate::parse_from_str(&bar.date, "%Y-%m-%d").ok()?,
                    close: finite(bar.close)?,
                })
            })
            .collect();
        if points.is_empty() {
            return Err(anyhow!("No price history found for symbol: {}", ticker));
        }
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

#[async_trait]
impl FundamentalsProvider for FmpProvider {
    fn name(&self) -> &str {
        "Financial Modeling Prep"
    }

    #[instrument(name = "FmpFundamentalsFetch", skip(self), fields(ticker = %ticker))]
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals> {
        let profile = self.fetch_profile(ticker).await?;
        let ratios = self.fetch_ratios(ticker).await?.unwrap_or_default();

        let fundamentals = Fundamentals {
            trailing_pe: finite(ratios.pe_ratio),
            price_to_book: finite(ratios.price_to_book),
            market_cap: finite(profile.and_then(|p| p.mkt_cap)),
            return_on_equity: finite(ratios.return_on_equity),
            return_on_assets: finite(ratios.return_on_assets),
            operating_margin: finite(ratios.operating_margin),
            gross_margin: finite(ratios.gross_margin),
            // FMP reports a plain multiple
            debt_to_equity: finite(ratios.debt_to_equity).map(|d| d * 100.0),
            ..Default::default()
        };
        if fundamentals.is_empty() {
            return Err(anyhow!("No fundamentals found for symbol: {}", ticker));
        }
        Ok(fundamentals)
    }
}
