use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::core::price::{HistoricalPeriod, PricePoint, PriceProvider};
use crate::providers::util::{get_json, http_client, redact};

// Free plans cap a page at 1000 rows, about four years of trading days.
const PAGE_LIMIT: usize = 1000;
const MAX_PAGES: usize = 20;

/// Secondary price source backed by the Marketstack end-of-day API.
pub struct MarketstackProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl MarketstackProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(MarketstackProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client()?,
        })
    }

    async fn fetch_page(
        &self,
        ticker: &str,
        date_from: Option<NaiveDate>,
        limit: usize,
        offset: usize,
    ) -> Result<EodResponse> {
        let mut url = format!(
            "{}/v1/eod?access_key={}&symbols={}&limit={}&offset={}",
            self.base_url, self.api_key, ticker, limit, offset
        );
        if let Some(from) = date_from {
            url.push_str(&format!("&date_from={}", from.format("%Y-%m-%d")));
        }
        debug!("Requesting end of day prices from {}", redact(&url));
        get_json(&self.client, &url, ticker).await
    }

    /// Walks result pages until `pagination.total` rows are read. Only the first
    /// page is fetched when `paginate` is false.
    async fn fetch_eod(
        &self,
        ticker: &str,
        date_from: Option<NaiveDate>,
        limit: usize,
        paginate: bool,
    ) -> Result<Vec<PricePoint>> {
        let mut points = Vec::new();
        let mut offset = 0;
        for page_number in 1.. {
            let page = self.fetch_page(ticker, date_from, limit, offset).await?;
            let rows = page.data.len();
            offset += rows;
            points.extend(page.data.into_iter().filter_map(EodBar::into_point));

            let total = page.pagination.and_then(|p| p.total).unwrap_or(offset);
            if !paginate || rows == 0 || offset >= total {
                break;
            }
            if page_number >= MAX_PAGES {
                warn!(
                    "Stopped after {} pages of {} prices ({} of {} rows)",
                    page_number, ticker, offset, total
                );
                break;
            }
        }

        if points.is_empty() {
            return Err(anyhow!("No price data found for symbol: {}", ticker));
        }
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

#[derive(Deserialize, Debug)]
struct EodResponse {
    pagination: Option<Pagination>,
    #[serde(default)]
    data: Vec<EodBar>,
}

#[derive(Deserialize, Debug)]
struct Pagination {
    total: Option<usize>,
}

#[derive(Deserialize, Debug)]
struct EodBar {
    date: String,
    close: Option<f64>,
}

impl EodBar {
    fn into_point(self) -> Option<PricePoint> {
        let close = self.close.filter(|c| c.is_finite())?;
        Some(PricePoint {
            date: parse_date(&self.date)?,
            close,
        })
    }
}

/// Marketstack dates look like `2024-01-02T00:00:00+0000`.
fn parse_date(value: &str) -> Option<NaiveDate> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok())
}

#[async_trait]
impl PriceProvider for MarketstackProvider {
    fn name(&self) -> &str {
        "Marketstack"
    }

    #[instrument(name = "MarketstackPriceFetch", skip(self), fields(ticker = %ticker))]
    async fn latest_close(&self, ticker: &str) -> Result<f64> {
        let points = self.fetch_eod(ticker, None, 1, false).await?;
        points
            .last()
            .map(|p| p.close)
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", ticker))
    }

    #[instrument(name = "MarketstackHistoryFetch", skip(self), fields(ticker = %ticker, period = %period))]
    async fn history(&self, ticker: &str, period: HistoricalPeriod) -> Result<Vec<PricePoint>> {
        let today = Local::now().date_naive();
        self.fetch_eod(ticker, period.start_date(today), PAGE_LIMIT, true)
            .await
    }
}
