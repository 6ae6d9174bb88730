//! Terminal presentation of the core results.

pub mod rate;
pub mod risk;
pub mod setup;
pub mod summary;
pub mod transactions;
pub mod trend;
pub mod ui;

use crate::core::price::{HistoricalPeriod, PricePoint};
use crate::core::resolver::{PriceResolver, ProviderWarning};
use anyhow::{Result, bail};

/// Resolves daily history or fails once every provider has. Provider failures are
/// collected into `warnings` either way.
pub(crate) async fn fetch_history(
    resolver: &PriceResolver,
    ticker: &str,
    period: HistoricalPeriod,
    warnings: &mut Vec<ProviderWarning>,
) -> Result<Vec<PricePoint>> {
    if ticker.trim().is_empty() {
        bail!("Ticker must not be empty");
    }
    let resolved = resolver.resolve_history(ticker, period).await;
    warnings.extend(resolved.warnings);
    match resolved.value {
        Some(history) => Ok(history),
        None => {
            ui::print_warnings(warnings);
            bail!("No price history available for {} ({})", ticker, period)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_blank_tickers_are_rejected_before_resolving() {
        let resolver = PriceResolver::new(Vec::new());
        let mut warnings = Vec::new();

        let err = fetch_history(&resolver, " ", HistoricalPeriod::OneYear, &mut warnings)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Ticker must not be empty");

        let err = risk::run(&resolver, "AAPL", "", HistoricalPeriod::OneYear)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Ticker must not be empty");
        let err = risk::run(&resolver, "  ", "SPY", HistoricalPeriod::OneYear)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Ticker must not be empty");

        let store = MemoryStore::new();
        let err = trend::run(&store, &resolver, "", HistoricalPeriod::OneMonth, "USD")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Ticker must not be empty");
    }
}
