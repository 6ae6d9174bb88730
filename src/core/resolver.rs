//! Ordered fallback across price providers.

use crate::core::price::{HistoricalPeriod, PricePoint, PriceProvider};
use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A provider that failed while resolving a value.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderWarning {
    pub provider: String,
    pub ticker: String,
    pub message: String,
}

impl std::fmt::Display for ProviderWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed for {}: {}", self.provider, self.ticker, self.message)
    }
}

/// Outcome of a fallback chain: the first successful value, if any, plus one
/// warning for every provider that failed before it.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: Option<T>,
    pub warnings: Vec<ProviderWarning>,
}

/// Tries each provider in order and stops at the first success.
pub async fn first_success<'a, P, T, Fut>(
    providers: &'a [Arc<P>],
    ticker: &str,
    operation: impl Fn(&'a P) -> Fut,
) -> Resolved<T>
where
    P: ?Sized + NamedProvider,
    Fut: Future<Output = Result<T>>,
{
    let mut warnings = Vec::new();
    for provider in providers {
        match operation(provider.as_ref()).await {
            Ok(value) => {
                debug!("{} resolved {}", provider.provider_name(), ticker);
                return Resolved {
                    value: Some(value),
                    warnings,
                };
            }
            Err(e) => {
                warn!("{} failed for {}: {:#}", provider.provider_name(), ticker, e);
                warnings.push(ProviderWarning {
                    provider: provider.provider_name().to_string(),
                    ticker: ticker.to_string(),
                    message: format!("{e:#}"),
                });
            }
        }
    }
    Resolved {
        value: None,
        warnings,
    }
}

/// Anything that can be named in a [`ProviderWarning`].
pub trait NamedProvider {
    fn provider_name(&self) -> &str;
}

impl NamedProvider for dyn PriceProvider {
    fn provider_name(&self) -> &str {
        self.name()
    }
}

/// Resolves prices by walking a fixed priority list of providers.
#[derive(Clone)]
pub struct PriceResolver {
    providers: Vec<Arc<dyn PriceProvider>>,
}

impl PriceResolver {
    pub fn new(providers: Vec<Arc<dyn PriceProvider>>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[Arc<dyn PriceProvider>] {
        &self.providers
    }

    #[instrument(name = "ResolvePrice", skip(self))]
    pub async fn resolve(&self, ticker: &str) -> Resolved<f64> {
        first_success(&self.providers, ticker, |p| p.latest_close(ticker)).await
    }

    #[instrument(name = "ResolveHistory", skip(self))]
    pub async fn resolve_history(
        &self,
        ticker: &str,
        period: HistoricalPeriod,
    ) -> Resolved<Vec<PricePoint>> {
        first_success(&self.providers, ticker, |p| p.history(ticker, period)).await
    }

    /// Resolves every ticker one after the other. `on_resolved` is called after each
    /// ticker so callers can report progress.
    pub async fn resolve_all(
        &self,
        tickers: &[String],
        on_resolved: &dyn Fn(&str),
    ) -> (HashMap<String, Option<f64>>, Vec<ProviderWarning>) {
        let mut prices = HashMap::new();
        let mut warnings = Vec::new();
        for ticker in tickers {
            if prices.contains_key(ticker) {
                continue;
            }
            let resolved = self.resolve(ticker).await;
            warnings.extend(resolved.warnings);
            prices.insert(ticker.clone(), resolved.value);
            on_resolved(ticker);
        }
        (prices, warnings)
    }
}
