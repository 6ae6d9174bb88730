pub mod fmp;
pub mod marketstack;
pub mod util;
pub mod yahoo_finance;

use crate::core::config::ProvidersConfig;
use crate::core::fundamentals::FundamentalsProvider;
use crate::core::price::PriceProvider;
use anyhow::Result;
use fmp::FmpProvider;
use marketstack::MarketstackProvider;
use std::sync::Arc;
use tracing::debug;
use yahoo_finance::YahooFinanceProvider;

/// Provider chains built from configuration, in priority order.
pub struct ProviderChains {
    pub prices: Vec<Arc<dyn PriceProvider>>,
    pub fundamentals: Vec<Arc<dyn FundamentalsProvider>>,
}

/// Yahoo Finance first, then Marketstack, then Financial Modeling Prep. Keyed
/// providers join the chain only when their API key is configured.
pub fn build_chains(config: &ProvidersConfig) -> Result<ProviderChains> {
    let mut chains = ProviderChains {
        prices: Vec::new(),
        fundamentals: Vec::new(),
    };

    if let Some(yahoo) = &config.yahoo {
        let provider = Arc::new(YahooFinanceProvider::new(&yahoo.base_url)?);
        chains.prices.push(provider.clone());
        chains.fundamentals.push(provider);
    }

    if let Some((base_url, key)) = config
        .marketstack
        .as_ref()
        .and_then(|p| p.api_key().map(|key| (&p.base_url, key)))
    {
        chains
            .prices
            .push(Arc::new(MarketstackProvider::new(base_url, key)?));
    }

    if let Some((base_url, key)) = config
        .fmp
        .as_ref()
        .and_then(|p| p.api_key().map(|key| (&p.base_url, key)))
    {
        let provider = Arc::new(FmpProvider::new(base_url, key)?);
        chains.prices.push(provider.clone());
        chains.fundamentals.push(provider);
    }

    debug!(
        "Configured {} price and {} fundamentals providers",
        chains.prices.len(),
        chains.fundamentals.len()
    );
    Ok(chains)
}
