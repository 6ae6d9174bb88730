pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::price::HistoricalPeriod;
use crate::core::rating::RatingEngine;
use crate::core::resolver::PriceResolver;
use crate::core::transaction::Transaction;
use crate::core::transfer::TransferFormat;
use crate::store::{JsonFileStore, TransactionStore};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// A command ready to run, with its arguments already validated by the CLI.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Summary,
    Add(Transaction),
    List,
    Delete {
        index: usize,
    },
    Import {
        path: PathBuf,
        replace: bool,
    },
    Export {
        path: PathBuf,
        format: Option<TransferFormat>,
    },
    Rate {
        ticker: String,
    },
    Risk {
        ticker: String,
        benchmark: Option<String>,
        period: HistoricalPeriod,
    },
    Trend {
        ticker: String,
        period: HistoricalPeriod,
    },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("pfolio starting...");
    let config = load_config(config_path)?;
    let store = JsonFileStore::new(config.transactions_path()?);
    run_with_store(command, &config, &store).await
}

/// Runs `command` against an explicit store, so callers can swap persistence.
pub async fn run_with_store(
    command: AppCommand,
    config: &AppConfig,
    store: &dyn TransactionStore,
) -> Result<()> {
    match command {
        AppCommand::Add(transaction) => {
            cli::transactions::add(store, transaction).await?;
        }
        AppCommand::List => cli::transactions::list(store).await?,
        AppCommand::Delete { index } => {
            cli::transactions::delete(store, index).await?;
        }
        AppCommand::Import { path, replace } => {
            cli::transactions::import(store, &path, replace).await?;
        }
        AppCommand::Export { path, format } => {
            cli::transactions::export(store, &path, format).await?
        }
        AppCommand::Summary => {
            let chains = providers::build_chains(&config.providers)?;
            let resolver = PriceResolver::new(chains.prices);
            cli::summary::run(store, &resolver, &config.currency).await?;
        }
        AppCommand::Rate { ticker } => {
            let chains = providers::build_chains(&config.providers)?;
            let engine = RatingEngine::new(chains.fundamentals);
            cli::rate::run(&engine, &ticker).await?;
        }
        AppCommand::Risk {
            ticker,
            benchmark,
            period,
        } => {
            let chains = providers::build_chains(&config.providers)?;
            let resolver = PriceResolver::new(chains.prices);
            let benchmark = benchmark.as_deref().unwrap_or(&config.benchmark);
            cli::risk::run(&resolver, &ticker, benchmark, period).await?;
        }
        AppCommand::Trend { ticker, period } => {
            let chains = providers::build_chains(&config.providers)?;
            let resolver = PriceResolver::new(chains.prices);
            cli::trend::run(store, &resolver, &ticker, period, &config.currency).await?;
        }
    }
    Ok(())
}
