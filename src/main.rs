use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use pfolio::core::log::init_logging;
use pfolio::core::price::HistoricalPeriod;
use pfolio::core::transaction::Transaction;
use pfolio::core::transfer::TransferFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for TransferFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => TransferFormat::Csv,
            FormatArg::Json => TransferFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display portfolio performance and allocation
    Summary,
    /// Record a purchase
    Add {
        /// Ticker symbol, e.g. AAPL
        ticker: String,
        /// Number of shares bought
        shares: f64,
        /// Price paid per share
        price: f64,
        /// Company or fund name, defaults to the ticker
        #[arg(short, long)]
        name: Option<String>,
        /// Purchase date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// List recorded purchases, newest first
    List,
    /// Delete the purchase at the position shown by `list`
    Delete { index: usize },
    /// Import purchases from a .csv or .json file
    Import {
        path: PathBuf,
        /// Replace all recorded purchases instead of appending
        #[arg(long)]
        replace: bool,
    },
    /// Export purchases to a .csv or .json file
    Export {
        path: PathBuf,
        /// Output format, inferred from the file extension when omitted
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Rate a ticker on value and quality fundamentals
    Rate { ticker: String },
    /// Show volatility, Sharpe ratio, beta and drawdown for a ticker
    Risk {
        ticker: String,
        /// Benchmark ticker, defaults to the configured benchmark
        #[arg(short, long)]
        benchmark: Option<String>,
        /// One of 1D, 1W, 1M, 1Y, 5Y, YTD, MAX
        #[arg(short, long, default_value = "1Y")]
        period: HistoricalPeriod,
    },
    /// Show the price trend of a ticker with your purchases marked
    Trend {
        ticker: String,
        /// One of 1D, 1W, 1M, 1Y, 5Y, YTD, MAX
        #[arg(short, long, default_value = "1Y")]
        period: HistoricalPeriod,
    },
}

impl TryFrom<Commands> for pfolio::AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<pfolio::AppCommand> {
        Ok(match cmd {
            Commands::Summary => pfolio::AppCommand::Summary,
            Commands::Add {
                ticker,
                shares,
                price,
                name,
                date,
            } => {
                let date = date.unwrap_or_else(|| Local::now().date_naive());
                let name = name.unwrap_or_else(|| ticker.clone());
                pfolio::AppCommand::Add(Transaction::new(&name, &ticker, shares, price, date)?)
            }
            Commands::List => pfolio::AppCommand::List,
            Commands::Delete { index } => pfolio::AppCommand::Delete { index },
            Commands::Import { path, replace } => pfolio::AppCommand::Import { path, replace },
            Commands::Export { path, format } => pfolio::AppCommand::Export {
                path,
                format: format.map(TransferFormat::from),
            },
            Commands::Rate { ticker } => pfolio::AppCommand::Rate { ticker },
            Commands::Risk {
                ticker,
                benchmark,
                period,
            } => pfolio::AppCommand::Risk {
                ticker,
                benchmark,
                period,
            },
            Commands::Trend { ticker, period } => pfolio::AppCommand::Trend { ticker, period },
            Commands::Setup => {
                anyhow::bail!("Setup command is handled before loading configuration")
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => pfolio::cli::setup::setup(),
        Some(cmd) => match pfolio::AppCommand::try_from(cmd) {
            Ok(command) => pfolio::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
