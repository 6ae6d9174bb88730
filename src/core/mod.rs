//! Core business logic

pub mod config;
pub mod fundamentals;
pub mod ledger;
pub mod log;
pub mod performance;
pub mod price;
pub mod rating;
pub mod resolver;
pub mod risk;
pub mod transaction;
pub mod transfer;
pub mod trend;

// Re-export main types for cleaner imports
pub use fundamentals::{Fundamentals, FundamentalsProvider};
pub use ledger::Ledger;
pub use price::{HistoricalPeriod, PricePoint, PriceProvider};
pub use resolver::{PriceResolver, ProviderWarning};
pub use transaction::Transaction;
