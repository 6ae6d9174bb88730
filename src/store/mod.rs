//! Persistence of the transaction list behind an injectable trait.

pub mod json;
pub mod memory;

use crate::core::transaction::Transaction;
use anyhow::Result;
use async_trait::async_trait;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Loads and saves the complete transaction list.
///
/// `save` replaces whatever was stored before; there is no partial update.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Transaction>>;

    async fn save(&self, transactions: &[Transaction]) -> Result<()>;
}
