use crate::core::transaction::Transaction;
use crate::store::TransactionStore;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory store, used by tests and as a scratch ledger.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Vec<Transaction>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transactions)),
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Transaction>> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, transactions: &[Transaction]) -> Result<()> {
        let mut stored = self.inner.lock().await;
        debug!("Memory store PUT {} transactions", transactions.len());
        *stored = transactions.to_vec();
        Ok(())
    }
}
