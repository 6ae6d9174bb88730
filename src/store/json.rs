use crate::core::transaction::Transaction;
use crate::store::TransactionStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores transactions as a pretty-printed JSON array in a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TransactionStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Transaction>> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to access transactions: {}", self.path.display()))?;
        if !exists {
            debug!("No transactions at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read transactions: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let transactions: Vec<Transaction> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse transactions: {}", self.path.display()))?;
        debug!(
            "Loaded {} transactions from {}",
            transactions.len(),
            self.path.display()
        );
        Ok(transactions)
    }

    async fn save(&self, transactions: &[Transaction]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(transactions)
            .context("Failed to serialize transactions")?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write transactions: {}", self.path.display()))?;
        debug!(
            "Saved {} transactions to {}",
            transactions.len(),
            self.path.display()
        );
        Ok(())
    }
}
