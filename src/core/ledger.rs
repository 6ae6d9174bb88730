//! Immutable snapshots of the transaction list.
//!
//! Every mutation returns a new [`Ledger`]; callers persist the result through a
//! [`TransactionStore`](crate::store::TransactionStore) and re-render from it.

use crate::core::transaction::Transaction;
use anyhow::{Result, anyhow};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Distinct tickers in first-seen order.
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = Vec::new();
        for t in &self.transactions {
            if !tickers.contains(&t.ticker) {
                tickers.push(t.ticker.clone());
            }
        }
        tickers
    }

    pub fn with_transaction(&self, transaction: Transaction) -> Ledger {
        let mut transactions = self.transactions.clone();
        transactions.push(transaction);
        Ledger { transactions }
    }

    /// Removes the transaction at `index`. The ledger is unchanged on error.
    pub fn without(&self, index: usize) -> Result<Ledger> {
        if index >= self.transactions.len() {
            return Err(anyhow!(
                "No transaction at position {} (ledger holds {})",
                index,
                self.transactions.len()
            ));
        }
        let mut transactions = self.transactions.clone();
        transactions.remove(index);
        Ok(Ledger { transactions })
    }

    pub fn with_imported(&self, imported: Vec<Transaction>) -> Ledger {
        let mut transactions = self.transactions.clone();
        transactions.extend(imported);
        Ledger { transactions }
    }

    /// Positions and transactions ordered newest first, as shown by `list`.
    pub fn newest_first(&self) -> Vec<(usize, &Transaction)> {
        let mut rows: Vec<_> = self.transactions.iter().enumerate().collect();
        rows.sort_by(|a, b| b.1.date.cmp(&a.1.date));
        rows
    }
}
