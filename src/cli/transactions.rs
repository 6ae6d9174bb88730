use super::ui;
use crate::core::ledger::Ledger;
use crate::core::transaction::Transaction;
use crate::core::transfer::{self, TransferFormat};
use crate::store::TransactionStore;
use anyhow::{Context, Result};
use comfy_table::{Cell, CellAlignment};
use std::path::Path;
use tracing::info;

async fn load_ledger(store: &dyn TransactionStore) -> Result<Ledger> {
    Ok(Ledger::new(store.load().await?))
}

async fn persist(store: &dyn TransactionStore, ledger: &Ledger) -> Result<()> {
    store.save(ledger.transactions()).await
}

pub async fn add(store: &dyn TransactionStore, transaction: Transaction) -> Result<Ledger> {
    let ledger = load_ledger(store).await?.with_transaction(transaction.clone());
    persist(store, &ledger).await?;
    info!("Recorded purchase of {} {}", transaction.shares, transaction.ticker);
    println!(
        "Added {} shares of {} ({}) at {:.2} on {}",
        transaction.shares,
        transaction.ticker,
        transaction.stock,
        transaction.price_paid,
        transaction.date
    );
    Ok(ledger)
}

impl Ledger {
    /// Renders the ledger newest first. The `#` column is the position `delete`
    /// expects.
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Date"),
            ui::header_cell("Stock"),
            ui::header_cell("Ticker"),
            ui::header_cell("Shares"),
            ui::header_cell("Price Paid"),
            ui::header_cell("Invested"),
        ]);

        for (index, t) in self.newest_first() {
            table.add_row(vec![
                Cell::new(index).set_alignment(CellAlignment::Right),
                Cell::new(t.date),
                Cell::new(&t.stock),
                Cell::new(&t.ticker),
                Cell::new(t.shares).set_alignment(CellAlignment::Right),
                ui::number_cell(t.price_paid),
                ui::number_cell(t.invested()),
            ]);
        }
        table.to_string()
    }
}

pub async fn list(store: &dyn TransactionStore) -> Result<()> {
    let ledger = load_ledger(store).await?;
    if ledger.is_empty() {
        println!("No transactions recorded yet. Use `pfolio add` or `pfolio import`.");
        return Ok(());
    }
    println!(
        "{}\n",
        ui::style_text("Transactions", ui::StyleType::Title)
    );
    println!("{}", ledger.display_as_table());
    Ok(())
}

pub async fn delete(store: &dyn TransactionStore, index: usize) -> Result<Ledger> {
    let current = load_ledger(store).await?;
    let removed = current.transactions().get(index).cloned();
    let ledger = current.without(index)?;
    persist(store, &ledger).await?;
    if let Some(t) = removed {
        println!(
            "Deleted {} shares of {} bought on {}",
            t.shares, t.ticker, t.date
        );
    }
    Ok(ledger)
}

/// Appends the file's transactions, or replaces the ledger with them. Nothing is
/// saved when the file is rejected.
pub async fn import(store: &dyn TransactionStore, path: &Path, replace: bool) -> Result<Ledger> {
    let format = TransferFormat::from_path(path)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    let imported = transfer::import(&content, format)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    let count = imported.len();

    let ledger = if replace {
        Ledger::new(imported)
    } else {
        load_ledger(store).await?.with_imported(imported)
    };
    persist(store, &ledger).await?;
    println!(
        "Imported {} transactions from {} ({} total)",
        count,
        path.display(),
        ledger.len()
    );
    Ok(ledger)
}

pub async fn export(
    store: &dyn TransactionStore,
    path: &Path,
    format: Option<TransferFormat>,
) -> Result<()> {
    let format = match format {
        Some(format) => format,
        None => TransferFormat::from_path(path)?,
    };
    let ledger = load_ledger(store).await?;
    let content = transfer::export(ledger.transactions(), format)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;
    println!(
        "Exported {} transactions to {}",
        ledger.len(),
        path.display()
    );
    Ok(())
}
