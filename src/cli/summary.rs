use super::ui;
use crate::core::ledger::Ledger;
use crate::core::performance::{self, PortfolioPerformance};
use crate::core::resolver::PriceResolver;
use crate::store::TransactionStore;
use anyhow::Result;
use chrono::Local;
use comfy_table::Cell;

impl PortfolioPerformance {
    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Stock"),
            ui::header_cell("Ticker"),
            ui::header_cell("Shares"),
            ui::header_cell("Price Paid"),
            ui::header_cell("Live Price"),
            ui::header_cell(&format!("Invested ({currency})")),
            ui::header_cell(&format!("Value ({currency})")),
            ui::header_cell("P/L"),
            ui::header_cell("P/L (%)"),
            ui::header_cell("CAGR"),
        ]);

        for row in &self.rows {
            let live_price = if row.price_resolved {
                ui::number_cell(row.live_price)
            } else {
                // unresolved rows are valued at cost
                ui::na_cell(true)
            };
            table.add_row(vec![
                Cell::new(&row.stock),
                Cell::new(&row.ticker),
                Cell::new(row.shares),
                ui::number_cell(row.price_paid),
                live_price,
                ui::number_cell(row.invested),
                ui::number_cell(row.current_value),
                ui::profit_cell(row.profit_loss),
                ui::change_cell(row.profit_loss_pct),
                ui::format_optional_cell(row.annualized_return, |r| format!("{r:.2}%")),
            ]);
        }

        let totals = &self.totals;
        let total_style = if totals.profit_loss >= 0.0 {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Portfolio Performance", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nTotal Invested ({}): {:.2}",
            ui::style_text(currency, ui::StyleType::TotalLabel),
            totals.invested
        ));
        output.push_str(&format!(
            "\nCurrent Value ({}): {}",
            ui::style_text(currency, ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", totals.current_value), ui::StyleType::TotalValue)
        ));
        output.push_str(&format!(
            "\nProfit/Loss: {}",
            ui::style_text(
                &format!("{:+.2} ({:.2}%)", totals.profit_loss, totals.profit_loss_pct),
                total_style
            )
        ));
        output
    }

    pub fn allocation_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Ticker"),
            ui::header_cell("Value"),
            ui::header_cell("Weight (%)"),
        ]);
        for a in &self.allocation {
            table.add_row(vec![
                Cell::new(&a.ticker),
                ui::number_cell(a.current_value),
                ui::number_cell(a.weight),
            ]);
        }
        format!(
            "{}\n\n{}",
            ui::style_text("Allocation", ui::StyleType::Title),
            table
        )
    }
}

pub async fn run(
    store: &dyn TransactionStore,
    resolver: &PriceResolver,
    currency: &str,
) -> Result<PortfolioPerformance> {
    let ledger = Ledger::new(store.load().await?);
    if ledger.is_empty() {
        println!("No transactions recorded yet. Use `pfolio add` or `pfolio import`.");
        return Ok(PortfolioPerformance::default());
    }

    let tickers = ledger.tickers();
    let pb = ui::new_progress_bar(tickers.len() as u64, true);
    pb.set_message("Fetching prices...");
    let (prices, warnings) = resolver.resolve_all(&tickers, &|_: &str| pb.inc(1)).await;
    pb.finish_and_clear();

    let performance = performance::compute(
        ledger.transactions(),
        &prices,
        Local::now().date_naive(),
    );

    println!("{}", performance.display_as_table(currency));
    ui::print_separator();
    println!("{}", performance.allocation_as_table());
    ui::print_warnings(&warnings);

    Ok(performance)
}
