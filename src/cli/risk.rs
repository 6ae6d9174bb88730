use super::{fetch_history, ui};
use crate::core::price::HistoricalPeriod;
use crate::core::resolver::PriceResolver;
use crate::core::risk::{self, RiskMetrics};
use anyhow::{Result, bail};
use comfy_table::Cell;

impl RiskMetrics {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

        let trough = self
            .drawdowns
            .iter()
            .min_by(|a, b| a.drawdown.total_cmp(&b.drawdown))
            .filter(|d| d.drawdown < 0.0);

        table.add_row(vec![
            Cell::new("Annualized Volatility"),
            ui::percent_cell(self.volatility * 100.0),
        ]);
        table.add_row(vec![
            Cell::new("Sharpe Ratio"),
            ui::format_optional_cell(self.sharpe_ratio, |s| format!("{s:.2}")),
        ]);
        table.add_row(vec![
            Cell::new(format!("Beta vs {}", self.benchmark)),
            ui::format_optional_cell(self.beta, |b| format!("{b:.2}")),
        ]);
        table.add_row(vec![
            Cell::new("Max Drawdown"),
            ui::change_cell(self.max_drawdown * 100.0),
        ]);
        table.add_row(vec![
            Cell::new("Deepest Point"),
            ui::format_optional_cell(trough, |d| d.date.to_string()),
        ]);
        table.add_row(vec![
            Cell::new("Daily Returns"),
            Cell::new(self.observations),
        ]);

        format!(
            "Risk: {} ({})\n\n{}",
            ui::style_text(&self.ticker, ui::StyleType::Title),
            self.period,
            table
        )
    }
}

pub async fn run(
    resolver: &PriceResolver,
    ticker: &str,
    benchmark: &str,
    period: HistoricalPeriod,
) -> Result<RiskMetrics> {
    let ticker = ticker.trim().to_uppercase();
    let benchmark = benchmark.trim().to_uppercase();
    if ticker.is_empty() || benchmark.is_empty() {
        bail!("Ticker must not be empty");
    }
    let mut warnings = Vec::new();

    let pb = ui::new_progress_bar(2, true);
    pb.set_message("Fetching price history...");
    let fetched = async {
        let series = fetch_history(resolver, &ticker, period, &mut warnings).await?;
        pb.inc(1);
        let benchmark_series = fetch_history(resolver, &benchmark, period, &mut warnings).await?;
        Ok::<_, anyhow::Error>((series, benchmark_series))
    }
    .await;
    pb.finish_and_clear();
    let (series, benchmark_series) = fetched?;

    let metrics = risk::analyze(&ticker, &benchmark, period, &series, &benchmark_series)?;
    println!("{}", metrics.display_as_table());
    ui::print_warnings(&warnings);
    Ok(metrics)
}
