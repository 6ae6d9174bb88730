use super::{fetch_history, ui};
use crate::core::price::HistoricalPeriod;
use crate::core::resolver::PriceResolver;
use crate::core::trend::{self, Trend};
use crate::store::TransactionStore;
use anyhow::Result;
use comfy_table::Cell;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Compresses the closes into at most `width` block characters.
pub fn sparkline(closes: &[f64], width: usize) -> String {
    if closes.is_empty() || width == 0 {
        return String::new();
    }
    let step = closes.len().div_ceil(width);
    let sampled: Vec<f64> = closes
        .chunks(step)
        .filter_map(|chunk| chunk.last().copied())
        .collect();
    let low = sampled.iter().copied().fold(f64::INFINITY, f64::min);
    let high = sampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = high - low;

    sampled
        .iter()
        .map(|close| {
            let level = if range > 0.0 {
                ((close - low) / range * (SPARK_LEVELS.len() - 1) as f64).round() as usize
            } else {
                SPARK_LEVELS.len() / 2
            };
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

impl Trend {
    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
        table.add_row(vec![
            Cell::new(format!("First Close ({currency})")),
            ui::format_optional_cell(self.first_close(), |c| format!("{c:.2}")),
        ]);
        table.add_row(vec![
            Cell::new(format!("Last Close ({currency})")),
            ui::format_optional_cell(self.last_close(), |c| format!("{c:.2}")),
        ]);
        table.add_row(vec![
            Cell::new("Change"),
            self.change_pct().map_or(ui::na_cell(false), ui::change_cell),
        ]);
        table.add_row(vec![
            Cell::new("High"),
            ui::format_optional_cell(self.high(), |p| format!("{:.2} on {}", p.close, p.date)),
        ]);
        table.add_row(vec![
            Cell::new("Low"),
            ui::format_optional_cell(self.low(), |p| format!("{:.2} on {}", p.close, p.date)),
        ]);

        let closes: Vec<f64> = self.series.iter().map(|p| p.close).collect();
        let mut output = format!(
            "Trend: {} ({})\n\n{}\n\n{}",
            ui::style_text(&self.ticker, ui::StyleType::Title),
            self.period,
            sparkline(&closes, 60),
            table
        );

        if !self.buys.is_empty() {
            let mut buys = ui::new_styled_table();
            buys.set_header(vec![
                ui::header_cell("Bought On"),
                ui::header_cell("Shares"),
                ui::header_cell("Price Paid"),
                ui::header_cell("Close That Day"),
            ]);
            for buy in &self.buys {
                buys.add_row(vec![
                    Cell::new(buy.point.date),
                    Cell::new(buy.shares),
                    ui::number_cell(buy.price_paid),
                    ui::number_cell(buy.point.close),
                ]);
            }
            output.push_str(&format!(
                "\n\n{}\n\n{}",
                ui::style_text("Your Purchases", ui::StyleType::TotalLabel),
                buys
            ));
        }
        output
    }
}

pub async fn run(
    store: &dyn TransactionStore,
    resolver: &PriceResolver,
    ticker: &str,
    period: HistoricalPeriod,
    currency: &str,
) -> Result<Trend> {
    let ticker = ticker.trim().to_uppercase();
    let transactions = store.load().await?;
    let mut warnings = Vec::new();

    let series = fetch_history(resolver, &ticker, period, &mut warnings).await?;
    let trend = trend::trend(&ticker, period, series, &transactions);

    println!("{}", trend.display_as_table(currency));
    ui::print_warnings(&warnings);
    Ok(trend)
}
