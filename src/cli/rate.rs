use super::ui;
use crate::core::rating::{QUALITY_RATIOS, Ratio, RatingEngine, RatingReport, VALUE_RATIOS};
use anyhow::Result;
use comfy_table::Cell;

fn format_ratio(ratio: Ratio, value: f64) -> String {
    match ratio {
        Ratio::EarningsYield
        | Ratio::ReturnOnEquity
        | Ratio::ReturnOnAssets
        | Ratio::OperatingMargin
        | Ratio::GrossMargin => format!("{:.2}%", value * 100.0),
        Ratio::DebtToEquity => format!("{value:.2}%"),
        _ => format!("{value:.2}"),
    }
}

impl RatingReport {
    pub fn display_as_table(&self) -> String {
        let rating = &self.rating;
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Group"),
            ui::header_cell("Ratio"),
            ui::header_cell("Value"),
            ui::header_cell("Score"),
        ]);

        for (group, ratios) in [("Value", &VALUE_RATIOS), ("Quality", &QUALITY_RATIOS)] {
            for ratio in ratios {
                let value = rating.ratios.get(ratio).copied();
                let score = rating.scores.get(ratio).copied();
                table.add_row(vec![
                    Cell::new(group),
                    Cell::new(ratio),
                    ui::format_optional_cell(value, |v| format_ratio(*ratio, v)),
                    ui::format_optional_cell(score, |s| format!("{s}/5")),
                ]);
            }
        }

        let mut output = format!(
            "Rating: {}\n\n",
            ui::style_text(&rating.ticker, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nValue Score: {}\nQuality Score: {}\nTotal: {}",
            rating.value_score,
            rating.quality_score,
            ui::style_text(&rating.total().to_string(), ui::StyleType::TotalLabel)
        ));

        let label_style = if rating.total() >= 25 {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };
        output.push_str(&format!(
            "\nRecommendation: {}",
            ui::style_text(&rating.label.to_string(), label_style)
        ));

        if !self.sources.is_empty() {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!("Data from {}", self.sources.join(", ")),
                    ui::StyleType::Subtle
                )
            ));
        }
        output
    }
}

pub async fn run(engine: &RatingEngine, ticker: &str) -> Result<RatingReport> {
    let report = engine.rate(ticker).await?;
    if report.rating.ratios.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("No fundamental data available for {}", report.rating.ticker),
                ui::StyleType::Error
            )
        );
    }
    println!("{}", report.display_as_table());
    ui::print_warnings(&report.warnings);
    Ok(report)
}
