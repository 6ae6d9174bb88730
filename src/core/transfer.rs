//! Import and export of transactions as CSV or JSON.

use crate::core::transaction::{REQUIRED_FIELDS, Transaction};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFormat {
    Csv,
    Json,
}

impl TransferFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, TransferError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        extension.parse()
    }
}

impl FromStr for TransferFormat {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(TransferFormat::Csv),
            "json" => Ok(TransferFormat::Json),
            other => Err(TransferError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Unsupported file format '{0}', expected csv or json")]
    UnsupportedFormat(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid record {record}: {message}")]
    InvalidRecord { record: usize, message: String },

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn missing_fields<'a>(present: impl Iterator<Item = &'a str> + Clone) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| !present.clone().any(|p| p.trim() == **field))
        .map(|field| field.to_string())
        .collect()
}

fn validated(transactions: Vec<Transaction>) -> Result<Vec<Transaction>, TransferError> {
    transactions
        .into_iter()
        .enumerate()
        .map(|(i, mut t)| {
            t.ticker = t.ticker.trim().to_uppercase();
            t.validate().map_err(|e| TransferError::InvalidRecord {
                record: i + 1,
                message: e.to_string(),
            })?;
            Ok(t)
        })
        .collect()
}

/// Parses an uploaded file. The whole file is rejected if a required field is
/// absent or any record is invalid.
pub fn import(content: &str, format: TransferFormat) -> Result<Vec<Transaction>, TransferError> {
    let transactions = match format {
        TransferFormat::Csv => import_csv(content)?,
        TransferFormat::Json => import_json(content)?,
    };
    debug!("Parsed {} transactions from {:?}", transactions.len(), format);
    validated(transactions)
}

fn import_csv(content: &str) -> Result<Vec<Transaction>, TransferError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let missing = missing_fields(headers.iter());
    if !missing.is_empty() {
        return Err(TransferError::MissingFields(missing));
    }

    reader
        .deserialize::<Transaction>()
        .enumerate()
        .map(|(i, record)| {
            record.map_err(|e| TransferError::InvalidRecord {
                record: i + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

fn import_json(content: &str) -> Result<Vec<Transaction>, TransferError> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(content)?;

    let mut missing: Vec<String> = Vec::new();
    for record in &records {
        for field in missing_fields(record.keys().map(String::as_str)) {
            if !missing.contains(&field) {
                missing.push(field);
            }
        }
    }
    if !missing.is_empty() {
        return Err(TransferError::MissingFields(missing));
    }

    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            serde_json::from_value(serde_json::Value::Object(record)).map_err(|e| {
                TransferError::InvalidRecord {
                    record: i + 1,
                    message: e.to_string(),
                }
            })
        })
        .collect()
}

/// Serializes the full list. JSON output matches the persisted form.
pub fn export(
    transactions: &[Transaction],
    format: TransferFormat,
) -> Result<String, TransferError> {
    match format {
        TransferFormat::Json => Ok(serde_json::to_string_pretty(transactions)?),
        TransferFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            if transactions.is_empty() {
                writer.write_record(REQUIRED_FIELDS)?;
            }
            for t in transactions {
                writer.serialize(t)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| TransferError::Csv(e.into_error().into()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::new(
                "Apple",
                "AAPL",
                10.0,
                150.0,
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            )
            .unwrap(),
            Transaction::new(
                "Vanguard Total",
                "VTI",
                2.5,
                220.25,
                NaiveDate::from_ymd_opt(2023, 7, 14).unwrap(),
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            TransferFormat::from_path(Path::new("out/trades.CSV")).unwrap(),
            TransferFormat::Csv
        );
        assert_eq!(
            TransferFormat::from_path(Path::new("trades.json")).unwrap(),
            TransferFormat::Json
        );
        assert!(matches!(
            TransferFormat::from_path(Path::new("trades.xlsx")),
            Err(TransferError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_import_csv() {
        let content = "Stock,Ticker,Shares,Price Paid,Date,Notes\n\
                       Apple,aapl,10,150.0,2024-01-02,first buy\n\
                       Microsoft,MSFT,1.5,400,2024-02-03,\n";
        let imported = import(content, TransferFormat::Csv).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].ticker, "AAPL");
        assert_eq!(imported[1].shares, 1.5);
        assert_eq!(
            imported[1].date,
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()
        );
    }

    #[test]
    fn test_import_csv_missing_columns() {
        let content = "Stock,Ticker,Shares\nApple,AAPL,10\n";
        match import(content, TransferFormat::Csv) {
            Err(TransferError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["Price Paid", "Date"]);
            }
            other => panic!("expected missing fields, got {other:?}"),
        }
    }

    #[test]
    fn test_import_json_missing_field_in_one_record() {
        let content = r#"[
            {"Stock": "Apple", "Ticker": "AAPL", "Shares": 10, "Price Paid": 150.0, "Date": "2024-01-02"},
            {"Stock": "Microsoft", "Ticker": "MSFT", "Shares": 1}
        ]"#;
        let err = import(content, TransferFormat::Json).unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: Price Paid, Date");
    }

    #[test]
    fn test_import_rejects_invalid_values() {
        let content = "Stock,Ticker,Shares,Price Paid,Date\nApple,AAPL,-1,150,2024-01-02\n";
        assert!(matches!(
            import(content, TransferFormat::Csv),
            Err(TransferError::InvalidRecord { record: 1, .. })
        ));

        let content = "Stock,Ticker,Shares,Price Paid,Date\nApple,AAPL,ten,150,2024-01-02\n";
        assert!(matches!(
            import(content, TransferFormat::Csv),
            Err(TransferError::InvalidRecord { record: 1, .. })
        ));

        assert!(matches!(
            import("not json", TransferFormat::Json),
            Err(TransferError::Json(_))
        ));
    }

    #[test]
    fn test_export_then_import_preserves_records() {
        let transactions = sample();
        for format in [TransferFormat::Csv, TransferFormat::Json] {
            let exported = export(&transactions, format).unwrap();
            assert_eq!(import(&exported, format).unwrap(), transactions);
        }
    }

    #[test]
    fn test_export_csv_layout() {
        let exported = export(&sample()[..1], TransferFormat::Csv).unwrap();
        assert_eq!(
            exported,
            "Stock,Ticker,Shares,Price Paid,Date\nApple,AAPL,10.0,150.0,2024-01-02\n"
        );
        let empty = export(&[], TransferFormat::Csv).unwrap();
        assert_eq!(empty, "Stock,Ticker,Shares,Price Paid,Date\n");
    }
}
