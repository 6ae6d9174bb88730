//! Buy transactions recorded by the user.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Field names every persisted or imported transaction carries.
pub const REQUIRED_FIELDS: [&str; 5] = ["Stock", "Ticker", "Shares", "Price Paid", "Date"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Stock")]
    pub stock: String,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Shares")]
    pub shares: f64,
    #[serde(rename = "Price Paid")]
    pub price_paid: f64,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
}

impl Transaction {
    /// Builds a validated transaction. The ticker is trimmed and upper-cased.
    pub fn new(
        stock: &str,
        ticker: &str,
        shares: f64,
        price_paid: f64,
        date: NaiveDate,
    ) -> Result<Self> {
        let transaction = Transaction {
            stock: stock.trim().to_string(),
            ticker: ticker.trim().to_uppercase(),
            shares,
            price_paid,
            date,
        };
        transaction.validate()?;
        Ok(transaction)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            bail!("Ticker must not be empty");
        }
        if !self.shares.is_finite() || self.shares <= 0.0 {
            bail!(
                "Shares must be a positive number for {}: {}",
                self.ticker,
                self.shares
            );
        }
        if !self.price_paid.is_finite() || self.price_paid <= 0.0 {
            bail!(
                "Price paid must be a positive number for {}: {}",
                self.ticker,
                self.price_paid
            );
        }
        Ok(())
    }

    /// Capital spent on this purchase.
    pub fn invested(&self) -> f64 {
        self.shares * self.price_paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_new_normalizes_ticker() {
        let t = Transaction::new("Apple", " aapl ", 10.0, 150.0, date()).unwrap();
        assert_eq!(t.ticker, "AAPL");
        assert_eq!(t.invested(), 1500.0);
    }

    #[test]
    fn test_new_rejects_invalid_input() {
        assert!(Transaction::new("Apple", "  ", 10.0, 150.0, date()).is_err());
        assert!(Transaction::new("Apple", "AAPL", 0.0, 150.0, date()).is_err());
        assert!(Transaction::new("Apple", "AAPL", 1.0, -1.0, date()).is_err());
        assert!(Transaction::new("Apple", "AAPL", f64::NAN, 1.0, date()).is_err());
    }

    #[test]
    fn test_serializes_with_display_field_names() {
        let t = Transaction::new("Apple", "AAPL", 10.0, 150.0, date()).unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["Stock"], "Apple");
        assert_eq!(json["Ticker"], "AAPL");
        assert_eq!(json["Shares"], 10.0);
        assert_eq!(json["Price Paid"], 150.0);
        assert_eq!(json["Date"], "2024-03-01");
        for field in REQUIRED_FIELDS {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }
}
