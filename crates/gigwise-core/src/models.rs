//! Data models for Gigwise
//!
//! Records arrive from callers as JSON (camelCase envelope, snake_case
//! fields) and live only for the duration of one request. Derived forecast
//! types are produced per request and never stored.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Category used when a record does not carry one
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Label attached to every projected income day
pub const PREDICTED_INCOME_LABEL: &str = "Predicted Income";

/// A single income payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub amount: f64,
    /// Raw date string (`YYYY-MM-DD`); parsed lazily by the operations that need it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl IncomeRecord {
    pub fn new(amount: f64, date: &str) -> Self {
        Self {
            amount,
            date: Some(date.to_string()),
            category: None,
            source: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// A single expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ExpenseRecord {
    pub fn new(amount: f64, category: &str) -> Self {
        Self {
            amount,
            date: None,
            category: Some(category.to_string()),
        }
    }

    pub fn on(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// Anything that carries an optional raw date
pub trait Dated {
    fn raw_date(&self) -> Option<&str>;
}

impl Dated for IncomeRecord {
    fn raw_date(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

impl Dated for ExpenseRecord {
    fn raw_date(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

/// Parse a record date.
///
/// Accepts `YYYY-MM-DD`, or an ISO-8601 timestamp whose first ten
/// characters form such a date (`2024-03-01T10:00:00Z`).
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    trimmed
        .get(..10)
        .filter(|_| trimmed.as_bytes().get(10) == Some(&b'T'))
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .ok_or_else(|| Error::validation(format!("Invalid date: {:?}", raw)))
}

/// Parse the dates of every record, failing on the first bad one
pub fn parse_dates<T: Dated>(records: &[T]) -> Result<Vec<NaiveDate>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let raw = record
                .raw_date()
                .ok_or_else(|| Error::validation(format!("Record {} is missing a date", i)))?;
            parse_date(raw).map_err(|_| {
                Error::validation(format!("Record {} has an invalid date: {:?}", i, raw))
            })
        })
        .collect()
}

/// Income and expense records for one worker, as stored in dataset files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub income_data: Vec<IncomeRecord>,
    #[serde(default)]
    pub expense_data: Vec<ExpenseRecord>,
}

/// One row of a CSV dataset export
#[derive(Debug, Deserialize)]
struct CsvRow {
    kind: String,
    amount: f64,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

impl Dataset {
    /// Load a dataset from a JSON or CSV file (chosen by extension)
    pub fn load(path: &Path) -> Result<Self> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            let file = std::fs::File::open(path)?;
            Self::from_csv(file)
        } else {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Parse CSV rows of `kind,amount,date,category,source` where kind is
    /// `income` or `expense`
    pub fn from_csv<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut dataset = Dataset::default();

        for (line, row) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = row?;
            let blank_to_none = |s: Option<String>| s.filter(|v| !v.is_empty());
            match row.kind.to_ascii_lowercase().as_str() {
                "income" => dataset.income_data.push(IncomeRecord {
                    amount: row.amount,
                    date: blank_to_none(row.date),
                    category: blank_to_none(row.category),
                    source: blank_to_none(row.source),
                }),
                "expense" => dataset.expense_data.push(ExpenseRecord {
                    amount: row.amount,
                    date: blank_to_none(row.date),
                    category: blank_to_none(row.category),
                }),
                other => {
                    return Err(Error::validation(format!(
                        "Row {}: unknown record kind {:?} (expected income or expense)",
                        line + 1,
                        other
                    )))
                }
            }
        }

        Ok(dataset)
    }

    /// Distinct income categories in first-seen order
    pub fn income_categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.income_data {
            let category = record.category();
            if !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }
}

/// A projected income day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub amount: f64,
    pub source: String,
}

/// Sum of projected income for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyForecast {
    /// `YYYY-MM`
    pub month: String,
    pub predicted_amount: f64,
}

/// Result of projecting the income model over the forecast horizon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeForecast {
    pub daily: Vec<DailyForecast>,
    pub monthly: Vec<MonthlyForecast>,
}

impl IncomeForecast {
    pub fn total(&self) -> f64 {
        self.daily.iter().map(|d| d.amount).sum()
    }
}

/// Round to two decimal places, halves to even (`0.125` -> `0.12`)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Round to one decimal place, halves to even
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_plain_and_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date("2024-03-01").unwrap(), expected);
        assert_eq!(parse_date(" 2024-03-01 ").unwrap(), expected);
        assert_eq!(parse_date("2024-03-01T10:15:00Z").unwrap(), expected);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("03/01/2024").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_parse_dates_fails_whole_batch() {
        let records = vec![
            IncomeRecord::new(10.0, "2024-01-01"),
            IncomeRecord::new(20.0, "not-a-date"),
            IncomeRecord::new(30.0, "2024-01-03"),
        ];
        let err = parse_dates(&records).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Record 1"));
    }

    #[test]
    fn test_parse_dates_missing_date() {
        let records = vec![ExpenseRecord::new(5.0, "Food")];
        let err = parse_dates(&records).unwrap_err();
        assert!(err.to_string().contains("missing a date"));
    }

    #[test]
    fn test_record_defaults_from_json() {
        let record: ExpenseRecord = serde_json::from_str(r#"{"amount": 500}"#).unwrap();
        assert_eq!(record.category(), UNCATEGORIZED);
        assert!(record.date.is_none());

        let income: IncomeRecord = serde_json::from_str(
            r#"{"id": 7, "amount": 1000.5, "date": "2024-01-01", "source": "Uber Trips", "description": "x"}"#,
        )
        .unwrap();
        assert_eq!(income.source.as_deref(), Some("Uber Trips"));
        assert_eq!(income.category(), UNCATEGORIZED);
    }

    #[test]
    fn test_dataset_from_csv() {
        let csv = "kind,amount,date,category,source\n\
                   income,1200,2024-01-05,Cab Driver,Ola Rides\n\
                   expense,300,2024-01-06,Fuel,\n\
                   expense,150,,Food,\n";
        let dataset = Dataset::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(dataset.income_data.len(), 1);
        assert_eq!(dataset.expense_data.len(), 2);
        assert_eq!(dataset.income_data[0].source.as_deref(), Some("Ola Rides"));
        assert!(dataset.expense_data[0].date.is_some());
        assert!(dataset.expense_data[1].date.is_none());
    }

    #[test]
    fn test_dataset_from_csv_unknown_kind() {
        let csv = "kind,amount,date,category,source\ntransfer,5,2024-01-01,,\n";
        let err = Dataset::from_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("unknown record kind"));
    }

    #[test]
    fn test_income_categories_first_seen_order() {
        let dataset = Dataset {
            income_data: vec![
                IncomeRecord::new(1.0, "2024-01-01").with_category("Cab Driver"),
                IncomeRecord::new(1.0, "2024-01-02").with_category("Food Delivery"),
                IncomeRecord::new(1.0, "2024-01-03").with_category("Cab Driver"),
            ],
            expense_data: vec![],
        };
        assert_eq!(dataset.income_categories(), vec!["Cab Driver", "Food Delivery"]);
    }

    #[test]
    fn test_round_helpers() {
        assert_eq!(round2(10.456), 10.46);
        assert_eq!(round2(-0.004), -0.0);
        assert_eq!(round1(33.333), 33.3);
    }

    #[test]
    fn test_round_halves_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(round1(0.75), 0.8);
    }
}
