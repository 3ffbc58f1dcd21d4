//! Calendar feature derivation
//!
//! The income model only sees three integers per day: weekday, day of
//! month and month. Everything else about a record is ignored.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{parse_dates, Dated};

/// Number of features fed to the income model
pub const FEATURE_COUNT: usize = 3;

/// Calendar features for one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFeatures {
    /// Monday = 0 .. Sunday = 6
    pub day_of_week: u32,
    /// 1..=31
    pub day_of_month: u32,
    /// 1..=12
    pub month: u32,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day_of_week: date.weekday().num_days_from_monday(),
            day_of_month: date.day(),
            month: date.month(),
        }
    }

    /// Monday through Friday
    pub fn is_weekday(&self) -> bool {
        self.day_of_week < 5
    }

    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.day_of_week as f64,
            self.day_of_month as f64,
            self.month as f64,
        ]
    }
}

/// Derive features for every record. One bad date fails the whole batch.
pub fn derive_features<T: Dated>(records: &[T]) -> Result<Vec<CalendarFeatures>> {
    Ok(parse_dates(records)?
        .into_iter()
        .map(CalendarFeatures::from_date)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomeRecord;

    #[test]
    fn test_from_date() {
        // 2024-03-01 was a Friday
        let f = CalendarFeatures::from_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(f.day_of_week, 4);
        assert_eq!(f.day_of_month, 1);
        assert_eq!(f.month, 3);
        assert!(f.is_weekday());
        assert_eq!(f.to_vector(), [4.0, 1.0, 3.0]);
    }

    #[test]
    fn test_weekend() {
        // 2024-03-03 was a Sunday
        let f = CalendarFeatures::from_date(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(f.day_of_week, 6);
        assert!(!f.is_weekday());
    }

    #[test]
    fn test_derive_features_batch() {
        let records = vec![
            IncomeRecord::new(1000.0, "2024-01-01"),
            IncomeRecord::new(1200.0, "2024-12-31"),
        ];
        let features = derive_features(&records).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].day_of_week, 0); // Monday
        assert_eq!(features[1].month, 12);
        assert_eq!(features[1].day_of_month, 31);
    }

    #[test]
    fn test_derive_features_fail_fast() {
        let records = vec![
            IncomeRecord::new(1000.0, "2024-01-01"),
            IncomeRecord::new(1200.0, "2024-02-30"),
        ];
        assert!(derive_features(&records).is_err());
    }
}
