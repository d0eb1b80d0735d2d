//! Biweekly payroll periods (quinzenas).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::PayrollError;

/// Half of a month covered by a payroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quinzena {
    /// Days 1 to 15.
    Primeira,
    /// Day 16 to the last day of the month.
    Segunda,
}

impl Quinzena {
    /// Returns the ordinal (1 or 2).
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::Primeira => 1,
            Self::Segunda => 2,
        }
    }

    /// Builds a quinzena from its ordinal.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Primeira),
            2 => Some(Self::Segunda),
            _ => None,
        }
    }
}

/// Competence of a payroll: year, month and half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayrollPeriod {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Which half of the month.
    pub quinzena: Quinzena,
}

impl PayrollPeriod {
    /// Creates a period after checking the month.
    pub fn new(year: i32, month: u32, quinzena: Quinzena) -> Result<Self, PayrollError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(PayrollError::InvalidPeriod { year, month });
        }
        Ok(Self {
            year,
            month,
            quinzena,
        })
    }

    /// First day covered by the period.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        let day = match self.quinzena {
            Quinzena::Primeira => 1,
            Quinzena::Segunda => 16,
        };
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_default()
    }

    /// Last day covered by the period.
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        match self.quinzena {
            Quinzena::Primeira => {
                NaiveDate::from_ymd_opt(self.year, self.month, 15).unwrap_or_default()
            }
            Quinzena::Segunda => last_day_of_month(self.year, self.month),
        }
    }

    /// Returns true if the date falls within the period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// Human-readable label, e.g. `1ª quinzena 03/2026`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}ª quinzena {:02}/{}",
            self.quinzena.number(),
            self.month,
            self.year
        )
    }

    /// The period containing the given date.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            quinzena: if date.day() <= 15 {
                Quinzena::Primeira
            } else {
                Quinzena::Segunda
            },
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_half_bounds() {
        let period = PayrollPeriod::new(2026, 3, Quinzena::Primeira).unwrap();
        assert_eq!(period.start_date(), date(2026, 3, 1));
        assert_eq!(period.end_date(), date(2026, 3, 15));
    }

    #[rstest]
    #[case(2026, 2, 28)]
    #[case(2028, 2, 29)]
    #[case(2026, 4, 30)]
    #[case(2026, 12, 31)]
    fn test_second_half_ends_on_last_day(#[case] year: i32, #[case] month: u32, #[case] last: u32) {
        let period = PayrollPeriod::new(year, month, Quinzena::Segunda).unwrap();
        assert_eq!(period.start_date(), date(year, month, 16));
        assert_eq!(period.end_date(), date(year, month, last));
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(matches!(
            PayrollPeriod::new(2026, 13, Quinzena::Primeira),
            Err(PayrollError::InvalidPeriod { month: 13, .. })
        ));
    }

    #[test]
    fn test_containing_and_label() {
        let period = PayrollPeriod::containing(date(2026, 7, 16));
        assert_eq!(period.quinzena, Quinzena::Segunda);
        assert!(period.contains_date(date(2026, 7, 31)));
        assert!(!period.contains_date(date(2026, 7, 15)));
        assert_eq!(period.label(), "2ª quinzena 07/2026");
    }
}
