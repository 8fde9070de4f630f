use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// calendar unit of a payment period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
}

impl PeriodUnit {
    fn code(self) -> char {
        match self {
            PeriodUnit::Day => 'd',
            PeriodUnit::Week => 'w',
            PeriodUnit::Month => 'm',
        }
    }

    fn from_code(code: char) -> Option<Self> {
        match code {
            'd' => Some(PeriodUnit::Day),
            'w' => Some(PeriodUnit::Week),
            'm' => Some(PeriodUnit::Month),
            _ => None,
        }
    }
}

/// interval between two consecutive payments, e.g. `1m`, `2w`, `10d`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Periodicity {
    value: u32,
    unit: PeriodUnit,
}

impl Periodicity {
    pub fn new(value: u32, unit: PeriodUnit) -> Result<Self> {
        if value == 0 {
            return Err(ScheduleError::InvalidPeriodicity {
                value: format!("0{}", unit.code()),
            });
        }
        Ok(Self { value, unit })
    }

    pub fn days(value: u32) -> Result<Self> {
        Self::new(value, PeriodUnit::Day)
    }

    pub fn weeks(value: u32) -> Result<Self> {
        Self::new(value, PeriodUnit::Week)
    }

    pub fn months(value: u32) -> Result<Self> {
        Self::new(value, PeriodUnit::Month)
    }

    /// one calendar month
    pub fn monthly() -> Self {
        Self { value: 1, unit: PeriodUnit::Month }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn unit(&self) -> PeriodUnit {
        self.unit
    }

    /// date that lies `count` periods after `start`
    ///
    /// Computed from `start` directly rather than by stepping, so a loan
    /// starting on the 31st keeps falling on month ends.
    pub fn advance(&self, start: NaiveDate, count: u32) -> Result<NaiveDate> {
        let steps = self.value.checked_mul(count).ok_or_else(|| overflow(start))?;
        let date = match self.unit {
            PeriodUnit::Day => start.checked_add_signed(Duration::days(i64::from(steps))),
            PeriodUnit::Week => start.checked_add_signed(Duration::weeks(i64::from(steps))),
            PeriodUnit::Month => start.checked_add_months(Months::new(steps)),
        };
        date.ok_or_else(|| overflow(start))
    }
}

fn overflow(start: NaiveDate) -> ScheduleError {
    ScheduleError::InvalidLoanTerms {
        message: format!("due dates overflow the calendar from {}", start),
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.code())
    }
}

impl FromStr for Periodicity {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ScheduleError::InvalidPeriodicity { value: s.to_string() };

        let s_trimmed = s.trim();
        let mut chars = s_trimmed.chars();
        let unit = chars
            .next_back()
            .and_then(PeriodUnit::from_code)
            .ok_or_else(invalid)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u32 = digits.parse().map_err(|_| invalid())?;

        Periodicity::new(value, unit).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Periodicity {
    type Error = ScheduleError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Periodicity> for String {
    fn from(p: Periodicity) -> Self {
        p.to_string()
    }
}

/// immutable terms a schedule is generated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub amount: Money,
    pub annual_rate: Rate,
    pub start_date: NaiveDate,
    pub number_of_payments: u32,
    pub periodicity: Periodicity,
}

impl LoanTerms {
    pub fn new(
        amount: Money,
        annual_rate: Rate,
        start_date: NaiveDate,
        number_of_payments: u32,
        periodicity: Periodicity,
    ) -> Self {
        Self {
            amount,
            annual_rate,
            start_date,
            number_of_payments,
            periodicity,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(ScheduleError::InvalidLoanTerms {
                message: format!("amount must be positive, got {}", self.amount),
            });
        }

        if self.annual_rate.is_negative() {
            return Err(ScheduleError::InvalidLoanTerms {
                message: format!("interest rate must not be negative, got {}", self.annual_rate),
            });
        }

        if self.number_of_payments == 0 {
            return Err(ScheduleError::InvalidLoanTerms {
                message: "number of payments must be at least 1".to_string(),
            });
        }

        // the final due date must exist
        self.periodicity
            .advance(self.start_date, self.number_of_payments)?;

        Ok(())
    }

    /// due date of the payment with the given 1-based index
    pub fn due_date(&self, index: u32) -> Result<NaiveDate> {
        self.periodicity.advance(self.start_date, index)
    }
}
