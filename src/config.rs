use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{RoundingRule, MONEY_SCALE};
use crate::errors::{Result, ScheduleError};
use crate::types::PeriodUnit;

/// numeric policy shared by generation and recalculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// fractional digits kept on the per-period rate
    pub rate_scale: u32,
    /// rounding applied to rates, installments, interest and principal
    pub rounding: RoundingRule,
    pub days_per_year: u32,
    pub weeks_per_year: u32,
    pub months_per_year: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            rate_scale: 8,
            rounding: RoundingRule::HalfUp,
            days_per_year: 365,
            weeks_per_year: 52,
            months_per_year: 12,
        }
    }
}

impl ScheduleConfig {
    pub fn with_rounding(mut self, rounding: RoundingRule) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_rate_scale(mut self, rate_scale: u32) -> Self {
        self.rate_scale = rate_scale;
        self
    }

    /// 360-day year, as used by some commercial lenders
    pub fn with_days_per_year(mut self, days: u32) -> Self {
        self.days_per_year = days;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_scale < MONEY_SCALE || self.rate_scale > 20 {
            return Err(ScheduleError::InvalidConfiguration {
                message: format!(
                    "rate scale must be between {} and 20, got {}",
                    MONEY_SCALE, self.rate_scale
                ),
            });
        }

        for (name, value) in [
            ("days_per_year", self.days_per_year),
            ("weeks_per_year", self.weeks_per_year),
            ("months_per_year", self.months_per_year),
        ] {
            if value == 0 {
                return Err(ScheduleError::InvalidConfiguration {
                    message: format!("{} must be positive", name),
                });
            }
        }

        Ok(())
    }

    /// number of periods of `unit` in one rate year
    pub fn periods_per_year(&self, unit: PeriodUnit) -> Decimal {
        let count = match unit {
            PeriodUnit::Day => self.days_per_year,
            PeriodUnit::Week => self.weeks_per_year,
            PeriodUnit::Month => self.months_per_year,
        };
        Decimal::from(count)
    }
}
