//! Annuity arithmetic shared by schedule generation and recalculation.
//!
//! All money results are quantized to cents with the configured
//! [`RoundingRule`](crate::decimal::RoundingRule); per-period rates are
//! quantized to `rate_scale` places before use.

use rust_decimal::Decimal;

use crate::config::ScheduleConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::types::Periodicity;

/// interest/principal split of one installment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSplit {
    pub interest: Money,
    pub principal: Money,
    /// principal had to be clamped and must be compensated by residual correction
    pub clamped: bool,
}

/// per-period rate implied by `periodicity`
///
/// `annual_rate × value / periods_per_year(unit)`, e.g. 12% monthly is 1%.
pub fn periodic_rate(
    annual_rate: Rate,
    periodicity: Periodicity,
    config: &ScheduleConfig,
) -> Result<Rate> {
    if periodicity.value() == 0 {
        return Err(ScheduleError::InvalidPeriodicity {
            value: periodicity.to_string(),
        });
    }

    let fraction = Decimal::from(periodicity.value()) / config.periods_per_year(periodicity.unit());
    let rate = annual_rate
        .as_decimal()
        .checked_mul(fraction)
        .ok_or_else(|| ScheduleError::CalculationError {
            message: format!("periodic rate overflow for {} at {}", periodicity, annual_rate),
        })?;

    Ok(Rate::from_decimal(rate).quantize(config.rate_scale, config.rounding))
}

/// constant installment that amortizes `balance` to zero over `remaining_periods`
///
/// `A = P·r / (1 − (1+r)^−n)`, `P / n` when `r = 0`, `P·(1+r)` when `n = 1`.
/// The discount factor only shrinks, so long or high-rate terms never
/// overflow; once it underflows to zero the installment is pure interest.
pub fn fixed_installment(
    balance: Money,
    rate: Rate,
    remaining_periods: u32,
    config: &ScheduleConfig,
) -> Result<Money> {
    if remaining_periods == 0 {
        return Err(ScheduleError::CalculationError {
            message: "installment requires at least one remaining period".to_string(),
        });
    }

    if balance.is_zero() {
        return Ok(Money::ZERO);
    }

    let principal = balance.as_decimal();
    let r = rate.as_decimal();

    if r.is_zero() {
        let per_period = principal / Decimal::from(remaining_periods);
        return Ok(Money::from_decimal_with(per_period, config.rounding));
    }

    if remaining_periods == 1 {
        return Ok(Money::from_decimal_with(principal * (Decimal::ONE + r), config.rounding));
    }

    let discount = discount_factor(r, remaining_periods);
    let interest_part = principal
        .checked_mul(r)
        .ok_or_else(|| overflow("installment numerator"))?;
    let installment = interest_part
        .checked_div(Decimal::ONE - discount)
        .ok_or_else(|| overflow("installment denominator"))?;

    Ok(Money::from_decimal_with(installment, config.rounding))
}

/// `(1 + r)^−n`
///
/// Dividing by a base above one can only underflow, which reads as zero.
fn discount_factor(r: Decimal, periods: u32) -> Decimal {
    let base = Decimal::ONE + r;
    let mut discount = Decimal::ONE;
    for _ in 0..periods {
        if discount.is_zero() {
            break;
        }
        discount = discount.checked_div(base).unwrap_or(Decimal::ZERO);
    }
    discount
}

fn overflow(what: &str) -> ScheduleError {
    ScheduleError::CalculationError {
        message: format!("{} overflowed decimal range", what),
    }
}

/// split one installment into interest on `balance` and the principal remainder
pub fn split_period(
    balance: Money,
    rate: Rate,
    installment: Money,
    config: &ScheduleConfig,
) -> PeriodSplit {
    let interest = balance.mul_rate(rate, config.rounding);
    let principal = installment - interest;

    if principal.is_negative() {
        PeriodSplit {
            interest,
            principal: Money::ZERO,
            clamped: true,
        }
    } else {
        PeriodSplit {
            interest,
            principal,
            clamped: false,
        }
    }
}

/// fold the rounding residual into the final payment
///
/// Principal always takes `residual`. When principal fell short
/// (`residual > 0`) interest gives the same amount back, keeping the
/// installment unchanged, as long as it stays non-negative and the run had
/// no clamped periods. Interest is never raised above what the balance
/// earned, so an overshooting installment only lowers principal.
pub fn absorb_residual(
    residual: Money,
    principal: &mut Money,
    interest: &mut Money,
    run_was_clamped: bool,
) {
    if residual.is_zero() {
        return;
    }

    *principal += residual;

    let adjusted_interest = *interest - residual;
    if !run_was_clamped && residual.is_positive() && !adjusted_interest.is_negative() {
        *interest = adjusted_interest;
    }
}
