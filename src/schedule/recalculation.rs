use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annuity::{fixed_installment, periodic_rate};
use crate::config::ScheduleConfig;
use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::events::{Event, EventStore};
use crate::types::LoanId;

use super::{Amortizer, Payment, Schedule};

/// outcome of a principal reduction, split at the target payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recalculation {
    pub loan_id: LoanId,
    pub target_index: u32,
    /// payments before the target, identical to the prior schedule
    pub unchanged_prefix: Vec<Payment>,
    /// the target payment and every later one
    pub new_suffix: Vec<Payment>,
    /// installment used for the payments after the target
    pub new_installment: Option<Money>,
}

impl Recalculation {
    /// prefix followed by the new suffix
    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.unchanged_prefix.iter().chain(self.new_suffix.iter())
    }

    pub fn total_principal(&self) -> Money {
        self.payments().map(|p| p.principal).sum()
    }
}

/// re-amortizes a schedule after a manual principal reduction
#[derive(Debug, Clone, Default)]
pub struct ScheduleRecalculator {
    config: ScheduleConfig,
}

impl ScheduleRecalculator {
    pub fn new(config: ScheduleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// lower the principal of payment `target_index` by `reduction`
    ///
    /// The target keeps its billed interest. The debt it no longer retires
    /// is spread over the remaining payments with a new installment, so the
    /// loan still closes on its original final date. Earlier payments are
    /// returned untouched.
    pub fn recalculate(
        &self,
        prior: &Schedule,
        target_index: u32,
        reduction: Money,
        events: &mut EventStore,
    ) -> Result<Recalculation> {
        prior.verify()?;

        let target = prior
            .payment(target_index)
            .ok_or(ScheduleError::PaymentNotFound { index: target_index })?;

        if !reduction.is_positive() {
            return Err(ScheduleError::InvalidReductionAmount { amount: reduction });
        }

        let remaining_periods = prior.terms.number_of_payments - target_index;
        // nothing follows the final payment to carry the reduced debt
        let available = if remaining_periods == 0 {
            Money::ZERO
        } else {
            target.principal
        };
        if reduction > available {
            return Err(ScheduleError::ExcessiveReduction {
                available,
                requested: reduction,
            });
        }

        let split = (target_index - 1) as usize;
        let unchanged_prefix = prior.payments()[..split].to_vec();

        let paid_before: Money = unchanged_prefix.iter().map(|p| p.principal).sum();
        let balance_before = prior
            .balance_before(target_index)
            .ok_or(ScheduleError::PaymentNotFound { index: target_index })?;
        if balance_before != prior.terms.amount - paid_before {
            return Err(ScheduleError::InvalidLoanState {
                message: format!(
                    "balance before payment {} is {} but {} of {} was already retired",
                    target_index, balance_before, paid_before, prior.terms.amount
                ),
            });
        }

        let mut new_target = target.clone();
        new_target.principal = target.principal - reduction;
        new_target.principal_fixed = true;
        let balance_after_target = balance_before - new_target.principal;

        let rate = periodic_rate(prior.terms.annual_rate, prior.terms.periodicity, &self.config)?;
        let installment =
            fixed_installment(balance_after_target, rate, remaining_periods, &self.config)?;

        let mut following = prior.payments()[split + 1..].to_vec();
        let amortizer = Amortizer {
            loan_id: prior.loan_id,
            rate,
            installment,
            config: &self.config,
        };
        amortizer.run(balance_after_target, &mut following, events);

        events.emit(Event::PrincipalReduced {
            loan_id: prior.loan_id,
            payment_index: target_index,
            reduction,
            old_principal: target.principal,
            new_principal: new_target.principal,
        });

        let mut new_suffix = Vec::with_capacity(following.len() + 1);
        new_suffix.push(new_target);
        new_suffix.extend(following);

        events.emit(Event::ScheduleRecalculated {
            loan_id: prior.loan_id,
            from_index: target_index,
            new_installment: Some(installment),
            replaced_payments: new_suffix.len() as u32,
        });

        debug!(
            loan_id = %prior.loan_id,
            target = target_index,
            reduction = %reduction,
            balance_after_target = %balance_after_target,
            installment = %installment,
            "recalculated schedule after principal reduction"
        );

        Ok(Recalculation {
            loan_id: prior.loan_id,
            target_index,
            unchanged_prefix,
            new_suffix,
            new_installment: Some(installment),
        })
    }
}

/// recalculate with the default rounding policy
pub fn recalculate_from_reduction(
    prior: &Schedule,
    target_index: u32,
    reduction: Money,
) -> Result<Recalculation> {
    let mut events = EventStore::new();
    ScheduleRecalculator::default().recalculate(prior, target_index, reduction, &mut events)
}
