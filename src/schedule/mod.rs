pub mod generator;
pub mod recalculation;
pub mod serialization;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::annuity::{absorb_residual, split_period};
use crate::config::ScheduleConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::events::{Event, EventStore};
use crate::types::{LoanId, LoanTerms};

pub use generator::{generate_schedule, ScheduleGenerator};
pub use recalculation::{recalculate_from_reduction, Recalculation, ScheduleRecalculator};
pub use serialization::{PaymentView, ScheduleView};

/// one line of an amortization schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub loan_id: LoanId,
    /// 1-based position in the schedule
    pub index: u32,
    pub due_date: NaiveDate,
    pub principal: Money,
    pub interest: Money,
    /// principal was set by a manual reduction and survives later recalculations
    #[serde(default)]
    pub principal_fixed: bool,
}

impl Payment {
    pub fn installment(&self) -> Money {
        self.principal + self.interest
    }
}

/// ordered payments of one loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub loan_id: LoanId,
    pub terms: LoanTerms,
    payments: Vec<Payment>,
}

impl Schedule {
    /// rebuild a schedule from stored parts
    ///
    /// No checks are made here; recalculation verifies the schedule before
    /// touching it.
    pub fn from_parts(loan_id: LoanId, terms: LoanTerms, payments: Vec<Payment>) -> Self {
        Self {
            loan_id,
            terms,
            payments,
        }
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn into_payments(self) -> Vec<Payment> {
        self.payments
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// payment with the given 1-based index
    pub fn payment(&self, index: u32) -> Option<&Payment> {
        let position = usize::try_from(index).ok()?.checked_sub(1)?;
        self.payments.get(position)
    }

    pub fn total_principal(&self) -> Money {
        self.payments.iter().map(|p| p.principal).sum()
    }

    pub fn total_interest(&self) -> Money {
        self.payments.iter().map(|p| p.interest).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.total_principal() + self.total_interest()
    }

    /// outstanding balance entering the payment, i.e. the principal still to be retired
    pub fn balance_before(&self, index: u32) -> Option<Money> {
        self.payment(index)?;
        Some(
            self.payments
                .iter()
                .filter(|p| p.index >= index)
                .map(|p| p.principal)
                .sum(),
        )
    }

    /// outstanding balance once the payment is made
    pub fn balance_after(&self, index: u32) -> Option<Money> {
        let before = self.balance_before(index)?;
        self.payment(index).map(|p| before - p.principal)
    }

    /// balance after each payment, in schedule order
    pub fn outstanding_balances(&self) -> Vec<Money> {
        let mut balance = self.terms.amount;
        self.payments
            .iter()
            .map(|p| {
                balance -= p.principal;
                balance
            })
            .collect()
    }

    /// check the schedule is internally consistent
    ///
    /// Payments must belong to this loan, be numbered 1..=n without gaps,
    /// fall on the dates implied by the terms, carry non-negative amounts,
    /// and retire exactly the loan amount.
    pub fn verify(&self) -> Result<()> {
        let expected = self.terms.number_of_payments as usize;
        if self.payments.len() != expected {
            return Err(invalid_state(format!(
                "expected {} payments, found {}",
                expected,
                self.payments.len()
            )));
        }

        for (position, payment) in self.payments.iter().enumerate() {
            let index = position as u32 + 1;

            if payment.loan_id != self.loan_id {
                return Err(invalid_state(format!(
                    "payment {} belongs to loan {}",
                    index, payment.loan_id
                )));
            }
            if payment.index != index {
                return Err(invalid_state(format!(
                    "payment at position {} is numbered {}",
                    index, payment.index
                )));
            }
            let due = self.terms.due_date(index)?;
            if payment.due_date != due {
                return Err(invalid_state(format!(
                    "payment {} due {} instead of {}",
                    index, payment.due_date, due
                )));
            }
            if payment.principal.is_negative() || payment.interest.is_negative() {
                return Err(invalid_state(format!("payment {} has a negative amount", index)));
            }
        }

        let total = self.total_principal();
        if total != self.terms.amount {
            return Err(invalid_state(format!(
                "principal sums to {} but loan amount is {}",
                total, self.terms.amount
            )));
        }

        Ok(())
    }

    /// replace the suffix starting at the recalculation's target
    ///
    /// Nothing changes unless the recalculation was made from this exact
    /// prefix and covers the rest of the schedule.
    pub fn apply(&mut self, recalculation: Recalculation) -> Result<()> {
        if recalculation.loan_id != self.loan_id {
            return Err(invalid_state(format!(
                "recalculation for loan {} applied to loan {}",
                recalculation.loan_id, self.loan_id
            )));
        }

        let split = recalculation.unchanged_prefix.len();
        if split > self.payments.len()
            || self.payments[..split] != recalculation.unchanged_prefix[..]
        {
            return Err(invalid_state("earlier payments changed since recalculation".to_string()));
        }
        if split + recalculation.new_suffix.len() != self.payments.len() {
            return Err(invalid_state(format!(
                "recalculated suffix has {} payments, expected {}",
                recalculation.new_suffix.len(),
                self.payments.len() - split
            )));
        }

        self.payments.truncate(split);
        self.payments.extend(recalculation.new_suffix);
        Ok(())
    }

    /// reduce one payment's principal and re-amortize the rest in place
    ///
    /// Returns the replaced suffix. On error the schedule is left as it was.
    pub fn reduce_principal(&mut self, index: u32, reduction: Money) -> Result<&[Payment]> {
        let recalculation = recalculate_from_reduction(self, index, reduction)?;
        let start = recalculation.unchanged_prefix.len();
        self.apply(recalculation)?;
        Ok(&self.payments[start..])
    }

    /// pretty json view of the schedule
    pub fn json(&self) -> String {
        ScheduleView::from_schedule(self)
            .to_json_pretty()
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

fn invalid_state(message: String) -> ScheduleError {
    ScheduleError::InvalidLoanState { message }
}

/// installment run over consecutive payments sharing one rate and installment
pub(crate) struct Amortizer<'a> {
    pub loan_id: LoanId,
    pub rate: Rate,
    pub installment: Money,
    pub config: &'a ScheduleConfig,
}

impl Amortizer<'_> {
    /// split every payment in `run` against a running balance starting at `opening_balance`
    ///
    /// The last payment absorbs the rounding residual so the run retires
    /// exactly `opening_balance`. Payments with a fixed principal keep it
    /// (capped at the balance) and only get fresh interest.
    pub fn run(&self, opening_balance: Money, run: &mut [Payment], events: &mut EventStore) {
        let mut balance = opening_balance;
        let mut clamped_any = false;
        let last = run.len().saturating_sub(1);

        for (position, payment) in run.iter_mut().enumerate() {
            let (interest, computed, mut clamped) = if payment.principal_fixed {
                let interest = balance.mul_rate(self.rate, self.config.rounding);
                (interest, payment.principal, false)
            } else {
                let split = split_period(balance, self.rate, self.installment, self.config);
                (split.interest, split.principal, split.clamped)
            };

            let mut principal = computed;
            // the final payment overshoots by design; residual correction settles it
            if (position != last || payment.principal_fixed) && principal > balance {
                principal = balance;
                clamped = true;
            }

            if clamped {
                clamped_any = true;
                warn!(
                    loan_id = %self.loan_id,
                    payment = payment.index,
                    computed = %computed,
                    applied = %principal,
                    "principal clamped during amortization"
                );
                events.emit(Event::SplitClamped {
                    loan_id: self.loan_id,
                    payment_index: payment.index,
                    computed_principal: computed,
                    applied_principal: principal,
                });
            }

            payment.interest = interest;
            payment.principal = principal;
            balance -= principal;
        }

        if let Some(final_payment) = run.last_mut() {
            let residual = balance;
            if !residual.is_zero() {
                absorb_residual(
                    residual,
                    &mut final_payment.principal,
                    &mut final_payment.interest,
                    clamped_any,
                );
                debug!(
                    loan_id = %self.loan_id,
                    payment = final_payment.index,
                    residual = %residual,
                    "rounding residual absorbed by final payment"
                );
                events.emit(Event::ResidualCorrected {
                    loan_id: self.loan_id,
                    payment_index: final_payment.index,
                    residual,
                });
            }
        }
    }
}
