//! Serializable views handed to the api layer.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{LoanId, Periodicity};

use super::{Payment, Recalculation, Schedule};

/// one schedule line as exchanged with callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentView {
    pub index: u32,
    pub date: NaiveDate,
    pub principal: Money,
    pub interest: Money,
}

impl From<&Payment> for PaymentView {
    fn from(payment: &Payment) -> Self {
        PaymentView {
            index: payment.index,
            date: payment.due_date,
            principal: payment.principal,
            interest: payment.interest,
        }
    }
}

/// loan terms and payments grouped for listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub loan_id: LoanId,
    pub amount: Money,
    pub annual_rate: Rate,
    pub start_date: NaiveDate,
    pub number_of_payments: u32,
    pub periodicity: Periodicity,
    pub total_interest: Money,
    pub payments: Vec<PaymentView>,
}

impl ScheduleView {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        ScheduleView {
            loan_id: schedule.loan_id,
            amount: schedule.terms.amount,
            annual_rate: schedule.terms.annual_rate,
            start_date: schedule.terms.start_date,
            number_of_payments: schedule.terms.number_of_payments,
            periodicity: schedule.terms.periodicity,
            total_interest: schedule.total_interest(),
            payments: schedule.payments().iter().map(PaymentView::from).collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Recalculation {
    /// the replaced payments, as returned to callers after a reduction
    pub fn suffix_view(&self) -> Vec<PaymentView> {
        self.new_suffix.iter().map(PaymentView::from).collect()
    }
}
