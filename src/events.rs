use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::LoanId;

/// events emitted while schedules are generated or recalculated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ScheduleGenerated {
        loan_id: LoanId,
        amount: Money,
        installment: Money,
        number_of_payments: u32,
        first_due_date: NaiveDate,
        final_due_date: NaiveDate,
    },
    PrincipalReduced {
        loan_id: LoanId,
        payment_index: u32,
        reduction: Money,
        old_principal: Money,
        new_principal: Money,
    },
    ScheduleRecalculated {
        loan_id: LoanId,
        from_index: u32,
        new_installment: Option<Money>,
        replaced_payments: u32,
    },
    /// rounding left a period's principal outside [0, balance]
    SplitClamped {
        loan_id: LoanId,
        payment_index: u32,
        computed_principal: Money,
        applied_principal: Money,
    },
    ResidualCorrected {
        loan_id: LoanId,
        payment_index: u32,
        residual: Money,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
