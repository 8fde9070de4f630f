use thiserror::Error;

use crate::decimal::Money;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid loan terms: {message}")]
    InvalidLoanTerms {
        message: String,
    },

    #[error("invalid periodicity: {value}")]
    InvalidPeriodicity {
        value: String,
    },

    #[error("payment not found: {index}")]
    PaymentNotFound {
        index: u32,
    },

    #[error("invalid reduction amount: {amount}")]
    InvalidReductionAmount {
        amount: Money,
    },

    #[error("excessive reduction: available {available}, requested {requested}")]
    ExcessiveReduction {
        available: Money,
        requested: Money,
    },

    #[error("invalid loan state: {message}")]
    InvalidLoanState {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
