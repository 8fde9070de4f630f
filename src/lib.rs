pub mod annuity;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod schedule;
pub mod types;

// re-export key types
pub use annuity::{absorb_residual, fixed_installment, periodic_rate, split_period, PeriodSplit};
pub use config::ScheduleConfig;
pub use decimal::{Money, Rate, RoundingRule};
pub use errors::{Result, ScheduleError};
pub use events::{Event, EventStore};
pub use schedule::{
    generate_schedule, recalculate_from_reduction, Payment, PaymentView, Recalculation, Schedule,
    ScheduleGenerator, ScheduleRecalculator, ScheduleView,
};
pub use types::{LoanId, LoanTerms, PeriodUnit, Periodicity};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
