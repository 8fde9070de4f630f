use tracing::debug;

use crate::annuity::{fixed_installment, periodic_rate};
use crate::config::ScheduleConfig;
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::types::{LoanId, LoanTerms};

use super::{Amortizer, Payment, Schedule};

/// builds the initial declining-balance schedule of a loan
#[derive(Debug, Clone, Default)]
pub struct ScheduleGenerator {
    config: ScheduleConfig,
}

impl ScheduleGenerator {
    pub fn new(config: ScheduleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// generate the full schedule for `terms`
    ///
    /// Every payment gets the same installment, split into interest on the
    /// running balance and principal. The final payment absorbs cent
    /// rounding so the principal column sums to the loan amount exactly.
    pub fn generate(
        &self,
        loan_id: LoanId,
        terms: &LoanTerms,
        events: &mut EventStore,
    ) -> Result<Schedule> {
        terms.validate()?;

        let rate = periodic_rate(terms.annual_rate, terms.periodicity, &self.config)?;
        let installment = fixed_installment(terms.amount, rate, terms.number_of_payments, &self.config)?;

        let mut payments = (1..=terms.number_of_payments)
            .map(|index| {
                Ok(Payment {
                    loan_id,
                    index,
                    due_date: terms.due_date(index)?,
                    principal: Money::ZERO,
                    interest: Money::ZERO,
                    principal_fixed: false,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let amortizer = Amortizer {
            loan_id,
            rate,
            installment,
            config: &self.config,
        };
        amortizer.run(terms.amount, &mut payments, events);

        let schedule = Schedule::from_parts(loan_id, terms.clone(), payments);

        if let (Some(first), Some(last)) = (schedule.payments.first(), schedule.payments.last()) {
            events.emit(Event::ScheduleGenerated {
                loan_id,
                amount: terms.amount,
                installment,
                number_of_payments: terms.number_of_payments,
                first_due_date: first.due_date,
                final_due_date: last.due_date,
            });
        }

        debug!(
            loan_id = %loan_id,
            amount = %terms.amount,
            periodic_rate = %rate.as_decimal(),
            installment = %installment,
            payments = terms.number_of_payments,
            "generated schedule"
        );

        Ok(schedule)
    }
}

/// generate a schedule with the default rounding policy
pub fn generate_schedule(loan_id: LoanId, terms: LoanTerms) -> Result<Schedule> {
    let mut events = EventStore::new();
    ScheduleGenerator::default().generate(loan_id, &terms, &mut events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Rate, RoundingRule};
    use crate::errors::ScheduleError;
    use crate::types::Periodicity;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms(amount: Money, rate: Rate, n: u32, periodicity: Periodicity) -> LoanTerms {
        LoanTerms::new(amount, rate, date(2025, 12, 19), n, periodicity)
    }

    fn assert_amortizes(schedule: &Schedule) {
        assert_eq!(schedule.total_principal(), schedule.terms.amount);
        assert!(schedule.verify().is_ok());

        let balances = schedule.outstanding_balances();
        let mut previous = schedule.terms.amount;
        for balance in &balances {
            assert!(*balance < previous, "balance must strictly decrease");
            previous = *balance;
        }
        assert_eq!(balances.last(), Some(&Money::ZERO));

        for payment in schedule.payments() {
            assert!(!payment.principal.is_negative());
            assert!(!payment.interest.is_negative());
        }
    }

    #[test]
    fn test_worked_example() {
        let loan_id = Uuid::new_v4();
        let mut events = EventStore::new();
        let schedule = ScheduleGenerator::default()
            .generate(
                loan_id,
                &terms(Money::from_major(1_000), Rate::from_percentage(10), 4, Periodicity::monthly()),
                &mut events,
            )
            .unwrap();

        let principal: Vec<Money> = schedule.payments().iter().map(|p| p.principal).collect();
        let interest: Vec<Money> = schedule.payments().iter().map(|p| p.interest).collect();

        assert_eq!(
            principal,
            vec![
                Money::from_minor(24_690),
                Money::from_minor(24_895),
                Money::from_minor(25_103),
                Money::from_minor(25_312),
            ]
        );
        assert_eq!(
            interest,
            vec![
                Money::from_minor(833),
                Money::from_minor(628),
                Money::from_minor(420),
                Money::from_minor(211),
            ]
        );
        for payment in schedule.payments() {
            assert_eq!(payment.installment(), Money::from_minor(25_523));
            assert_eq!(payment.loan_id, loan_id);
            assert!(!payment.principal_fixed);
        }

        let dates: Vec<NaiveDate> = schedule.payments().iter().map(|p| p.due_date).collect();
        assert_eq!(
            dates,
            vec![date(2026, 1, 19), date(2026, 2, 19), date(2026, 3, 19), date(2026, 4, 19)]
        );

        assert_amortizes(&schedule);
        assert!(matches!(
            events.events().last(),
            Some(Event::ScheduleGenerated { number_of_payments: 4, .. })
        ));
    }

    #[rstest]
    #[case(dec!(1000), dec!(0.1), 4, "1m")]
    #[case(dec!(1000), dec!(0.12), 12, "1m")]
    #[case(dec!(250000), dec!(0.0675), 360, "1m")]
    #[case(dec!(100), dec!(0), 3, "1m")]
    #[case(dec!(999.99), dec!(0), 7, "2w")]
    #[case(dec!(5000), dec!(0.2), 1, "1m")]
    #[case(dec!(0.05), dec!(0.1), 1, "1m")]
    #[case(dec!(1234.56), dec!(0.18), 26, "2w")]
    #[case(dec!(3000), dec!(0.365), 30, "10d")]
    fn test_principal_sums_to_amount(
        #[case] amount: rust_decimal::Decimal,
        #[case] rate: rust_decimal::Decimal,
        #[case] n: u32,
        #[case] periodicity: &str,
    ) {
        let schedule = generate_schedule(
            Uuid::new_v4(),
            terms(
                Money::from_decimal(amount),
                Rate::from_decimal(rate),
                n,
                periodicity.parse().unwrap(),
            ),
        )
        .unwrap();

        assert_eq!(schedule.len(), n as usize);
        assert_amortizes(&schedule);
    }

    #[test]
    fn test_zero_rate_has_no_interest() {
        let schedule = generate_schedule(
            Uuid::new_v4(),
            terms(Money::from_major(100), Rate::ZERO, 3, Periodicity::monthly()),
        )
        .unwrap();

        assert!(schedule.payments().iter().all(|p| p.interest.is_zero()));
        let principal: Vec<Money> = schedule.payments().iter().map(|p| p.principal).collect();
        assert_eq!(
            principal,
            vec![Money::from_minor(3_333), Money::from_minor(3_333), Money::from_minor(3_334)]
        );
    }

    #[test]
    fn test_zero_rate_overshooting_installment_has_no_interest() {
        // 200 / 3 rounds the installment up to 66.67
        let schedule = generate_schedule(
            Uuid::new_v4(),
            terms(Money::from_major(200), Rate::ZERO, 3, Periodicity::monthly()),
        )
        .unwrap();

        assert!(schedule.payments().iter().all(|p| p.interest.is_zero()));
        assert_eq!(schedule.total_interest(), Money::ZERO);
        let principal: Vec<Money> = schedule.payments().iter().map(|p| p.principal).collect();
        assert_eq!(
            principal,
            vec![Money::from_minor(6_667), Money::from_minor(6_667), Money::from_minor(6_666)]
        );
        assert_amortizes(&schedule);
    }

    #[test]
    fn test_tiny_loan_caps_principal_at_balance() {
        // 0.05 over 10 periods: the 0.01 installment retires the loan after 5
        let loan_id = Uuid::new_v4();
        let mut events = EventStore::new();
        let schedule = ScheduleGenerator::default()
            .generate(
                loan_id,
                &terms(Money::from_minor(5), Rate::ZERO, 10, Periodicity::monthly()),
                &mut events,
            )
            .unwrap();

        assert_eq!(schedule.total_principal(), Money::from_minor(5));
        assert_eq!(schedule.total_interest(), Money::ZERO);
        assert!(schedule.verify().is_ok());
        assert!(schedule.outstanding_balances().iter().all(|b| !b.is_negative()));

        let clamped: Vec<u32> = events
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::SplitClamped { payment_index, applied_principal, .. } => {
                    assert!(applied_principal.is_zero());
                    Some(*payment_index)
                }
                _ => None,
            })
            .collect();
        assert_eq!(clamped, vec![6, 7, 8, 9]);
        assert!(events.events().iter().any(|e| matches!(
            e,
            Event::ResidualCorrected { payment_index: 10, .. }
        )));
    }

    #[test]
    fn test_long_high_rate_term_still_amortizes() {
        let schedule = generate_schedule(
            Uuid::new_v4(),
            terms(
                Money::from_str_exact("74230.57").unwrap(),
                Rate::from_decimal(dec!(4.1621)),
                107,
                Periodicity::months(3).unwrap(),
            ),
        )
        .unwrap();

        assert_eq!(schedule.len(), 107);
        assert_eq!(schedule.total_principal(), schedule.terms.amount);
        assert!(schedule.verify().is_ok());
    }

    #[test]
    fn test_single_payment_retires_everything() {
        let schedule = generate_schedule(
            Uuid::new_v4(),
            terms(Money::from_major(1_000), Rate::from_percentage(12), 1, Periodicity::monthly()),
        )
        .unwrap();

        let only = schedule.payment(1).unwrap();
        assert_eq!(only.principal, Money::from_major(1_000));
        assert_eq!(only.interest, Money::from_major(10));
    }

    #[test]
    fn test_weekly_dates() {
        let schedule = generate_schedule(
            Uuid::new_v4(),
            terms(Money::from_major(1_000), Rate::from_percentage(10), 3, Periodicity::weeks(1).unwrap()),
        )
        .unwrap();

        let p = schedule.payments();
        assert_eq!((p[1].due_date - p[0].due_date).num_days(), 7);
        assert_eq!((p[2].due_date - p[1].due_date).num_days(), 7);
        assert_eq!(p[0].due_date, date(2025, 12, 26));
    }

    #[test]
    fn test_half_even_rounding() {
        let generator =
            ScheduleGenerator::new(ScheduleConfig::default().with_rounding(RoundingRule::HalfEven))
                .unwrap();
        let mut events = EventStore::new();
        let schedule = generator
            .generate(
                Uuid::new_v4(),
                &terms(Money::from_major(1_000), Rate::from_percentage(10), 4, Periodicity::monthly()),
                &mut events,
            )
            .unwrap();

        assert_eq!(schedule.total_principal(), Money::from_major(1_000));
        assert_eq!(generator.config().rounding, RoundingRule::HalfEven);
    }

    #[test]
    fn test_invalid_terms_rejected() {
        let result = generate_schedule(
            Uuid::new_v4(),
            terms(Money::ZERO, Rate::from_percentage(10), 4, Periodicity::monthly()),
        );
        assert!(matches!(result, Err(ScheduleError::InvalidLoanTerms { .. })));

        let result = generate_schedule(
            Uuid::new_v4(),
            terms(Money::from_major(1_000), Rate::from_percentage(10), 0, Periodicity::monthly()),
        );
        assert!(matches!(result, Err(ScheduleError::InvalidLoanTerms { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = ScheduleGenerator::new(ScheduleConfig::default().with_rate_scale(0));
        assert!(matches!(result, Err(ScheduleError::InvalidConfiguration { .. })));
    }
}
