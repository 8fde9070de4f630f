/// principal reduction - lower one payment's principal and re-amortize the rest
use installment_schedule::chrono::NaiveDate;
use installment_schedule::{
    EventStore, LoanTerms, Money, Periodicity, Rate, ScheduleGenerator, ScheduleRecalculator, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== principal reduction example ===\n");

    let mut events = EventStore::new();
    let terms = LoanTerms::new(
        Money::from_major(12_000),
        Rate::from_percentage(12),
        NaiveDate::from_ymd_opt(2025, 1, 31).ok_or("invalid start date")?,
        12,
        Periodicity::monthly(),
    );

    let mut schedule = ScheduleGenerator::default().generate(Uuid::new_v4(), &terms, &mut events)?;
    println!("initial total interest: {}", schedule.total_interest());

    // borrower asks to pay 300 less principal on payment 4
    let recalculation =
        ScheduleRecalculator::default().recalculate(&schedule, 4, Money::from_major(300), &mut events)?;

    println!("new installment: {:?}", recalculation.new_installment);
    for line in recalculation.suffix_view() {
        println!(
            "#{:>2} {}  principal {:>9}  interest {:>7}",
            line.index, line.date, line.principal, line.interest
        );
    }

    schedule.apply(recalculation)?;
    schedule.verify()?;
    println!("\nrecalculated total interest: {}", schedule.total_interest());

    println!("\nevents:");
    for event in events.take_events() {
        println!("{:?}", event);
    }

    Ok(())
}
