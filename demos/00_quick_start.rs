/// quick start - generate the schedule of a small monthly loan
use installment_schedule::chrono::NaiveDate;
use installment_schedule::{generate_schedule, LoanTerms, Money, Rate, Uuid};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let terms = LoanTerms::new(
        Money::from_major(1_000),
        Rate::from_percentage(10),
        NaiveDate::from_ymd_opt(2025, 12, 19).ok_or("invalid start date")?,
        4,
        "1m".parse()?,
    );

    let schedule = generate_schedule(Uuid::new_v4(), terms)?;

    println!("{}", schedule.json());

    Ok(())
}
