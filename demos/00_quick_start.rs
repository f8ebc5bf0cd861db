/// quick start - project a small leveraged rental
use property_projection_rs::chrono::NaiveDate;
use property_projection_rs::{
    project, ExpenseRule, ExpenseRules, Money, PropertyLoanConfig, Rate, StructureClass,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 30M yen RC apartment, 10% down, 2% over 30 years
    let config = PropertyLoanConfig::builder()
        .purchase_price(Money::from_yen(30_000_000))
        .owner_equity(Money::from_yen(3_000_000))
        .building_price(Money::from_yen(18_000_000))
        .structure(StructureClass::Rc)
        .occupancy_rate(Rate::from_percentage(dec!(95)))
        .monthly_rent(Money::from_yen(160_000))
        .rent_adjustment(2, 2, Rate::from_percentage(dec!(1)))
        .loan_rate(Rate::from_percentage(dec!(2.0)))
        .loan_term_years(30)
        .loan_start_date(NaiveDate::from_ymd_opt(2025, 4, 1).ok_or("bad date")?)
        .expenses(ExpenseRules {
            property_tax: Money::from_yen(120_000),
            management_fee: ExpenseRule::rate_of_rent(dec!(5)),
            maintenance_reserve: ExpenseRule::flat(Money::from_yen(8_000)),
            insurance: Money::from_yen(25_000),
            ..ExpenseRules::default()
        })
        .build()?;

    let result = project(&config)?;
    let summary = &result.summary;

    println!("loan amount:     {}", summary.loan_amount.round_yen());
    println!("monthly payment: {}", summary.monthly_payment.round_yen());
    println!("gross yield:     {}", summary.gross_yield);
    println!("yearly profit:   {}", summary.yearly_profit.round_yen());

    println!("\nyear  after-tax cf   cumulative");
    for row in result.annual.iter().take(10) {
        println!(
            "{:>4}  {:>12}  {:>11}",
            row.year,
            row.after_tax_cash_flow.round_yen(),
            row.cumulative_cash_flow.round_yen()
        );
    }

    Ok(())
}
