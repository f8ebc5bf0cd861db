/// exit analysis - IRR and equity multiple for every holding period
use property_projection_rs::chrono::NaiveDate;
use property_projection_rs::{
    project, ExitAssumptions, Money, PriceStage, PropertyLoanConfig, Rate, SalePricePath,
    StructureClass,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let base = PropertyLoanConfig::builder()
        .purchase_price(Money::from_yen(80_000_000))
        .owner_equity(Money::from_yen(16_000_000))
        .building_price(Money::from_yen(40_000_000))
        .structure(StructureClass::SteelHeavy)
        .occupancy_rate(Rate::from_percentage(dec!(93)))
        .monthly_rent(Money::from_yen(540_000))
        .rent_adjustment(3, 3, Rate::from_percentage(dec!(2)))
        .loan_rate(Rate::from_percentage(dec!(1.8)))
        .loan_term_years(25)
        .loan_start_date(NaiveDate::from_ymd_opt(2025, 1, 1).ok_or("bad date")?)
        .build()?;

    // same deal with a market that holds its value
    let mut steady = base.clone();
    steady.exit_assumptions = ExitAssumptions {
        price_path: SalePricePath {
            stages: vec![PriceStage {
                through_year: 5,
                annual_change: Rate::from_decimal(dec!(-0.005)),
            }],
            terminal_change: Rate::ZERO,
        },
        ..ExitAssumptions::default()
    };

    let declining = project(&base)?;
    let holding = project(&steady)?;

    println!("year   sale price   irr (declining)   irr (steady)   multiple");
    for (d, s) in declining.exit.iter().zip(&holding.exit) {
        let show = |irr: Option<Rate>| irr.map(|r| r.to_string()).unwrap_or_else(|| "n/a".into());
        println!(
            "{:>4}  {:>11}  {:>16}  {:>13}  {:>9}",
            d.year,
            d.sale_price.round_yen(),
            show(d.irr),
            show(s.irr),
            d.equity_multiple.map(|m| m.round_dp(2).to_string()).unwrap_or_else(|| "n/a".into()),
        );
    }

    Ok(())
}
