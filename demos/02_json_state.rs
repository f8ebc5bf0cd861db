/// json state - 万円 form input in, display json out
use property_projection_rs::{project, ManYenInput, ProjectionView, SafeTimeProvider, TimeSource};

const FORM: &str = r#"{
    "purchase_price": "4500",
    "owner_equity": "500",
    "building_price": "2700",
    "structure": "steel-light",
    "occupancy_percent": "95",
    "monthly_rent": "240000",
    "rent_fixed_period_years": 2,
    "rent_adjustment_interval_years": 2,
    "rent_adjustment_percent": "1.5",
    "loan_rate_percent": "2.2",
    "loan_term_years": 19,
    "expenses": {
        "property_tax": "18",
        "management_fee_percent": "5",
        "maintenance": "10000",
        "insurance": "3"
    },
    "acquisition_costs": {
        "brokerage_fee": "155.1",
        "registration_fee": "40"
    }
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== 万円 form to projection ===\n");

    // no start date on the form, so the loan starts today
    let time = SafeTimeProvider::new(TimeSource::System);
    let config = ManYenInput::from_json(FORM)?.into_config(&time)?;

    println!("engine config (yen)");
    println!("-------------------");
    println!("{}\n", config.to_json()?);

    let result = project(&config)?;

    println!("display view (万円)");
    println!("------------------");
    println!("{}", ProjectionView::from_result(&result).to_json_pretty()?);

    Ok(())
}
