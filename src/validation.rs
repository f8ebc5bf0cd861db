use chrono::Months;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{ExpenseRule, PropertyLoanConfig};
use crate::decimal::{Money, Rate};

pub const MIN_LOAN_TERM_YEARS: u32 = 1;
pub const MAX_LOAN_TERM_YEARS: u32 = 35;
/// 1,000 trillion yen; larger amounts are typos
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);
/// steepest yearly rise accepted on the sale price path
pub const MAX_PRICE_CHANGE: Decimal = Decimal::ONE;

/// outcome of checking a config; lists every problem found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// check every range rule on `config`, in field order
///
/// Never stops at the first problem so a caller can show them all at once.
pub fn validate(config: &PropertyLoanConfig) -> ValidationReport {
    let mut errors = Vec::new();

    if !config.purchase_price.is_positive() {
        errors.push(format!(
            "purchase price must be greater than 0, got {}",
            config.purchase_price
        ));
    }
    check_ceiling(&mut errors, "purchase price", config.purchase_price);

    if config.owner_equity.is_negative() {
        errors.push(format!(
            "owner equity must not be negative, got {}",
            config.owner_equity
        ));
    } else if let Some(total) = config.checked_total_acquisition_cost() {
        if config.owner_equity > total {
            errors.push(format!(
                "owner equity {} exceeds the total acquisition cost {total}",
                config.owner_equity
            ));
        }
    }
    check_ceiling(&mut errors, "owner equity", config.owner_equity);

    if config.building_price.is_negative() {
        errors.push(format!(
            "building price must not be negative, got {}",
            config.building_price
        ));
    } else if config.building_price > config.purchase_price {
        errors.push(format!(
            "building price {} exceeds the purchase price {}",
            config.building_price, config.purchase_price
        ));
    }
    check_ceiling(&mut errors, "building price", config.building_price);

    check_percentage(&mut errors, "occupancy rate", config.occupancy_rate);

    if config.initial_monthly_rent.is_negative() {
        errors.push(format!(
            "monthly rent must not be negative, got {}",
            config.initial_monthly_rent
        ));
    }
    check_ceiling(&mut errors, "monthly rent", config.initial_monthly_rent);

    if config.rent_fixed_period_years < 1 {
        errors.push("rent fixed period must be at least 1 year".to_string());
    }
    if config.rent_adjustment_interval_years < 1 {
        errors.push("rent adjustment interval must be at least 1 year".to_string());
    }
    check_percentage(&mut errors, "rent adjustment rate", config.rent_adjustment_rate);

    if config.loan_rate.as_decimal() < Decimal::ZERO {
        errors.push(format!("loan rate must not be negative, got {}", config.loan_rate));
    }

    if !(MIN_LOAN_TERM_YEARS..=MAX_LOAN_TERM_YEARS).contains(&config.loan_term_years) {
        errors.push(format!(
            "loan term must be between {MIN_LOAN_TERM_YEARS} and {MAX_LOAN_TERM_YEARS} years, \
             got {}",
            config.loan_term_years
        ));
    } else if config
        .loan_start_date
        .checked_add_months(Months::new(config.loan_term_years * 12))
        .is_none()
    {
        errors.push(format!(
            "loan starting {} runs past the supported calendar",
            config.loan_start_date
        ));
    }

    let expenses = &config.expenses;
    check_amount(&mut errors, "property tax", expenses.property_tax);
    check_rule(&mut errors, "management fee", &expenses.management_fee);
    check_rule(&mut errors, "management commission", &expenses.management_commission);
    check_rule(&mut errors, "maintenance reserve", &expenses.maintenance_reserve);
    check_amount(&mut errors, "insurance", expenses.insurance);
    check_amount(&mut errors, "other expenses", expenses.other);

    for (name, amount) in config.acquisition_costs.items() {
        check_amount(&mut errors, name, amount);
    }

    let tax = &config.tax_schedule;
    check_amount(&mut errors, "tax bracket threshold", tax.bracket_threshold);
    check_percentage(&mut errors, "lower corporate tax rate", tax.lower_rate);
    check_percentage(&mut errors, "upper corporate tax rate", tax.upper_rate);
    check_percentage(
        &mut errors,
        "local tax rate on corporate tax",
        tax.local_rate_on_corporate_tax,
    );
    check_percentage(&mut errors, "local tax rate on income", tax.local_rate_on_income);

    let exit = &config.exit_assumptions;
    check_percentage(&mut errors, "selling cost rate", exit.selling_cost_rate);
    let mut previous_year = 0;
    for stage in &exit.price_path.stages {
        if stage.through_year <= previous_year {
            errors.push(format!(
                "sale price stages must end in increasing years, got {} after {}",
                stage.through_year, previous_year
            ));
        }
        check_price_change(&mut errors, stage.annual_change);
        previous_year = stage.through_year;
    }
    check_price_change(&mut errors, exit.price_path.terminal_change);

    if !errors.is_empty() {
        warn!(count = errors.len(), "configuration rejected");
    }

    ValidationReport::from_errors(errors)
}

fn check_percentage(errors: &mut Vec<String>, name: &str, rate: Rate) {
    let percent = rate.as_percentage();
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        errors.push(format!("{name} must be between 0 and 100%, got {rate}"));
    }
}

fn check_amount(errors: &mut Vec<String>, name: &str, amount: Money) {
    if amount.is_negative() {
        errors.push(format!("{name} must not be negative, got {amount}"));
    }
    check_ceiling(errors, name, amount);
}

fn check_ceiling(errors: &mut Vec<String>, name: &str, amount: Money) {
    if amount.as_decimal() > MAX_AMOUNT {
        errors.push(format!("{name} must not exceed {MAX_AMOUNT}, got {amount}"));
    }
}

fn check_rule(errors: &mut Vec<String>, name: &str, rule: &ExpenseRule) {
    check_percentage(errors, name, rule.rate);
    check_amount(errors, name, rule.monthly_floor);
}

fn check_price_change(errors: &mut Vec<String>, change: Rate) {
    let change_decimal = change.as_decimal();
    if change_decimal <= Decimal::NEGATIVE_ONE || change_decimal > MAX_PRICE_CHANGE {
        errors.push(format!(
            "yearly sale price change must be above -100% and at most 100%, got {change}"
        ));
    }
}
