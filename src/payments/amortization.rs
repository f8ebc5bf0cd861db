use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimal::{Money, Rate};
use crate::errors::{ProjectionError, Result};
use crate::types::AmortizationRow;

/// fixed-payment amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_years: u32,
    pub start_date: NaiveDate,
    pub monthly_payment: Money,
    pub rows: Vec<AmortizationRow>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate payment schedule
    pub fn generate(
        principal: Money,
        interest_rate: Rate,
        term_years: u32,
        start_date: NaiveDate,
    ) -> Result<Self> {
        let rows = build_schedule(principal, interest_rate, term_years, start_date)?;

        let total_interest = checked_total(rows.iter().map(|r| r.interest))
            .ok_or_else(|| rate_too_large(interest_rate))?;
        let total_payment = checked_total(rows.iter().map(|r| r.payment))
            .ok_or_else(|| rate_too_large(interest_rate))?;

        Ok(Self {
            principal,
            interest_rate,
            term_years,
            start_date,
            monthly_payment: monthly_payment(principal, interest_rate, term_years * 12)?,
            rows,
            total_interest,
            total_payment,
        })
    }

    /// get row for specific month (1-based)
    pub fn get_row(&self, month: u32) -> Option<&AmortizationRow> {
        month
            .checked_sub(1)
            .and_then(|idx| self.rows.get(idx as usize))
    }

    /// remaining balance after the given month; month 0 is the original principal
    pub fn balance_after(&self, month: u32) -> Money {
        if month == 0 {
            return self.principal;
        }
        self.get_row(month)
            .or_else(|| self.rows.last())
            .map(|r| r.remaining)
            .unwrap_or(self.principal)
    }

    /// rows belonging to a 1-based schedule year
    pub fn rows_for_year(&self, year: u32) -> &[AmortizationRow] {
        if year == 0 {
            return &[];
        }
        let start = ((year - 1) as usize * 12).min(self.rows.len());
        let end = (start + 12).min(self.rows.len());
        &self.rows[start..end]
    }
}

/// level monthly payment that retires `principal` over `months`
///
/// Errors when the rate is so large that the payment cannot be represented.
pub fn monthly_payment(principal: Money, annual_rate: Rate, months: u32) -> Result<Money> {
    if months == 0 {
        return Ok(principal);
    }

    let monthly_rate = annual_rate.monthly_rate().as_decimal();

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(months));
    }
    if monthly_rate.is_sign_negative() {
        return Err(ProjectionError::InvalidInput {
            message: format!("loan rate must not be negative, got {annual_rate}"),
        });
    }

    // P * i / (1 - (1 + i)^-n); the discount factor only shrinks, so it cannot overflow
    let base = Decimal::ONE
        .checked_add(monthly_rate)
        .ok_or_else(|| rate_too_large(annual_rate))?;
    let mut discount = Decimal::ONE;
    for _ in 0..months {
        discount = discount.checked_div(base).unwrap_or(Decimal::ZERO);
    }

    let denominator = Decimal::ONE - discount;
    if denominator.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    principal
        .as_decimal()
        .checked_mul(monthly_rate)
        .and_then(|n| n.checked_div(denominator))
        .map(Money::from_decimal)
        .ok_or_else(|| rate_too_large(annual_rate))
}

fn rate_too_large(annual_rate: Rate) -> ProjectionError {
    ProjectionError::InvalidInput {
        message: format!("loan rate {annual_rate} is too large to amortize"),
    }
}

/// build the month-by-month schedule, `term_years * 12` rows long
///
/// The final row pays off whatever rounding drift is left so the last
/// remaining balance is exactly zero.
pub fn build_schedule(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
    start_date: NaiveDate,
) -> Result<Vec<AmortizationRow>> {
    if term_years == 0 {
        return Err(ProjectionError::InvalidInput {
            message: "loan term must be at least one year".to_string(),
        });
    }
    if principal.is_negative() {
        return Err(ProjectionError::InvalidInput {
            message: format!("loan principal must not be negative, got {principal}"),
        });
    }

    let months = term_years * 12;
    let monthly_rate = annual_rate.monthly_rate().as_decimal();
    let payment = monthly_payment(principal, annual_rate, months)?;

    let mut rows = Vec::with_capacity(months as usize);
    let mut balance = principal;

    for month in 1..=months {
        let date = add_months(start_date, month - 1)?;
        let interest = balance
            .checked_mul(monthly_rate)
            .ok_or_else(|| rate_too_large(annual_rate))?;

        let (payment_amount, principal_portion, remaining) = if month == months {
            (balance + interest, balance, Money::ZERO)
        } else {
            let principal_portion = payment - interest;
            (payment, principal_portion, balance - principal_portion)
        };

        rows.push(AmortizationRow {
            month,
            date,
            payment: payment_amount,
            principal: principal_portion,
            interest,
            remaining,
        });

        balance = remaining;
    }

    debug!(months, %principal, %payment, "built amortization schedule");

    Ok(rows)
}

fn checked_total(amounts: impl Iterator<Item = Money>) -> Option<Money> {
    amounts.fold(Some(Money::ZERO), |total, amount| total?.checked_add(amount))
}

/// calendar-safe month offset; the 31st clamps to the end of shorter months
fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ProjectionError::InvalidDate {
            message: format!("{date} plus {months} months is out of range"),
        })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn principal_is_fully_repaid(
            principal in 0i64..200_000_000i64,
            rate_bps in 0u32..800u32,
            term in 1u32..=35u32,
        ) {
            let rate = Rate::from_decimal(Decimal::from(rate_bps) / Decimal::from(10_000));
            let start = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
            let rows = build_schedule(Money::from_yen(principal), rate, term, start).unwrap();

            prop_assert_eq!(rows.len() as u32, term * 12);
            prop_assert_eq!(rows.last().unwrap().remaining, Money::ZERO);

            let repaid: Money = rows.iter().map(|r| r.principal).sum();
            prop_assert!((repaid - Money::from_yen(principal)).abs() <= Money::ONE);
        }
    }
}
