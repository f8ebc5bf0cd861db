//! Newton-Raphson IRR over yearly cash flows.
//!
//! Decimal arithmetic has no infinities, so every step is checked: an
//! overflowing discount factor or a zero derivative counts as a
//! non-finite update and the solve gives up with `None`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};

pub const INITIAL_GUESS: Decimal = dec!(0.08);
pub const MAX_ITERATIONS: u32 = 50;
/// converged once |NPV| is below one yen
pub const NPV_TOLERANCE: Decimal = Decimal::ONE;
/// guesses at or below -99.99% are treated as divergence
pub const MIN_RATE: Decimal = dec!(-0.9999);

/// NPV(r) = sum CF_t / (1+r)^t, `None` if the discounting overflows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Option<Decimal> {
    npv_and_derivative(cash_flows, rate.as_decimal()).map(|(npv, _)| npv)
}

/// rate at which the cash flows' NPV is within a yen of zero
pub fn solve_irr(cash_flows: &[Money]) -> Option<Rate> {
    if cash_flows.len() < 2 {
        return None;
    }

    let mut rate = INITIAL_GUESS;

    for _ in 0..MAX_ITERATIONS {
        let (npv, dnpv) = npv_and_derivative(cash_flows, rate)?;

        if npv.abs() < NPV_TOLERANCE {
            return Some(Rate::from_decimal(rate));
        }

        if dnpv.is_zero() {
            return None;
        }

        rate = rate.checked_sub(npv.checked_div(dnpv)?)?;

        if rate <= MIN_RATE {
            return None;
        }
    }

    let (npv, _) = npv_and_derivative(cash_flows, rate)?;
    (npv.abs() < NPV_TOLERANCE).then(|| Rate::from_decimal(rate))
}

/// NPV(r) and its derivative d(NPV)/dr
fn npv_and_derivative(cash_flows: &[Money], rate: Decimal) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^0 = 1

    for (t, cf) in cash_flows.iter().enumerate() {
        let cf = cf.as_decimal();
        let term = cf.checked_mul(discount)?;
        npv = npv.checked_add(term)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let slope = Decimal::from(t as i64)
                .checked_mul(term)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(slope)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}
