use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

/// step-down rent terms: flat for a fixed period, then cut by a fixed
/// percentage at every adjustment interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentSchedule {
    pub initial_rent: Money,
    pub fixed_period_years: u32,
    pub adjustment_interval_years: u32,
    /// decrease applied at each adjustment
    pub adjustment_rate: Rate,
}

impl RentSchedule {
    pub fn new(
        initial_rent: Money,
        fixed_period_years: u32,
        adjustment_interval_years: u32,
        adjustment_rate: Rate,
    ) -> Self {
        Self {
            initial_rent,
            fixed_period_years,
            adjustment_interval_years,
            adjustment_rate,
        }
    }

    /// rent that never adjusts
    pub fn flat(initial_rent: Money) -> Self {
        Self::new(initial_rent, 1, 1, Rate::ZERO)
    }

    /// monthly rent in effect during `year` (1-based)
    pub fn rent_for_year(&self, year: u32) -> Money {
        rent_for_year(
            year,
            self.initial_rent,
            self.fixed_period_years,
            self.adjustment_interval_years,
            self.adjustment_rate,
        )
    }

    /// monthly rent for years 1..=years
    pub fn schedule(&self, years: u32) -> Vec<Money> {
        self.iter().take(years as usize).collect()
    }

    /// lazily yields the monthly rent for year 1, 2, ...
    pub fn iter(&self) -> RentYears<'_> {
        RentYears {
            schedule: self,
            next_year: 1,
        }
    }

    /// number of step-downs applied by `year`
    pub fn adjustment_count(&self, year: u32) -> u32 {
        adjustment_count(year, self.fixed_period_years, self.adjustment_interval_years)
    }
}

/// iterator over yearly rents, see [`RentSchedule::iter`]
pub struct RentYears<'a> {
    schedule: &'a RentSchedule,
    next_year: u32,
}

impl Iterator for RentYears<'_> {
    type Item = Money;

    fn next(&mut self) -> Option<Money> {
        let year = self.next_year;
        self.next_year = self.next_year.checked_add(1)?;
        Some(self.schedule.rent_for_year(year))
    }
}

fn adjustment_count(year: u32, fixed_period_years: u32, adjustment_interval_years: u32) -> u32 {
    if year <= fixed_period_years || adjustment_interval_years == 0 {
        return 0;
    }
    (year - fixed_period_years) / adjustment_interval_years
}

/// monthly rent for `year`, rounded to whole yen once adjustments apply
pub fn rent_for_year(
    year: u32,
    initial_rent: Money,
    fixed_period_years: u32,
    adjustment_interval_years: u32,
    adjustment_rate: Rate,
) -> Money {
    if year <= fixed_period_years {
        return initial_rent;
    }

    let count = adjustment_count(year, fixed_period_years, adjustment_interval_years);

    // base stays in [0, 1], so the power only shrinks towards zero
    let base = Decimal::ONE - adjustment_rate.as_decimal().clamp(Decimal::ZERO, Decimal::ONE);
    let factor = base.checked_powu(u64::from(count)).unwrap_or(Decimal::ZERO);

    (initial_rent * factor).round_yen()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn stepped() -> RentSchedule {
        RentSchedule::new(
            Money::from_yen(100_000),
            3,
            2,
            Rate::from_percentage(dec!(5)),
        )
    }

    #[test]
    fn test_fixed_period_keeps_initial_rent() {
        let schedule = stepped();
        for year in 1..=3 {
            assert_eq!(schedule.rent_for_year(year), Money::from_yen(100_000));
        }
    }

    #[test]
    fn test_first_adjustment() {
        // floor((5 - 3) / 2) = 1 adjustment
        assert_eq!(stepped().rent_for_year(5), Money::from_yen(95_000));
        assert_eq!(
            rent_for_year(5, Money::from_yen(100_000), 3, 2, Rate::from_percentage(dec!(5))),
            Money::from_yen(95_000)
        );
    }

    #[test]
    fn test_compounding_and_rounding() {
        let schedule = stepped();
        // year 4: floor(1/2) = 0 adjustments
        assert_eq!(schedule.rent_for_year(4), Money::from_yen(100_000));
        assert_eq!(schedule.rent_for_year(6), Money::from_yen(95_000));
        // 100,000 x 0.95^2 = 90,250
        assert_eq!(schedule.rent_for_year(7), Money::from_yen(90_250));
        // 100,000 x 0.95^3 = 85,737.5 -> 85,738
        assert_eq!(schedule.rent_for_year(9), Money::from_yen(85_738));
    }

    #[test]
    fn test_zero_rate_never_changes() {
        let schedule = RentSchedule::new(Money::from_yen(80_000), 2, 1, Rate::ZERO);
        assert!(schedule.schedule(40).iter().all(|r| *r == Money::from_yen(80_000)));
    }

    #[test]
    fn test_full_rate_drops_to_zero() {
        let schedule =
            RentSchedule::new(Money::from_yen(80_000), 2, 3, Rate::from_percentage(dec!(100)));
        assert_eq!(schedule.rent_for_year(4), Money::from_yen(80_000));
        assert_eq!(schedule.rent_for_year(5), Money::ZERO);
        assert_eq!(schedule.rent_for_year(30), Money::ZERO);
    }

    #[test]
    fn test_schedule_matches_point_queries() {
        let schedule = stepped();
        let eager = schedule.schedule(12);
        assert_eq!(eager.len(), 12);
        for (idx, rent) in eager.iter().enumerate() {
            assert_eq!(*rent, schedule.rent_for_year(idx as u32 + 1));
        }
        let lazy: Vec<Money> = schedule.iter().take(12).collect();
        assert_eq!(lazy, eager);
    }

    #[test]
    fn test_far_years_stay_bounded() {
        let schedule =
            RentSchedule::new(Money::from_yen(80_000), 1, 1, Rate::from_percentage(dec!(0.01)));
        let rent = schedule.rent_for_year(u32::MAX);
        assert!(rent >= Money::ZERO && rent < Money::from_yen(80_000));

        // out-of-range rates act as their nearest bound
        let above =
            RentSchedule::new(Money::from_yen(80_000), 1, 1, Rate::from_percentage(dec!(250)));
        assert_eq!(above.rent_for_year(2), Money::ZERO);
        let below =
            RentSchedule::new(Money::from_yen(80_000), 1, 1, Rate::from_percentage(dec!(-5)));
        assert_eq!(below.rent_for_year(20), Money::from_yen(80_000));
    }

    #[test]
    fn test_zero_interval_is_treated_as_no_adjustment() {
        let schedule =
            RentSchedule::new(Money::from_yen(50_000), 1, 0, Rate::from_percentage(dec!(10)));
        assert_eq!(schedule.rent_for_year(10), Money::from_yen(50_000));
    }
}
