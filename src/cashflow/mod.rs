pub mod tax;

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{ExpenseRules, PropertyLoanConfig};
use crate::decimal::{Money, Rate};
use crate::types::{AmortizationRow, AnnualCashFlowRow, MonthlyCashFlowRow};

pub use tax::{TaxAssessment, TaxSchedule};

const MONTHS_PER_YEAR: usize = 12;

/// folds the monthly loan schedule, rent and expenses into yearly rows
#[derive(Debug, Clone)]
pub struct CashFlowAggregator {
    pub occupancy_rate: Rate,
    pub expenses: ExpenseRules,
    pub lifespan_years: u32,
    pub building_price: Money,
    pub tax_schedule: TaxSchedule,
}

impl CashFlowAggregator {
    pub fn new(
        occupancy_rate: Rate,
        expenses: ExpenseRules,
        lifespan_years: u32,
        building_price: Money,
        tax_schedule: TaxSchedule,
    ) -> Self {
        Self {
            occupancy_rate,
            expenses,
            lifespan_years,
            building_price,
            tax_schedule,
        }
    }

    pub fn from_config(config: &PropertyLoanConfig) -> Self {
        Self::new(
            config.occupancy_rate,
            config.expenses.clone(),
            config.depreciation_years(),
            config.building_price,
            config.tax_schedule.clone(),
        )
    }

    /// straight-line depreciation charged in `year`
    pub fn depreciation_for_year(&self, year: u32) -> Money {
        if self.lifespan_years == 0 || year > self.lifespan_years {
            return Money::ZERO;
        }
        self.building_price / Decimal::from(self.lifespan_years)
    }

    /// management (fee plus commission) and reserve charged on one month's rent
    fn monthly_charges(&self, monthly_rent: Money) -> (Money, Money) {
        let management = self.expenses.management_fee.monthly_amount(monthly_rent)
            + self.expenses.management_commission.monthly_amount(monthly_rent);
        let reserve = self.expenses.maintenance_reserve.monthly_amount(monthly_rent);
        (management, reserve)
    }

    /// pre-tax cash flow for every month of `rows`
    ///
    /// Property tax, insurance and other charges are spread evenly, a
    /// twelfth per month. Tax and depreciation only exist in the yearly view.
    pub fn monthly<F>(&self, rows: &[AmortizationRow], rent_for_year: F) -> Vec<MonthlyCashFlowRow>
    where
        F: Fn(u32) -> Money,
    {
        let expenses = &self.expenses;
        let annual_fixed = expenses.property_tax + expenses.insurance + expenses.other;
        let fixed_charges = annual_fixed / Decimal::from(MONTHS_PER_YEAR as u32);

        rows.iter()
            .map(|row| {
                let year = (row.month - 1) / MONTHS_PER_YEAR as u32 + 1;
                let effective_rent = rent_for_year(year).apply(self.occupancy_rate);
                let (management, maintenance_reserve) = self.monthly_charges(effective_rent);
                let operating_expenses = management + fixed_charges;

                MonthlyCashFlowRow {
                    month: row.month,
                    year,
                    date: row.date,
                    effective_rent,
                    payment: row.payment,
                    principal: row.principal,
                    interest: row.interest,
                    remaining: row.remaining,
                    operating_expenses,
                    maintenance_reserve,
                    cash_flow: effective_rent
                        - row.payment
                        - operating_expenses
                        - maintenance_reserve,
                }
            })
            .collect()
    }

    /// aggregate 12-month buckets of `rows` into yearly rows
    ///
    /// A trailing partial bucket becomes a short year; fixed annual charges
    /// are pro-rated over its months. An empty schedule yields no rows.
    pub fn aggregate<F>(
        &self,
        rows: &[AmortizationRow],
        rent_for_year: F,
    ) -> Vec<AnnualCashFlowRow>
    where
        F: Fn(u32) -> Money,
    {
        let mut annual = Vec::with_capacity(rows.len().div_ceil(MONTHS_PER_YEAR));
        let mut cumulative_cash_flow = Money::ZERO;
        let mut reserve_balance = Money::ZERO;
        let mut book_value = self.building_price;

        for (idx, bucket) in rows.chunks(MONTHS_PER_YEAR).enumerate() {
            let year = idx as u32 + 1;
            let months = bucket.len() as u32;
            let monthly_rent = rent_for_year(year).apply(self.occupancy_rate);

            let mut rent = Money::ZERO;
            let mut management = Money::ZERO;
            let mut maintenance_reserve = Money::ZERO;
            let mut payment = Money::ZERO;
            let mut principal = Money::ZERO;
            let mut interest = Money::ZERO;

            let (monthly_management, monthly_reserve) = self.monthly_charges(monthly_rent);
            for row in bucket {
                rent += monthly_rent;
                management += monthly_management;
                maintenance_reserve += monthly_reserve;
                payment += row.payment;
                principal += row.principal;
                interest += row.interest;
            }

            let property_tax = pro_rate(self.expenses.property_tax, months);
            let insurance = pro_rate(self.expenses.insurance, months);
            let other = pro_rate(self.expenses.other, months);

            // the last depreciable year takes whatever rounding left on the books
            let depreciation = if year == self.lifespan_years {
                book_value
            } else {
                self.depreciation_for_year(year).min(book_value)
            };
            book_value -= depreciation;

            let operating = management + property_tax + insurance + other;
            let assessment = self
                .tax_schedule
                .assess(rent - operating - interest - depreciation);

            let after_tax_cash_flow = rent - payment - operating - assessment.total_tax;
            cumulative_cash_flow += after_tax_cash_flow;
            reserve_balance += maintenance_reserve;

            annual.push(AnnualCashFlowRow {
                year,
                months,
                rent,
                payment,
                principal,
                interest,
                management,
                maintenance_reserve,
                property_tax,
                insurance,
                other,
                depreciation,
                taxable_income: assessment.taxable_income,
                corporate_tax: assessment.corporate_tax,
                local_tax: assessment.local_tax,
                total_tax: assessment.total_tax,
                after_tax_cash_flow,
                cumulative_cash_flow,
                ending_loan_balance: bucket.last().map(|r| r.remaining).unwrap_or(Money::ZERO),
                building_book_value: book_value,
                reserve_balance,
            });
        }

        debug!(years = annual.len(), %cumulative_cash_flow, "aggregated annual cash flows");

        annual
    }
}

/// yearly rows with the standard tax schedule
pub fn aggregate_by_year<F>(
    rows: &[AmortizationRow],
    rent_for_year: F,
    occupancy_rate: Rate,
    expenses: &ExpenseRules,
    lifespan_years: u32,
    building_price: Money,
) -> Vec<AnnualCashFlowRow>
where
    F: Fn(u32) -> Money,
{
    CashFlowAggregator::new(
        occupancy_rate,
        expenses.clone(),
        lifespan_years,
        building_price,
        TaxSchedule::default(),
    )
    .aggregate(rows, rent_for_year)
}

fn pro_rate(annual: Money, months: u32) -> Money {
    if months as usize == MONTHS_PER_YEAR {
        return annual;
    }
    annual * Decimal::from(months) / Decimal::from(MONTHS_PER_YEAR as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpenseRule;
    use crate::payments::build_schedule;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn interest_free_rows(years: u32) -> Vec<AmortizationRow> {
        build_schedule(Money::from_yen(1_200_000 * years as i64), Rate::ZERO, years, start())
            .unwrap()
    }

    #[test]
    fn test_empty_schedule_yields_no_rows() {
        let rows = aggregate_by_year(
            &[],
            |_| Money::from_yen(100_000),
            Rate::ONE,
            &ExpenseRules::default(),
            22,
            Money::from_yen(10_000_000),
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_single_year_figures() {
        // 120,000 rent at 90% occupancy, 1,200,000 interest-free loan over 1 year
        let expenses = ExpenseRules {
            property_tax: Money::from_yen(120_000),
            management_fee: ExpenseRule::rate_of_rent(dec!(5)),
            management_commission: ExpenseRule::flat(Money::from_yen(3_000)),
            maintenance_reserve: ExpenseRule::new(
                Rate::from_percentage(dec!(3)),
                Money::from_yen(5_000),
            ),
            insurance: Money::from_yen(24_000),
            other: Money::from_yen(36_000),
        };

        let rows = aggregate_by_year(
            &interest_free_rows(1),
            |_| Money::from_yen(120_000),
            Rate::from_percentage(dec!(90)),
            &expenses,
            22,
            Money::from_yen(2_200_000),
        );

        assert_eq!(rows.len(), 1);
        let row = &rows[0];

        // 108,000 collected per month
        assert_eq!(row.rent, Money::from_yen(1_296_000));
        // 5,400 fee + 3,000 commission per month
        assert_eq!(row.management, Money::from_yen(100_800));
        // max(3,240, 5,000) per month
        assert_eq!(row.maintenance_reserve, Money::from_yen(60_000));
        assert_eq!(row.depreciation, Money::from_yen(100_000));
        assert_eq!(row.payment, Money::from_yen(1_200_000));
        assert_eq!(row.interest, Money::ZERO);

        // 1,296,000 - (100,800 + 120,000 + 24,000 + 36,000) - 0 - 100,000
        assert_eq!(row.taxable_income, Money::from_yen(915_200));
        assert_eq!(row.corporate_tax, Money::from_yen(137_280));
        // 137,280 x 7% + 915,200 x 5%
        assert_eq!(row.local_tax, Money::from_decimal(dec!(55369.6)));
        assert_eq!(row.total_tax, Money::from_decimal(dec!(192649.6)));

        // 1,296,000 - 1,200,000 - 280,800 - 192,649.6
        assert_eq!(row.after_tax_cash_flow, Money::from_decimal(dec!(-377449.6)));
        assert_eq!(row.cumulative_cash_flow, row.after_tax_cash_flow);
        assert_eq!(row.ending_loan_balance, Money::ZERO);
        assert_eq!(row.building_book_value, Money::from_yen(2_100_000));
        assert_eq!(row.reserve_balance, Money::from_yen(60_000));
    }

    #[test]
    fn test_taxable_income_floored_at_zero() {
        let rate = Rate::from_percentage(dec!(3));
        let rows = build_schedule(Money::from_yen(20_000_000), rate, 5, start()).unwrap();
        let annual = aggregate_by_year(
            &rows,
            |_| Money::from_yen(50_000),
            Rate::ONE,
            &ExpenseRules::default(),
            19,
            Money::from_yen(15_000_000),
        );

        for row in &annual {
            assert_eq!(row.taxable_income, Money::ZERO);
            assert_eq!(row.total_tax, Money::ZERO);
            assert!(row.after_tax_cash_flow.is_negative());
        }
    }

    #[test]
    fn test_depreciation_stops_after_lifespan() {
        let annual = aggregate_by_year(
            &interest_free_rows(25),
            |_| Money::from_yen(100_000),
            Rate::ONE,
            &ExpenseRules::default(),
            22,
            Money::from_yen(10_000_000),
        );

        assert_eq!(annual.len(), 25);
        let charged: Money = annual.iter().map(|r| r.depreciation).sum();
        assert_eq!(charged, Money::from_yen(10_000_000));
        assert!(annual[21].depreciation.is_positive());
        assert_eq!(annual[21].building_book_value, Money::ZERO);
        for row in &annual[22..] {
            assert_eq!(row.depreciation, Money::ZERO);
            assert_eq!(row.building_book_value, Money::ZERO);
        }
    }

    #[test]
    fn test_reserve_excluded_from_tax_and_cash_flow() {
        let base = ExpenseRules::default();
        let with_reserve = ExpenseRules {
            maintenance_reserve: ExpenseRule::flat(Money::from_yen(10_000)),
            ..ExpenseRules::default()
        };
        let rows = interest_free_rows(2);
        let rent = |_: u32| Money::from_yen(200_000);

        let building = Money::from_yen(5_000_000);
        let without = aggregate_by_year(&rows, rent, Rate::ONE, &base, 47, building);
        let with = aggregate_by_year(&rows, rent, Rate::ONE, &with_reserve, 47, building);

        for (a, b) in without.iter().zip(with.iter()) {
            assert_eq!(a.taxable_income, b.taxable_income);
            assert_eq!(a.after_tax_cash_flow, b.after_tax_cash_flow);
        }
        assert_eq!(with[1].reserve_balance, Money::from_yen(240_000));
    }

    #[test]
    fn test_rent_function_is_called_per_year() {
        let annual = aggregate_by_year(
            &interest_free_rows(3),
            |year| Money::from_yen(100_000 - 10_000 * year as i64),
            Rate::ONE,
            &ExpenseRules::default(),
            47,
            Money::ZERO,
        );

        assert_eq!(annual[0].rent, Money::from_yen(1_080_000));
        assert_eq!(annual[1].rent, Money::from_yen(960_000));
        assert_eq!(annual[2].rent, Money::from_yen(840_000));
    }

    #[test]
    fn test_partial_final_year() {
        let rows = interest_free_rows(2);
        let partial = &rows[..18];
        let expenses = ExpenseRules {
            property_tax: Money::from_yen(120_000),
            ..ExpenseRules::default()
        };

        let rent = |_: u32| Money::from_yen(100_000);
        let annual = aggregate_by_year(partial, rent, Rate::ONE, &expenses, 47, Money::ZERO);

        assert_eq!(annual.len(), 2);
        assert_eq!(annual[1].months, 6);
        assert_eq!(annual[1].rent, Money::from_yen(600_000));
        assert_eq!(annual[1].property_tax, Money::from_yen(60_000));
        assert_eq!(annual[1].ending_loan_balance, rows[17].remaining);
    }

    fn monthly_aggregator() -> CashFlowAggregator {
        CashFlowAggregator::new(
            Rate::from_percentage(dec!(95)),
            ExpenseRules {
                property_tax: Money::from_yen(120_000),
                management_fee: ExpenseRule::rate_of_rent(dec!(5)),
                maintenance_reserve: ExpenseRule::flat(Money::from_yen(8_000)),
                insurance: Money::from_yen(24_000),
                ..ExpenseRules::default()
            },
            22,
            Money::from_yen(6_000_000),
            TaxSchedule::default(),
        )
    }

    #[test]
    fn test_monthly_rows_add_up_to_the_year() {
        let aggregator = monthly_aggregator();
        let rate = Rate::from_percentage(dec!(2.4));
        let rows = build_schedule(Money::from_yen(24_000_000), rate, 3, start()).unwrap();
        let rent = |year: u32| Money::from_yen(200_000 - 10_000 * year as i64);

        let monthly = aggregator.monthly(&rows, rent);
        let annual = aggregator.aggregate(&rows, rent);

        assert_eq!(monthly.len(), 36);
        for year in &annual {
            let months: Vec<_> = monthly.iter().filter(|m| m.year == year.year).collect();
            assert_eq!(months.len(), 12);
            let rent: Money = months.iter().map(|m| m.effective_rent).sum();
            let payment: Money = months.iter().map(|m| m.payment).sum();
            let reserve: Money = months.iter().map(|m| m.maintenance_reserve).sum();
            assert_eq!(rent, year.rent);
            assert_eq!(payment, year.payment);
            assert_eq!(reserve, year.maintenance_reserve);
        }
        assert_eq!(monthly[12].month, 13);
        assert_eq!(monthly[12].date, rows[12].date);
        assert_eq!(monthly[35].remaining, Money::ZERO);
    }

    #[test]
    fn test_monthly_cash_flow_figures() {
        let aggregator = monthly_aggregator();
        let rows = interest_free_rows(1);

        let month = &aggregator.monthly(&rows, |_| Money::from_yen(100_000))[0];

        assert_eq!(month.year, 1);
        assert_eq!(month.effective_rent, Money::from_yen(95_000));
        assert_eq!(month.payment, Money::from_yen(100_000));
        // 4,750 management + (120,000 + 24,000) / 12
        assert_eq!(month.operating_expenses, Money::from_yen(16_750));
        assert_eq!(month.maintenance_reserve, Money::from_yen(8_000));
        // 95,000 - 100,000 - 16,750 - 8,000
        assert_eq!(month.cash_flow, Money::from_yen(-29_750));
    }
}
