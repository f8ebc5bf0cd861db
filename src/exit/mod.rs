pub mod irr;
pub mod sale;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::cashflow::TaxSchedule;
use crate::decimal::Money;
use crate::types::{AnnualCashFlowRow, ExitRow};

pub use irr::{npv, solve_irr};
pub use sale::{ExitAssumptions, PriceStage, SalePricePath, SaleOutcome};

/// evaluates a sale at the end of every projected year
#[derive(Debug, Clone, Default)]
pub struct ExitAnalyzer {
    pub assumptions: ExitAssumptions,
    pub tax_schedule: TaxSchedule,
}

impl ExitAnalyzer {
    pub fn new(assumptions: ExitAssumptions, tax_schedule: TaxSchedule) -> Self {
        Self {
            assumptions,
            tax_schedule,
        }
    }

    /// one exit row per annual row, in the same order
    ///
    /// The IRR for year `y` is solved over
    /// `[-equity, CF1, ..., CF(y-1), CFy + net proceeds]`. Both IRR and
    /// equity multiple are `None` when no equity was invested.
    pub fn analyze(
        &self,
        annual_rows: &[AnnualCashFlowRow],
        acquisition_price: Money,
        initial_equity: Money,
    ) -> Vec<ExitRow> {
        let mut exits = Vec::with_capacity(annual_rows.len());
        let mut flows = Vec::with_capacity(annual_rows.len() + 1);
        flows.push(-initial_equity);

        for row in annual_rows {
            let sale = self.assumptions.evaluate_sale(
                &self.tax_schedule,
                acquisition_price,
                row.year,
                row.ending_loan_balance,
            );

            flows.push(row.after_tax_cash_flow + sale.net_proceeds);

            let (irr, multiple) = if initial_equity.is_positive() {
                let irr = solve_irr(&flows);
                if irr.is_none() {
                    warn!(year = row.year, "irr did not converge");
                }
                (irr, equity_multiple(initial_equity, &flows[1..]))
            } else {
                (None, None)
            };

            exits.push(ExitRow {
                year: row.year,
                sale_price: sale.sale_price,
                selling_cost: sale.selling_cost,
                capital_gains_tax: sale.capital_gains_tax,
                net_sale_proceeds: sale.net_proceeds,
                irr,
                equity_multiple: multiple,
            });

            // later exits see this year's flow without the sale
            if let Some(last) = flows.last_mut() {
                *last = row.after_tax_cash_flow;
            }
        }

        debug!(years = exits.len(), %acquisition_price, %initial_equity, "projected exits");

        exits
    }
}

/// cash returned over cash invested, `None` without positive equity
pub fn equity_multiple(initial_equity: Money, returns: &[Money]) -> Option<Decimal> {
    if !initial_equity.is_positive() {
        return None;
    }
    let returned: Money = returns.iter().sum();
    returned
        .as_decimal()
        .checked_div(initial_equity.as_decimal())
        .map(|m| m.round_dp(8))
}

/// exit rows under the standard price path, selling cost and tax schedule
pub fn project_exit(
    annual_rows: &[AnnualCashFlowRow],
    acquisition_price: Money,
    initial_equity: Money,
) -> Vec<ExitRow> {
    ExitAnalyzer::default().analyze(annual_rows, acquisition_price, initial_equity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn annual_row(
        year: u32,
        after_tax_cash_flow: i64,
        ending_loan_balance: i64,
    ) -> AnnualCashFlowRow {
        AnnualCashFlowRow {
            year,
            months: 12,
            rent: Money::ZERO,
            payment: Money::ZERO,
            principal: Money::ZERO,
            interest: Money::ZERO,
            management: Money::ZERO,
            maintenance_reserve: Money::ZERO,
            property_tax: Money::ZERO,
            insurance: Money::ZERO,
            other: Money::ZERO,
            depreciation: Money::ZERO,
            taxable_income: Money::ZERO,
            corporate_tax: Money::ZERO,
            local_tax: Money::ZERO,
            total_tax: Money::ZERO,
            after_tax_cash_flow: Money::from_yen(after_tax_cash_flow),
            cumulative_cash_flow: Money::ZERO,
            ending_loan_balance: Money::from_yen(ending_loan_balance),
            building_book_value: Money::ZERO,
            reserve_balance: Money::ZERO,
        }
    }

    fn flat_analyzer() -> ExitAnalyzer {
        ExitAnalyzer::new(
            ExitAssumptions {
                price_path: SalePricePath::flat(),
                selling_cost_rate: Rate::ZERO,
            },
            TaxSchedule::default(),
        )
    }

    #[test]
    fn test_zero_equity_has_no_irr_or_multiple() {
        let rows: Vec<_> = (1..=15)
            .map(|y| {
                let flow = 500_000 - 100_000 * (y as i64 % 3);
                annual_row(y, flow, 80_000_000 - 3_000_000 * y as i64)
            })
            .collect();

        let exits = project_exit(&rows, Money::from_yen(100_000_000), Money::ZERO);

        assert_eq!(exits.len(), 15);
        assert!(exits.iter().all(|e| e.irr.is_none() && e.equity_multiple.is_none()));
    }

    #[test]
    fn test_negative_equity_is_treated_as_none() {
        let rows = vec![annual_row(1, 1_000_000, 0)];
        let exits = project_exit(&rows, Money::from_yen(10_000_000), Money::from_yen(-1));
        assert_eq!(exits[0].irr, None);
        assert_eq!(exits[0].equity_multiple, None);
    }

    #[test]
    fn test_one_year_hold_without_loan() {
        // buy for 10M cash, collect 1M, sell flat for 10M: 10% and 1.1x
        let rows = vec![annual_row(1, 1_000_000, 0)];
        let cash = Money::from_yen(10_000_000);
        let exits = flat_analyzer().analyze(&rows, cash, cash);

        let exit = &exits[0];
        assert_eq!(exit.net_sale_proceeds, Money::from_yen(10_000_000));
        assert_eq!(exit.equity_multiple, Some(dec!(1.1)));
        let irr = exit.irr.unwrap().as_decimal();
        assert!((irr - dec!(0.10)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_sale_proceeds_only_land_in_the_exit_year() {
        let rows = vec![annual_row(1, 1_000_000, 0), annual_row(2, 1_000_000, 0)];
        let cash = Money::from_yen(10_000_000);
        let exits = flat_analyzer().analyze(&rows, cash, cash);

        // year 2: 1M + (1M + 10M) returned on 10M
        assert_eq!(exits[1].equity_multiple, Some(dec!(1.2)));
        let irr = exits[1].irr.unwrap().as_decimal();
        assert!((irr - dec!(0.10)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_default_assumptions_with_leverage() {
        let rows: Vec<_> = (1..=20)
            .map(|y| annual_row(y, 1_200_000, 70_000_000 - 2_500_000 * y as i64))
            .collect();

        let exits = project_exit(&rows, Money::from_yen(100_000_000), Money::from_yen(30_000_000));

        assert_eq!(exits.len(), 20);
        for (exit, row) in exits.iter().zip(&rows) {
            assert_eq!(exit.year, row.year);
            assert_eq!(exit.capital_gains_tax, Money::ZERO);
            assert!(exit.equity_multiple.is_some());
            if let Some(irr) = exit.irr {
                let mut flows = vec![Money::from_yen(-30_000_000)];
                flows.extend(rows.iter().take(row.year as usize).map(|r| r.after_tax_cash_flow));
                if let Some(last) = flows.last_mut() {
                    *last += exit.net_sale_proceeds;
                }
                assert!(npv(irr, &flows).unwrap().abs() < dec!(1));
            }
        }
        // the falling price path and the paid-down loan pull in opposite directions
        assert!(exits[19].net_sale_proceeds > exits[0].net_sale_proceeds);
    }

    #[test]
    fn test_near_zero_equity_stays_finite() {
        let rows: Vec<_> = (1..=10).map(|y| annual_row(y, 300_000, 95_000_000)).collect();
        let exits = project_exit(&rows, Money::from_yen(100_000_000), Money::from_yen(1));

        for exit in &exits {
            if let Some(irr) = exit.irr {
                assert!(irr.as_decimal() > irr::MIN_RATE);
            }
            assert!(exit.equity_multiple.is_some());
        }
    }

    #[test]
    fn test_equity_multiple() {
        let returns = [
            Money::from_yen(500_000),
            Money::from_yen(-100_000),
            Money::from_yen(12_000_000),
        ];
        assert_eq!(
            equity_multiple(Money::from_yen(10_000_000), &returns),
            Some(dec!(1.24))
        );
        assert_eq!(equity_multiple(Money::ZERO, &returns), None);
    }

    #[test]
    fn test_empty_rows() {
        assert!(project_exit(&[], Money::from_yen(1), Money::from_yen(1)).is_empty());
    }
}
