use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::cashflow::TaxSchedule;
use crate::decimal::{Money, Rate};

/// yearly price change applied up to and including `through_year`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceStage {
    pub through_year: u32,
    /// signed; -0.02 is a 2% fall per year
    pub annual_change: Rate,
}

/// piecewise compounding path of the projected sale price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalePricePath {
    /// ordered by `through_year`
    pub stages: Vec<PriceStage>,
    /// change applied once every stage has run out
    pub terminal_change: Rate,
}

impl Default for SalePricePath {
    fn default() -> Self {
        Self {
            stages: vec![
                PriceStage {
                    through_year: 5,
                    annual_change: Rate::from_decimal(dec!(-0.02)),
                },
                PriceStage {
                    through_year: 10,
                    annual_change: Rate::from_decimal(dec!(-0.01)),
                },
            ],
            terminal_change: Rate::ZERO,
        }
    }
}

impl SalePricePath {
    /// price path that never moves
    pub fn flat() -> Self {
        Self {
            stages: Vec::new(),
            terminal_change: Rate::ZERO,
        }
    }

    /// change in effect during `year`
    pub fn change_for_year(&self, year: u32) -> Rate {
        self.stages
            .iter()
            .find(|stage| year <= stage.through_year)
            .map(|stage| stage.annual_change)
            .unwrap_or(self.terminal_change)
    }

    /// sale price after `year` years of compounding; year 0 is the purchase price
    pub fn price_for_year(&self, acquisition_price: Money, year: u32) -> Money {
        (1..=year).fold(acquisition_price, |price, y| {
            price * (Decimal::ONE + self.change_for_year(y).as_decimal())
        })
    }
}

/// market assumptions for a sale at the end of any holding year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAssumptions {
    pub price_path: SalePricePath,
    /// brokerage and transfer costs as a share of the sale price
    pub selling_cost_rate: Rate,
}

impl Default for ExitAssumptions {
    fn default() -> Self {
        Self {
            price_path: SalePricePath::default(),
            selling_cost_rate: Rate::from_decimal(dec!(0.03)),
        }
    }
}

/// breakdown of one hypothetical sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleOutcome {
    pub sale_price: Money,
    pub selling_cost: Money,
    pub capital_gain: Money,
    pub capital_gains_tax: Money,
    pub loan_payoff: Money,
    /// cash left for the owner, never negative
    pub net_proceeds: Money,
}

impl ExitAssumptions {
    /// sell at the end of `year` and repay `loan_balance` out of the price
    pub fn evaluate_sale(
        &self,
        tax_schedule: &TaxSchedule,
        acquisition_price: Money,
        year: u32,
        loan_balance: Money,
    ) -> SaleOutcome {
        let sale_price = self.price_path.price_for_year(acquisition_price, year);
        let selling_cost = sale_price.apply(self.selling_cost_rate);
        let capital_gain = (sale_price - acquisition_price).max(Money::ZERO);
        let capital_gains_tax = tax_schedule.assess(capital_gain).total_tax;

        let net_proceeds =
            (sale_price - selling_cost - capital_gains_tax - loan_balance).max(Money::ZERO);

        SaleOutcome {
            sale_price,
            selling_cost,
            capital_gain,
            capital_gains_tax,
            loan_payoff: loan_balance,
            net_proceeds,
        }
    }
}
