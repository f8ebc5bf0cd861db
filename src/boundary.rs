//! Conversions between 万円 (10,000 yen) figures, as typed into forms, and
//! the yen-denominated engine.
//!
//! Nothing past this module sees 万円: amounts are converted once on the
//! way in and once on the way out.

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{AcquisitionCosts, ExpenseRule, ExpenseRules, PropertyLoanConfig};
use crate::decimal::{Money, Rate};
use crate::errors::{ProjectionError, Result};
use crate::projection::ProjectionResult;
use crate::types::StructureClass;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_DP: u32 = 2;

/// property and loan terms as entered on the input form
///
/// Prices, equity, acquisition costs and annual charges are in 万円.
/// Rent and the monthly expense floors stay in yen, as they are quoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManYenInput {
    pub purchase_price: Decimal,
    #[serde(default)]
    pub owner_equity: Decimal,
    #[serde(default)]
    pub building_price: Decimal,
    pub structure: String,
    pub occupancy_percent: Decimal,
    pub monthly_rent: Decimal,
    pub rent_fixed_period_years: u32,
    pub rent_adjustment_interval_years: u32,
    #[serde(default)]
    pub rent_adjustment_percent: Decimal,
    pub loan_rate_percent: Decimal,
    pub loan_term_years: u32,
    /// `YYYY-MM-DD`; today when absent
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub expenses: ManYenExpenses,
    #[serde(default)]
    pub acquisition_costs: ManYenAcquisitionCosts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ManYenExpenses {
    /// fixed asset and city planning tax, 万円 per year
    pub property_tax: Decimal,
    pub management_fee_percent: Decimal,
    /// yen per month
    pub management_fee: Decimal,
    pub management_commission_percent: Decimal,
    /// yen per month
    pub management_commission: Decimal,
    pub maintenance_percent: Decimal,
    /// yen per month
    pub maintenance: Decimal,
    /// 万円 per year
    pub insurance: Decimal,
    /// 万円 per year
    pub other: Decimal,
}

/// one-off purchase costs in 万円
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ManYenAcquisitionCosts {
    pub brokerage_fee: Decimal,
    pub registration_fee: Decimal,
    pub acquisition_tax: Decimal,
    pub stamp_duty: Decimal,
    pub loan_fee: Decimal,
    pub survey_fee: Decimal,
    pub miscellaneous: Decimal,
}

impl ManYenExpenses {
    fn into_rules(self) -> Result<ExpenseRules> {
        Ok(ExpenseRules {
            property_tax: man_yen("property tax", self.property_tax)?,
            management_fee: ExpenseRule::new(
                Rate::from_percentage(self.management_fee_percent),
                Money::from_decimal(self.management_fee),
            ),
            management_commission: ExpenseRule::new(
                Rate::from_percentage(self.management_commission_percent),
                Money::from_decimal(self.management_commission),
            ),
            maintenance_reserve: ExpenseRule::new(
                Rate::from_percentage(self.maintenance_percent),
                Money::from_decimal(self.maintenance),
            ),
            insurance: man_yen("insurance", self.insurance)?,
            other: man_yen("other expenses", self.other)?,
        })
    }
}

impl ManYenAcquisitionCosts {
    fn into_costs(self) -> Result<AcquisitionCosts> {
        Ok(AcquisitionCosts {
            brokerage_fee: man_yen("brokerage fee", self.brokerage_fee)?,
            registration_fee: man_yen("registration fee", self.registration_fee)?,
            acquisition_tax: man_yen("acquisition tax", self.acquisition_tax)?,
            stamp_duty: man_yen("stamp duty", self.stamp_duty)?,
            loan_fee: man_yen("loan fee", self.loan_fee)?,
            survey_fee: man_yen("survey fee", self.survey_fee)?,
            miscellaneous: man_yen("miscellaneous", self.miscellaneous)?,
        })
    }
}

impl ManYenInput {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// yen-denominated config; a missing start date is read from `time_provider`
    pub fn into_config(self, time_provider: &SafeTimeProvider) -> Result<PropertyLoanConfig> {
        let structure: StructureClass = self.structure.parse()?;

        let mut builder = PropertyLoanConfig::builder()
            .purchase_price(man_yen("purchase price", self.purchase_price)?)
            .owner_equity(man_yen("owner equity", self.owner_equity)?)
            .building_price(man_yen("building price", self.building_price)?)
            .structure(structure)
            .occupancy_rate(Rate::from_percentage(self.occupancy_percent))
            .monthly_rent(Money::from_decimal(self.monthly_rent))
            .rent_adjustment(
                self.rent_fixed_period_years,
                self.rent_adjustment_interval_years,
                Rate::from_percentage(self.rent_adjustment_percent),
            )
            .loan_rate(Rate::from_percentage(self.loan_rate_percent))
            .loan_term_years(self.loan_term_years)
            .expenses(self.expenses.into_rules()?)
            .acquisition_costs(self.acquisition_costs.into_costs()?);

        if let Some(date) = self.start_date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            builder = builder.loan_start_date(parse_date(date)?);
        }

        builder.build_with_time(time_provider)
    }
}

fn man_yen(field: &str, amount: Decimal) -> Result<Money> {
    Money::from_man_yen(amount).ok_or_else(|| ProjectionError::InvalidInput {
        message: format!("{field} of {amount} 万円 is too large"),
    })
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| ProjectionError::InvalidDate {
        message: format!("{value:?} is not a {DATE_FORMAT} date: {e}"),
    })
}

fn man(amount: Money) -> Decimal {
    amount.to_man_yen().round_dp(DISPLAY_DP)
}

fn percent(rate: Rate) -> Decimal {
    rate.as_percentage().round_dp(DISPLAY_DP)
}

/// display copy of a projection, amounts in 万円 and rates in percent
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectionView {
    pub summary: SummaryView,
    pub annual: Vec<AnnualView>,
    pub exit: Vec<ExitView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryView {
    pub loan_amount: Decimal,
    pub total_acquisition_cost: Decimal,
    /// yen, as quoted by lenders
    pub monthly_payment: Decimal,
    pub yearly_income: Decimal,
    pub yearly_cost: Decimal,
    pub yearly_profit: Decimal,
    pub gross_yield_percent: Decimal,
    pub net_yield_percent: Decimal,
    pub equity_yield_percent: Decimal,
    pub total_interest: Decimal,
    pub final_cumulative_cash_flow: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnnualView {
    pub year: u32,
    pub rent: Decimal,
    pub payment: Decimal,
    pub interest: Decimal,
    pub expenses: Decimal,
    pub depreciation: Decimal,
    pub taxable_income: Decimal,
    pub total_tax: Decimal,
    pub after_tax_cash_flow: Decimal,
    pub cumulative_cash_flow: Decimal,
    pub loan_balance: Decimal,
    pub book_value: Decimal,
    pub reserve_balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExitView {
    pub year: u32,
    pub sale_price: Decimal,
    pub net_sale_proceeds: Decimal,
    pub irr_percent: Option<Decimal>,
    pub equity_multiple: Option<Decimal>,
}

impl ProjectionView {
    pub fn from_result(result: &ProjectionResult) -> Self {
        let s = &result.summary;
        ProjectionView {
            summary: SummaryView {
                loan_amount: man(s.loan_amount),
                total_acquisition_cost: man(s.total_acquisition_cost),
                monthly_payment: s.monthly_payment.round_yen().as_decimal(),
                yearly_income: man(s.yearly_income),
                yearly_cost: man(s.yearly_cost),
                yearly_profit: man(s.yearly_profit),
                gross_yield_percent: percent(s.gross_yield),
                net_yield_percent: percent(s.net_yield),
                equity_yield_percent: percent(s.equity_yield),
                total_interest: man(s.total_interest),
                final_cumulative_cash_flow: man(s.final_cumulative_cash_flow),
            },
            annual: result
                .annual
                .iter()
                .map(|row| AnnualView {
                    year: row.year,
                    rent: man(row.rent),
                    payment: man(row.payment),
                    interest: man(row.interest),
                    expenses: man(row.deductible_expenses()),
                    depreciation: man(row.depreciation),
                    taxable_income: man(row.taxable_income),
                    total_tax: man(row.total_tax),
                    after_tax_cash_flow: man(row.after_tax_cash_flow),
                    cumulative_cash_flow: man(row.cumulative_cash_flow),
                    loan_balance: man(row.ending_loan_balance),
                    book_value: man(row.building_book_value),
                    reserve_balance: man(row.reserve_balance),
                })
                .collect(),
            exit: result
                .exit
                .iter()
                .map(|row| ExitView {
                    year: row.year,
                    sale_price: man(row.sale_price),
                    net_sale_proceeds: man(row.net_sale_proceeds),
                    irr_percent: row.irr.map(percent),
                    equity_multiple: row.equity_multiple.map(|m| m.round_dp(DISPLAY_DP)),
                })
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
