use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cashflow::CashFlowAggregator;
use crate::config::PropertyLoanConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{ProjectionError, Result};
use crate::exit::ExitAnalyzer;
use crate::payments::AmortizationSchedule;
use crate::types::{AmortizationRow, AnnualCashFlowRow, ExitRow, MonthlyCashFlowRow};
use crate::validation::validate;

/// every table produced for one config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub amortization: Vec<AmortizationRow>,
    pub monthly: Vec<MonthlyCashFlowRow>,
    pub annual: Vec<AnnualCashFlowRow>,
    pub exit: Vec<ExitRow>,
    pub summary: ProjectionSummary,
}

impl ProjectionResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// exit row for a sale at the end of `year`
    pub fn exit_for_year(&self, year: u32) -> Option<&ExitRow> {
        self.exit.iter().find(|row| row.year == year)
    }
}

/// headline figures, first-year yields and loan totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub loan_amount: Money,
    pub total_acquisition_cost: Money,
    pub monthly_payment: Money,
    /// first-year rent after occupancy
    pub yearly_income: Money,
    /// first-year expenses, reserve and loan payments
    pub yearly_cost: Money,
    pub yearly_profit: Money,
    /// income over purchase price
    pub gross_yield: Rate,
    /// profit over total acquisition cost
    pub net_yield: Rate,
    /// profit over owner equity, zero without equity
    pub equity_yield: Rate,
    pub total_payment: Money,
    pub total_interest: Money,
    pub final_cumulative_cash_flow: Money,
}

impl ProjectionSummary {
    pub fn from_rows(
        config: &PropertyLoanConfig,
        schedule: &AmortizationSchedule,
        annual: &[AnnualCashFlowRow],
    ) -> Self {
        let (yearly_income, yearly_cost) = annual
            .first()
            .map(|first| {
                (
                    first.rent,
                    first.deductible_expenses() + first.maintenance_reserve + first.payment,
                )
            })
            .unwrap_or((Money::ZERO, Money::ZERO));
        let yearly_profit = yearly_income - yearly_cost;
        let total_acquisition_cost = config.total_acquisition_cost();

        Self {
            loan_amount: schedule.principal,
            total_acquisition_cost,
            monthly_payment: schedule.monthly_payment,
            yearly_income,
            yearly_cost,
            yearly_profit,
            gross_yield: ratio(yearly_income, config.purchase_price),
            net_yield: ratio(yearly_profit, total_acquisition_cost),
            equity_yield: ratio(yearly_profit, config.owner_equity),
            total_payment: schedule.total_payment,
            total_interest: schedule.total_interest,
            final_cumulative_cash_flow: annual
                .last()
                .map(|row| row.cumulative_cash_flow)
                .unwrap_or(Money::ZERO),
        }
    }
}

fn ratio(numerator: Money, denominator: Money) -> Rate {
    if !denominator.is_positive() {
        return Rate::ZERO;
    }
    numerator
        .as_decimal()
        .checked_div(denominator.as_decimal())
        .map(|r| Rate::from_decimal(r.round_dp(8)))
        .unwrap_or(Rate::ZERO)
}

/// validate `config` and run the whole pipeline
///
/// rent → amortization → annual cash flow → exit, in one ordered pass.
pub fn project(config: &PropertyLoanConfig) -> Result<ProjectionResult> {
    let report = validate(config);
    if !report.valid {
        return Err(ProjectionError::Validation {
            errors: report.errors,
        });
    }

    let loan_amount = config.loan_amount();
    debug!(
        %loan_amount,
        rate = %config.loan_rate,
        term_years = config.loan_term_years,
        structure = %config.structure,
        "running projection"
    );

    let schedule = AmortizationSchedule::generate(
        loan_amount,
        config.loan_rate,
        config.loan_term_years,
        config.loan_start_date,
    )?;

    let rents = config.rent_schedule();
    let aggregator = CashFlowAggregator::from_config(config);
    let monthly = aggregator.monthly(&schedule.rows, |year| rents.rent_for_year(year));
    let annual = aggregator.aggregate(&schedule.rows, |year| rents.rent_for_year(year));

    let exit = ExitAnalyzer::new(config.exit_assumptions.clone(), config.tax_schedule.clone())
        .analyze(&annual, config.purchase_price, config.owner_equity);

    let summary = ProjectionSummary::from_rows(config, &schedule, &annual);

    Ok(ProjectionResult {
        amortization: schedule.rows,
        monthly,
        annual,
        exit,
        summary,
    })
}
