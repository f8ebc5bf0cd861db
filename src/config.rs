use chrono::NaiveDate;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cashflow::TaxSchedule;
use crate::decimal::{Money, Rate};
use crate::errors::{ProjectionError, Result};
use crate::exit::ExitAssumptions;
use crate::rent::RentSchedule;
use crate::types::StructureClass;

/// property, loan and operating assumptions for one projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyLoanConfig {
    pub purchase_price: Money,
    pub owner_equity: Money,
    /// depreciable part of the purchase price
    pub building_price: Money,
    pub structure: StructureClass,
    pub occupancy_rate: Rate,
    /// nominal monthly rent before occupancy
    pub initial_monthly_rent: Money,
    pub rent_fixed_period_years: u32,
    pub rent_adjustment_interval_years: u32,
    pub rent_adjustment_rate: Rate,
    pub loan_rate: Rate,
    pub loan_term_years: u32,
    pub loan_start_date: NaiveDate,
    pub expenses: ExpenseRules,
    #[serde(default)]
    pub acquisition_costs: AcquisitionCosts,
    #[serde(default)]
    pub tax_schedule: TaxSchedule,
    #[serde(default)]
    pub exit_assumptions: ExitAssumptions,
}

/// recurring charge resolved monthly as the larger of a share of rent and a
/// flat floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ExpenseRule {
    pub rate: Rate,
    pub monthly_floor: Money,
}

impl ExpenseRule {
    pub fn new(rate: Rate, monthly_floor: Money) -> Self {
        Self { rate, monthly_floor }
    }

    /// charge as a share of rent only
    pub fn rate_of_rent(percent: Decimal) -> Self {
        Self::new(Rate::from_percentage(percent), Money::ZERO)
    }

    /// flat monthly charge only
    pub fn flat(monthly: Money) -> Self {
        Self::new(Rate::ZERO, monthly)
    }

    /// amount due for a month with the given collected rent
    pub fn monthly_amount(&self, rent: Money) -> Money {
        rent.apply(self.rate).max(self.monthly_floor)
    }
}

/// operating expenses charged against rent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExpenseRules {
    /// fixed asset and city planning tax, per year
    pub property_tax: Money,
    pub management_fee: ExpenseRule,
    pub management_commission: ExpenseRule,
    /// long-term repair reserve; accumulated, not deducted
    pub maintenance_reserve: ExpenseRule,
    /// per year
    pub insurance: Money,
    /// per year
    pub other: Money,
}

/// one-off purchase costs financed together with the price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AcquisitionCosts {
    pub brokerage_fee: Money,
    pub registration_fee: Money,
    pub acquisition_tax: Money,
    pub stamp_duty: Money,
    pub loan_fee: Money,
    pub survey_fee: Money,
    pub miscellaneous: Money,
}

impl AcquisitionCosts {
    pub fn items(&self) -> [(&'static str, Money); 7] {
        [
            ("brokerage fee", self.brokerage_fee),
            ("registration fee", self.registration_fee),
            ("acquisition tax", self.acquisition_tax),
            ("stamp duty", self.stamp_duty),
            ("loan fee", self.loan_fee),
            ("survey fee", self.survey_fee),
            ("miscellaneous", self.miscellaneous),
        ]
    }

    pub fn total(&self) -> Money {
        self.items().iter().map(|(_, amount)| *amount).sum()
    }

    /// total that reports overflow instead of panicking
    pub fn checked_total(&self) -> Option<Money> {
        self.items()
            .iter()
            .try_fold(Money::ZERO, |total, (_, amount)| total.checked_add(*amount))
    }
}

impl PropertyLoanConfig {
    pub fn builder() -> PropertyLoanConfigBuilder {
        PropertyLoanConfigBuilder::new()
    }

    /// purchase price plus acquisition costs
    pub fn total_acquisition_cost(&self) -> Money {
        self.purchase_price + self.acquisition_costs.total()
    }

    /// total acquisition cost, `None` if the amounts are too large to add up
    pub fn checked_total_acquisition_cost(&self) -> Option<Money> {
        self.acquisition_costs.checked_total()?.checked_add(self.purchase_price)
    }

    /// amount borrowed: everything not covered by equity
    pub fn loan_amount(&self) -> Money {
        (self.total_acquisition_cost() - self.owner_equity).max(Money::ZERO)
    }

    pub fn rent_schedule(&self) -> RentSchedule {
        RentSchedule::new(
            self.initial_monthly_rent,
            self.rent_fixed_period_years,
            self.rent_adjustment_interval_years,
            self.rent_adjustment_rate,
        )
    }

    pub fn depreciation_years(&self) -> u32 {
        self.structure.lifespan_years()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct PropertyLoanConfigBuilder {
    purchase_price: Option<Money>,
    owner_equity: Money,
    building_price: Option<Money>,
    structure: StructureClass,
    occupancy_rate: Rate,
    monthly_rent: Option<Money>,
    rent_fixed_period_years: u32,
    rent_adjustment_interval_years: u32,
    rent_adjustment_rate: Rate,
    loan_rate: Option<Rate>,
    loan_term_years: Option<u32>,
    loan_start_date: Option<NaiveDate>,
    expenses: ExpenseRules,
    acquisition_costs: AcquisitionCosts,
    tax_schedule: TaxSchedule,
    exit_assumptions: ExitAssumptions,
}

impl Default for PropertyLoanConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyLoanConfigBuilder {
    pub fn new() -> Self {
        Self {
            purchase_price: None,
            owner_equity: Money::ZERO,
            building_price: None,
            structure: StructureClass::Wood,
            occupancy_rate: Rate::ONE,
            monthly_rent: None,
            rent_fixed_period_years: 1,
            rent_adjustment_interval_years: 1,
            rent_adjustment_rate: Rate::ZERO,
            loan_rate: None,
            loan_term_years: None,
            loan_start_date: None,
            expenses: ExpenseRules::default(),
            acquisition_costs: AcquisitionCosts::default(),
            tax_schedule: TaxSchedule::default(),
            exit_assumptions: ExitAssumptions::default(),
        }
    }

    pub fn purchase_price(mut self, price: Money) -> Self {
        self.purchase_price = Some(price);
        self
    }

    pub fn owner_equity(mut self, equity: Money) -> Self {
        self.owner_equity = equity;
        self
    }

    pub fn building_price(mut self, price: Money) -> Self {
        self.building_price = Some(price);
        self
    }

    pub fn structure(mut self, structure: StructureClass) -> Self {
        self.structure = structure;
        self
    }

    pub fn occupancy_rate(mut self, rate: Rate) -> Self {
        self.occupancy_rate = rate;
        self
    }

    pub fn monthly_rent(mut self, rent: Money) -> Self {
        self.monthly_rent = Some(rent);
        self
    }

    pub fn rent_adjustment(
        mut self,
        fixed_period_years: u32,
        interval_years: u32,
        rate: Rate,
    ) -> Self {
        self.rent_fixed_period_years = fixed_period_years;
        self.rent_adjustment_interval_years = interval_years;
        self.rent_adjustment_rate = rate;
        self
    }

    pub fn loan_rate(mut self, rate: Rate) -> Self {
        self.loan_rate = Some(rate);
        self
    }

    pub fn loan_term_years(mut self, years: u32) -> Self {
        self.loan_term_years = Some(years);
        self
    }

    pub fn loan_start_date(mut self, date: NaiveDate) -> Self {
        self.loan_start_date = Some(date);
        self
    }

    pub fn expenses(mut self, expenses: ExpenseRules) -> Self {
        self.expenses = expenses;
        self
    }

    pub fn acquisition_costs(mut self, costs: AcquisitionCosts) -> Self {
        self.acquisition_costs = costs;
        self
    }

    pub fn tax_schedule(mut self, schedule: TaxSchedule) -> Self {
        self.tax_schedule = schedule;
        self
    }

    pub fn exit_assumptions(mut self, assumptions: ExitAssumptions) -> Self {
        self.exit_assumptions = assumptions;
        self
    }

    /// build, starting the loan today if no start date was given
    pub fn build(self) -> Result<PropertyLoanConfig> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.build_with_time(&time)
    }

    /// build with explicit time provider for the default start date
    pub fn build_with_time(self, time_provider: &SafeTimeProvider) -> Result<PropertyLoanConfig> {
        let purchase_price = self.purchase_price.ok_or(ProjectionError::InvalidConfiguration {
            message: "Purchase price required".to_string(),
        })?;

        let initial_monthly_rent = self.monthly_rent.ok_or(ProjectionError::InvalidConfiguration {
            message: "Monthly rent required".to_string(),
        })?;

        let loan_rate = self.loan_rate.ok_or(ProjectionError::InvalidConfiguration {
            message: "Loan rate required".to_string(),
        })?;

        let loan_term_years = self.loan_term_years.ok_or(ProjectionError::InvalidConfiguration {
            message: "Loan term required".to_string(),
        })?;

        let loan_start_date = self
            .loan_start_date
            .unwrap_or_else(|| time_provider.now().date_naive());

        Ok(PropertyLoanConfig {
            purchase_price,
            owner_equity: self.owner_equity,
            building_price: self.building_price.unwrap_or(Money::ZERO),
            structure: self.structure,
            occupancy_rate: self.occupancy_rate,
            initial_monthly_rent,
            rent_fixed_period_years: self.rent_fixed_period_years,
            rent_adjustment_interval_years: self.rent_adjustment_interval_years,
            rent_adjustment_rate: self.rent_adjustment_rate,
            loan_rate,
            loan_term_years,
            loan_start_date,
            expenses: self.expenses,
            acquisition_costs: self.acquisition_costs,
            tax_schedule: self.tax_schedule,
            exit_assumptions: self.exit_assumptions,
        })
    }
}
