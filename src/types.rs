use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::decimal::{Money, Rate};
use crate::errors::ProjectionError;

/// building structure class, each with its statutory useful life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureClass {
    /// reinforced concrete
    #[serde(rename = "RC")]
    Rc,
    /// steel-reinforced concrete
    #[serde(rename = "SRC")]
    Src,
    /// heavy steel frame
    SteelHeavy,
    /// light steel frame
    SteelLight,
    Wood,
}

impl StructureClass {
    pub const ALL: [StructureClass; 5] = [
        StructureClass::Rc,
        StructureClass::Src,
        StructureClass::SteelHeavy,
        StructureClass::SteelLight,
        StructureClass::Wood,
    ];

    /// statutory useful life in years
    pub fn lifespan_years(&self) -> u32 {
        match self {
            StructureClass::Rc | StructureClass::Src => 47,
            StructureClass::SteelHeavy => 34,
            StructureClass::SteelLight => 19,
            StructureClass::Wood => 22,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StructureClass::Rc => "RC",
            StructureClass::Src => "SRC",
            StructureClass::SteelHeavy => "steel-heavy",
            StructureClass::SteelLight => "steel-light",
            StructureClass::Wood => "wood",
        }
    }
}

impl fmt::Display for StructureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StructureClass {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        StructureClass::ALL
            .iter()
            .copied()
            .find(|class| class.label().to_ascii_lowercase() == normalized)
            .ok_or_else(|| ProjectionError::InvalidInput {
                message: format!("unknown structure class: {s}"),
            })
    }
}

/// one month of the loan schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based month index
    pub month: u32,
    pub date: NaiveDate,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining: Money,
}

/// one year of operating cash flow and tax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualCashFlowRow {
    /// 1-based year index
    pub year: u32,
    /// number of schedule months folded into this row
    pub months: u32,
    pub rent: Money,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    /// management fee plus management commission
    pub management: Money,
    pub maintenance_reserve: Money,
    pub property_tax: Money,
    pub insurance: Money,
    pub other: Money,
    pub depreciation: Money,
    pub taxable_income: Money,
    pub corporate_tax: Money,
    pub local_tax: Money,
    pub total_tax: Money,
    pub after_tax_cash_flow: Money,
    pub cumulative_cash_flow: Money,
    pub ending_loan_balance: Money,
    pub building_book_value: Money,
    /// maintenance reserve accumulated to date
    pub reserve_balance: Money,
}

impl AnnualCashFlowRow {
    /// expenses deductible for corporate tax
    pub fn deductible_expenses(&self) -> Money {
        self.management + self.property_tax + self.insurance + self.other
    }
}

/// one month of the loan schedule next to the rent it is paid from
///
/// Pre-tax: `cash_flow` is effective rent less the payment, operating
/// expenses and the reserve contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCashFlowRow {
    pub month: u32,
    pub year: u32,
    pub date: NaiveDate,
    /// rent after occupancy
    pub effective_rent: Money,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining: Money,
    /// management plus a twelfth of the annual fixed charges
    pub operating_expenses: Money,
    pub maintenance_reserve: Money,
    pub cash_flow: Money,
}

/// exit metrics assuming a sale at the end of `year`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRow {
    pub year: u32,
    pub sale_price: Money,
    pub selling_cost: Money,
    pub capital_gains_tax: Money,
    pub net_sale_proceeds: Money,
    pub irr: Option<Rate>,
    pub equity_multiple: Option<rust_decimal::Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifespans() {
        assert_eq!(StructureClass::Rc.lifespan_years(), 47);
        assert_eq!(StructureClass::Src.lifespan_years(), 47);
        assert_eq!(StructureClass::SteelHeavy.lifespan_years(), 34);
        assert_eq!(StructureClass::SteelLight.lifespan_years(), 19);
        assert_eq!(StructureClass::Wood.lifespan_years(), 22);
    }

    #[test]
    fn test_structure_parsing() {
        assert_eq!("rc".parse::<StructureClass>().unwrap(), StructureClass::Rc);
        assert_eq!("steel_light".parse::<StructureClass>().unwrap(), StructureClass::SteelLight);
        assert_eq!(" Wood ".parse::<StructureClass>().unwrap(), StructureClass::Wood);
        assert!("brick".parse::<StructureClass>().is_err());
    }

    #[test]
    fn test_structure_serde_names() {
        let json = serde_json::to_string(&StructureClass::SteelHeavy).unwrap();
        assert_eq!(json, "\"steel-heavy\"");
        let parsed: StructureClass = serde_json::from_str("\"SRC\"").unwrap();
        assert_eq!(parsed, StructureClass::Src);
    }
}
