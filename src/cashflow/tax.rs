use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

/// two-bracket corporate tax with local surcharges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSchedule {
    /// income up to this amount is taxed at the lower rate
    pub bracket_threshold: Money,
    pub lower_rate: Rate,
    pub upper_rate: Rate,
    /// local tax charged on the corporate tax amount
    pub local_rate_on_corporate_tax: Rate,
    /// local tax charged on taxable income
    pub local_rate_on_income: Rate,
}

impl Default for TaxSchedule {
    fn default() -> Self {
        Self {
            bracket_threshold: Money::from_yen(8_000_000),
            lower_rate: Rate::from_decimal(dec!(0.15)),
            upper_rate: Rate::from_decimal(dec!(0.232)),
            local_rate_on_corporate_tax: Rate::from_decimal(dec!(0.07)),
            local_rate_on_income: Rate::from_decimal(dec!(0.05)),
        }
    }
}

/// tax due on one amount of taxable income
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxAssessment {
    pub taxable_income: Money,
    pub corporate_tax: Money,
    pub local_tax: Money,
    pub total_tax: Money,
}

impl TaxAssessment {
    pub fn zero() -> Self {
        Self {
            taxable_income: Money::ZERO,
            corporate_tax: Money::ZERO,
            local_tax: Money::ZERO,
            total_tax: Money::ZERO,
        }
    }
}

impl TaxSchedule {
    /// corporate tax on taxable income; non-positive income owes nothing
    pub fn corporate_tax(&self, taxable_income: Money) -> Money {
        if !taxable_income.is_positive() {
            return Money::ZERO;
        }

        let in_lower = taxable_income.min(self.bracket_threshold);
        let in_upper = (taxable_income - self.bracket_threshold).max(Money::ZERO);

        in_lower.apply(self.lower_rate) + in_upper.apply(self.upper_rate)
    }

    /// local tax from the corporate tax and the income it was levied on
    pub fn local_tax(&self, corporate_tax: Money, taxable_income: Money) -> Money {
        let income = taxable_income.max(Money::ZERO);
        corporate_tax.apply(self.local_rate_on_corporate_tax)
            + income.apply(self.local_rate_on_income)
    }

    /// full assessment, flooring taxable income at zero
    pub fn assess(&self, taxable_income: Money) -> TaxAssessment {
        let taxable_income = taxable_income.max(Money::ZERO);
        let corporate_tax = self.corporate_tax(taxable_income);
        let local_tax = self.local_tax(corporate_tax, taxable_income);

        TaxAssessment {
            taxable_income,
            corporate_tax,
            local_tax,
            total_tax: corporate_tax + local_tax,
        }
    }
}
