pub mod boundary;
pub mod cashflow;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod exit;
pub mod payments;
pub mod projection;
pub mod rent;
pub mod types;
pub mod validation;

// re-export key types
pub use boundary::{ManYenInput, ProjectionView};
pub use cashflow::{aggregate_by_year, CashFlowAggregator, TaxAssessment, TaxSchedule};
pub use config::{
    AcquisitionCosts, ExpenseRule, ExpenseRules, PropertyLoanConfig, PropertyLoanConfigBuilder,
};
pub use decimal::{Money, Rate};
pub use errors::{ProjectionError, Result};
pub use exit::{
    equity_multiple, project_exit, ExitAnalyzer, ExitAssumptions, PriceStage, SaleOutcome,
    SalePricePath,
};
pub use payments::{build_schedule, monthly_payment, AmortizationSchedule};
pub use projection::{project, ProjectionResult, ProjectionSummary};
pub use rent::{rent_for_year, RentSchedule};
pub use types::{AmortizationRow, AnnualCashFlowRow, ExitRow, MonthlyCashFlowRow, StructureClass};
pub use validation::{validate, ValidationReport};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
