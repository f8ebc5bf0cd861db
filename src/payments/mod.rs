pub mod amortization;

pub use amortization::{build_schedule, monthly_payment, AmortizationSchedule};
