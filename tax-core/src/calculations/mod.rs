//! Tax calculations.
//!
//! The engine turns a taxpayer's inputs and one bracket table into a full
//! result; the schedule module derives estimated-payment due dates.

pub mod common;
pub mod engine;
pub mod schedule;
pub mod self_emp;

pub use engine::{TaxEngine, TaxError, calculate, estimate};
pub use schedule::{
    DueDateRule, ScheduleError, next_business_day, quarterly_due_dates,
    quarterly_due_dates_with_rule,
};
pub use self_emp::{SeWorksheet, SeWorksheetError, SeWorksheetResult, SelfEmploymentConfig};
