//! CSV-backed bracket tables.
//!
//! A new tax year ships as two CSV files, one holding the rate schedules and
//! one holding the standard deductions. [`TaxTableLoader`] parses both and
//! assembles validated [`tax_core::TaxTables`].

mod loader;

pub use loader::{
    BracketRecord, LoaderError, StandardDeductionRecord, TaxTableLoader, schedule_to_filing_status,
};
