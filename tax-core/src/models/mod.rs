mod bracket_table;
mod calculation;
mod filing_status;
mod quarter_period;
mod tax_bracket;

pub use bracket_table::BracketTable;
pub use calculation::{
    BracketTax, DeductionKind, InputError, TaxCalculationInput, TaxCalculationResult,
};
pub use filing_status::FilingStatus;
pub use quarter_period::QuarterPeriod;
pub use tax_bracket::{Bracket, UpperBound};
