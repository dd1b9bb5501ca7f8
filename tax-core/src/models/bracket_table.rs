use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Bracket, FilingStatus, UpperBound};
use crate::tables::TableError;

/// The rate schedule and standard deduction for one filing status in one
/// tax year.
///
/// Construction validates the schedule: brackets start at zero, are sorted
/// and contiguous, rates lie in `[0, 1]`, and exactly one bracket (the last)
/// is unbounded. A table is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketTable {
    tax_year: i32,
    filing_status: FilingStatus,
    standard_deduction: Decimal,
    brackets: Vec<Bracket>,
}

impl BracketTable {
    /// Builds a validated table.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Malformed`] if the brackets or the standard
    /// deduction break the table invariants.
    pub fn new(
        tax_year: i32,
        filing_status: FilingStatus,
        standard_deduction: Decimal,
        brackets: Vec<Bracket>,
    ) -> Result<Self, TableError> {
        let malformed = |reason: String| TableError::Malformed {
            tax_year,
            filing_status,
            reason,
        };

        if standard_deduction < Decimal::ZERO {
            return Err(malformed(format!(
                "standard deduction must be non-negative, got {standard_deduction}"
            )));
        }

        let Some(first) = brackets.first() else {
            return Err(malformed("no brackets".to_string()));
        };
        if !first.lower_bound.is_zero() {
            return Err(malformed(format!(
                "first bracket must start at 0, starts at {}",
                first.lower_bound
            )));
        }

        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(malformed(format!(
                    "bracket {index} rate must be between 0 and 1, got {}",
                    bracket.rate
                )));
            }

            let is_last = index + 1 == brackets.len();
            match (bracket.upper_bound, is_last) {
                (UpperBound::Unbounded, true) => {}
                (UpperBound::Unbounded, false) => {
                    return Err(malformed(format!(
                        "bracket {index} is unbounded but is not the last bracket"
                    )));
                }
                (UpperBound::Bounded(_), true) => {
                    return Err(malformed("last bracket must be unbounded".to_string()));
                }
                (UpperBound::Bounded(upper), false) => {
                    if upper <= bracket.lower_bound {
                        return Err(malformed(format!(
                            "bracket {index} upper bound {upper} is not above its lower bound {}",
                            bracket.lower_bound
                        )));
                    }
                    let next = &brackets[index + 1];
                    if next.lower_bound != upper {
                        return Err(malformed(format!(
                            "bracket {} starts at {} but bracket {index} ends at {upper}",
                            index + 1,
                            next.lower_bound
                        )));
                    }
                }
            }
        }

        Ok(Self::new_unchecked(
            tax_year,
            filing_status,
            standard_deduction,
            brackets,
        ))
    }

    /// For published constants that are covered by tests.
    pub(crate) fn new_unchecked(
        tax_year: i32,
        filing_status: FilingStatus,
        standard_deduction: Decimal,
        brackets: Vec<Bracket>,
    ) -> Self {
        Self {
            tax_year,
            filing_status,
            standard_deduction,
            brackets,
        }
    }

    pub fn tax_year(&self) -> i32 {
        self.tax_year
    }

    pub fn filing_status(&self) -> FilingStatus {
        self.filing_status
    }

    pub fn standard_deduction(&self) -> Decimal {
        self.standard_deduction
    }

    /// Brackets in ascending order of lower bound.
    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }
}
