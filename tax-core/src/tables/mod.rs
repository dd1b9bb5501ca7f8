//! Versioned bracket tables keyed by filing status and tax year.
//!
//! The engine never hard-codes a year: callers resolve a [`BracketTable`]
//! through a [`BracketTableProvider`] and hand it to the engine. Adding a
//! tax year means inserting new tables (built-in or loaded from data),
//! nothing else.

mod y2024;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{BracketTable, FilingStatus};

/// Errors raised while resolving or building bracket tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// No table of any filing status exists for the year.
    #[error("tax year {0} is not supported")]
    UnsupportedYear(i32),

    /// The year is modeled but not for this filing status.
    #[error("no bracket table for {filing_status} in tax year {tax_year}")]
    MissingTable {
        tax_year: i32,
        filing_status: FilingStatus,
    },

    /// The table breaks the bracket invariants.
    #[error("malformed bracket table for {filing_status} in tax year {tax_year}: {reason}")]
    Malformed {
        tax_year: i32,
        filing_status: FilingStatus,
        reason: String,
    },
}

/// Source of bracket tables.
pub trait BracketTableProvider: Send + Sync {
    /// Resolves the table for a filing status and year.
    ///
    /// # Errors
    ///
    /// [`TableError::UnsupportedYear`] when the year is not modeled at all,
    /// [`TableError::MissingTable`] when only the filing status is missing.
    fn lookup(
        &self,
        filing_status: FilingStatus,
        tax_year: i32,
    ) -> Result<&BracketTable, TableError>;

    fn standard_deduction(
        &self,
        filing_status: FilingStatus,
        tax_year: i32,
    ) -> Result<Decimal, TableError> {
        self.lookup(filing_status, tax_year)
            .map(BracketTable::standard_deduction)
    }

    /// Modeled years in ascending order.
    fn years(&self) -> Vec<i32>;
}

/// In-memory provider backed by a map keyed by `(year, filing status)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxTables {
    tables: BTreeMap<(i32, FilingStatus), BracketTable>,
}

impl TaxTables {
    /// An empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// The published tables shipped with the crate.
    pub fn builtin() -> Self {
        let mut tables = Self::new();
        tables.extend(y2024::tables());
        tables
    }

    /// Adds a table, replacing any existing table for the same year and
    /// filing status. Returns the replaced table.
    pub fn insert(
        &mut self,
        table: BracketTable,
    ) -> Option<BracketTable> {
        self.tables
            .insert((table.tax_year(), table.filing_status()), table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BracketTable> {
        self.tables.values()
    }
}

impl Extend<BracketTable> for TaxTables {
    fn extend<I: IntoIterator<Item = BracketTable>>(
        &mut self,
        iter: I,
    ) {
        for table in iter {
            self.insert(table);
        }
    }
}

impl FromIterator<BracketTable> for TaxTables {
    fn from_iter<I: IntoIterator<Item = BracketTable>>(iter: I) -> Self {
        let mut tables = Self::new();
        tables.extend(iter);
        tables
    }
}

impl BracketTableProvider for TaxTables {
    fn lookup(
        &self,
        filing_status: FilingStatus,
        tax_year: i32,
    ) -> Result<&BracketTable, TableError> {
        if let Some(table) = self.tables.get(&(tax_year, filing_status)) {
            return Ok(table);
        }
        if self.tables.keys().any(|(year, _)| *year == tax_year) {
            Err(TableError::MissingTable {
                tax_year,
                filing_status,
            })
        } else {
            Err(TableError::UnsupportedYear(tax_year))
        }
    }

    fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.tables.keys().map(|(year, _)| *year).collect();
        years.dedup();
        years
    }
}
