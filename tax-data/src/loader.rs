use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{Bracket, BracketTable, FilingStatus, TableError, TaxTables};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when loading tax table data.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid filing status: {0}")]
    InvalidFilingStatus(String),

    #[error("duplicate standard deduction for {filing_status} in tax year {tax_year}")]
    DuplicateStandardDeduction {
        tax_year: i32,
        filing_status: FilingStatus,
    },

    #[error("no standard deduction for {filing_status} in tax year {tax_year}")]
    MissingStandardDeduction {
        tax_year: i32,
        filing_status: FilingStatus,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl From<csv::Error> for LoaderError {
    fn from(err: csv::Error) -> Self {
        LoaderError::CsvParse(err.to_string())
    }
}

/// Maps an IRS rate-schedule code to its filing status.
///
/// - Schedule X → Single
/// - Schedule Y-1 → Married Filing Jointly
/// - Schedule Y-2 → Married Filing Separately
/// - Schedule Z → Head of Household
pub fn schedule_to_filing_status(schedule: &str) -> Result<FilingStatus, LoaderError> {
    match schedule {
        "X" => Ok(FilingStatus::Single),
        "Y-1" => Ok(FilingStatus::MarriedJoint),
        "Y-2" => Ok(FilingStatus::MarriedSeparate),
        "Z" => Ok(FilingStatus::HeadOfHousehold),
        _ => Err(LoaderError::InvalidSchedule(schedule.to_string())),
    }
}

/// A single record from the brackets CSV file.
///
/// - `tax_year`: The tax year (e.g., 2024)
/// - `schedule`: The IRS schedule code (X, Y-1, Y-2, Z)
/// - `min_income`: Inclusive lower edge of the bracket
/// - `max_income`: Exclusive upper edge (empty for unbounded)
/// - `rate`: The marginal tax rate as a decimal (e.g., 0.10 for 10%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

/// A single record from the standard deductions CSV file. The filing
/// status may be the wire name (`married_joint`) or the short code (`MFJ`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StandardDeductionRecord {
    pub tax_year: i32,
    pub filing_status: String,
    pub amount: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn parse_records<R, T>(reader: R) -> Result<Vec<T>, LoaderError>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in csv_reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

fn open(path: &Path) -> Result<File, LoaderError> {
    File::open(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loader for bracket tables from CSV files.
///
/// The brackets CSV uses IRS schedule codes (X, Y-1, Y-2, Z) which are
/// mapped to filing statuses. Every (year, filing status) schedule needs a
/// matching standard deduction row.
pub struct TaxTableLoader;

impl TaxTableLoader {
    /// Parse bracket records from a CSV reader.
    pub fn parse_brackets<R: Read>(reader: R) -> Result<Vec<BracketRecord>, LoaderError> {
        parse_records(reader)
    }

    /// Parse standard deduction records from a CSV reader.
    pub fn parse_standard_deductions<R: Read>(
        reader: R
    ) -> Result<Vec<StandardDeductionRecord>, LoaderError> {
        parse_records(reader)
    }

    /// Assemble validated tables from parsed records.
    ///
    /// Brackets are grouped by (tax_year, schedule) and sorted by lower
    /// edge, so row order in the file does not matter. Each group becomes a
    /// [`BracketTable`], which validates contiguity and rates.
    pub fn build(
        brackets: &[BracketRecord],
        deductions: &[StandardDeductionRecord],
    ) -> Result<TaxTables, LoaderError> {
        let mut amounts: BTreeMap<(i32, FilingStatus), Decimal> = BTreeMap::new();
        for record in deductions {
            let filing_status = FilingStatus::parse(&record.filing_status)
                .ok_or_else(|| LoaderError::InvalidFilingStatus(record.filing_status.clone()))?;
            if amounts
                .insert((record.tax_year, filing_status), record.amount)
                .is_some()
            {
                return Err(LoaderError::DuplicateStandardDeduction {
                    tax_year: record.tax_year,
                    filing_status,
                });
            }
        }

        let mut schedules: BTreeMap<(i32, FilingStatus), Vec<Bracket>> = BTreeMap::new();
        for record in brackets {
            let filing_status = schedule_to_filing_status(&record.schedule)?;
            schedules
                .entry((record.tax_year, filing_status))
                .or_default()
                .push(Bracket {
                    lower_bound: record.min_income,
                    upper_bound: record.max_income.into(),
                    rate: record.rate,
                });
        }

        let mut tables = TaxTables::new();
        for ((tax_year, filing_status), mut brackets) in schedules {
            brackets.sort_by_key(|bracket| bracket.lower_bound);

            let standard_deduction = amounts.remove(&(tax_year, filing_status)).ok_or(
                LoaderError::MissingStandardDeduction {
                    tax_year,
                    filing_status,
                },
            )?;

            let table = BracketTable::new(tax_year, filing_status, standard_deduction, brackets)?;
            debug!(
                tax_year,
                %filing_status,
                brackets = table.brackets().len(),
                "loaded bracket table"
            );
            tables.insert(table);
        }

        for (tax_year, filing_status) in amounts.keys() {
            warn!(
                tax_year,
                %filing_status,
                "standard deduction has no matching bracket schedule; ignored"
            );
        }

        Ok(tables)
    }

    /// Parse both files and assemble the tables.
    pub fn load_files(
        brackets_path: &Path,
        deductions_path: &Path,
    ) -> Result<TaxTables, LoaderError> {
        let brackets = Self::parse_brackets(open(brackets_path)?)?;
        let deductions = Self::parse_standard_deductions(open(deductions_path)?)?;
        debug!(
            brackets = brackets.len(),
            deductions = deductions.len(),
            "parsed table CSV files"
        );
        Self::build(&brackets, &deductions)
    }
}
