//! Lenient decoding of request bodies.
//!
//! Callers send loosely typed JSON. Amounts may be numbers or numeric
//! strings (`"75,000"`); anything unusable becomes 0 with a warning. A
//! negative amount is kept here and raised to 0, again with a warning, when
//! the request becomes a [`TaxCalculationInput`]. A missing or unknown
//! filing status means single.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tax_core::{FilingStatus, TaxCalculationInput};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("request body must be a JSON object")]
    NotAnObject,
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, RequestError> {
    body.as_object().ok_or(RequestError::NotAnObject)
}

fn parse_decimal_str(s: &str) -> Option<Decimal> {
    let normalized = s.trim().replace(',', "");
    if normalized.is_empty() {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}

/// A JSON value as an amount. `None` when the value is not numeric.
fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Null => Some(Decimal::ZERO),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                parse_decimal_str(&n.to_string())
            }
        }
        Value::String(s) => parse_decimal_str(s),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_amount(
    body: &Map<String, Value>,
    field: &'static str,
) -> Decimal {
    let Some(value) = body.get(field) else {
        return Decimal::ZERO;
    };
    parse_amount(value).unwrap_or_else(|| {
        warn!(field, %value, "amount is not numeric; using 0");
        Decimal::ZERO
    })
}

fn coerce_filing_status(body: &Map<String, Value>) -> FilingStatus {
    match body.get("filingStatus") {
        None | Some(Value::Null) => FilingStatus::default(),
        Some(Value::String(s)) if s.trim().is_empty() => FilingStatus::default(),
        Some(Value::String(s)) => FilingStatus::parse(s).unwrap_or_else(|| {
            warn!(filing_status = %s, "unknown filing status; using single");
            FilingStatus::default()
        }),
        Some(other) => {
            warn!(filing_status = %other, "filing status is not a string; using single");
            FilingStatus::default()
        }
    }
}

fn coerce_year(
    body: &Map<String, Value>,
    field: &'static str,
) -> Option<i32> {
    let value = body.get(field)?;
    let year = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if year.is_none() {
        warn!(field, %value, "year is not an integer; using the default year");
    }
    year
}

/// Body of a calculation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculateRequest {
    pub filing_status: FilingStatus,
    pub gross_income: Decimal,
    pub self_employment_income: Decimal,
    pub deductions: Decimal,
    pub withholdings: Decimal,
    /// `None` means the configured default year.
    pub tax_year: Option<i32>,
}

impl CalculateRequest {
    /// # Errors
    ///
    /// [`RequestError::NotAnObject`] when `body` is not a JSON object. Every
    /// field problem is coerced instead.
    pub fn from_json(body: &Value) -> Result<Self, RequestError> {
        let body = as_object(body)?;
        Ok(Self {
            filing_status: coerce_filing_status(body),
            gross_income: coerce_amount(body, "grossIncome"),
            self_employment_income: coerce_amount(body, "selfEmploymentIncome"),
            deductions: coerce_amount(body, "deductions"),
            withholdings: coerce_amount(body, "withholdings"),
            tax_year: coerce_year(body, "taxYear"),
        })
    }

    /// The engine input, with negative amounts clamped to 0.
    pub fn input(&self) -> TaxCalculationInput {
        let input = TaxCalculationInput::new(self.filing_status, self.gross_income)
            .with_self_employment_income(self.self_employment_income)
            .with_deductions(self.deductions)
            .with_withholdings(self.withholdings);
        if let Err(e) = input.validate() {
            warn!(error = %e, "negative amounts clamped to 0");
        }
        input.clamped()
    }
}

/// Body of a quarterly schedule request: `{ "year": 2024 }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuarterlyRequest {
    pub year: Option<i32>,
}

impl QuarterlyRequest {
    pub fn from_json(body: &Value) -> Result<Self, RequestError> {
        let body = as_object(body)?;
        Ok(Self {
            year: coerce_year(body, "year"),
        })
    }
}
