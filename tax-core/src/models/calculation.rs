use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::FilingStatus;

/// Rejected calculation input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: Decimal },
}

/// A taxpayer's financial inputs for one calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationInput {
    pub filing_status: FilingStatus,
    pub gross_income: Decimal,
    #[serde(default)]
    pub self_employment_income: Decimal,
    /// Itemized deductions claimed.
    #[serde(default)]
    pub deductions: Decimal,
    /// Tax already withheld or paid.
    #[serde(default)]
    pub withholdings: Decimal,
}

impl TaxCalculationInput {
    pub fn new(
        filing_status: FilingStatus,
        gross_income: Decimal,
    ) -> Self {
        Self {
            filing_status,
            gross_income,
            ..Default::default()
        }
    }

    pub fn with_self_employment_income(
        mut self,
        amount: Decimal,
    ) -> Self {
        self.self_employment_income = amount;
        self
    }

    pub fn with_deductions(
        mut self,
        amount: Decimal,
    ) -> Self {
        self.deductions = amount;
        self
    }

    pub fn with_withholdings(
        mut self,
        amount: Decimal,
    ) -> Self {
        self.withholdings = amount;
        self
    }

    fn amounts(&self) -> [(&'static str, Decimal); 4] {
        [
            ("grossIncome", self.gross_income),
            ("selfEmploymentIncome", self.self_employment_income),
            ("deductions", self.deductions),
            ("withholdings", self.withholdings),
        ]
    }

    /// Checks that every amount is non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Negative`] naming the first negative field.
    pub fn validate(&self) -> Result<(), InputError> {
        match self
            .amounts()
            .into_iter()
            .find(|(_, value)| value.is_sign_negative() && !value.is_zero())
        {
            Some((field, value)) => Err(InputError::Negative { field, value }),
            None => Ok(()),
        }
    }

    /// Copy of this input with negative amounts raised to zero.
    pub fn clamped(&self) -> Self {
        let floor = |value: Decimal| value.max(Decimal::ZERO);
        Self {
            filing_status: self.filing_status,
            gross_income: floor(self.gross_income),
            self_employment_income: floor(self.self_employment_income),
            deductions: floor(self.deductions),
            withholdings: floor(self.withholdings),
        }
    }
}

/// Which deduction the calculation applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionKind {
    Standard,
    Itemized,
}

/// Tax contributed by one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketTax {
    pub bracket: String,
    pub rate: Decimal,
    /// Taxable income falling inside the bracket.
    pub taxable_amount: Decimal,
    pub tax: Decimal,
}

/// Complete output of one calculation. Fully determined by the input and
/// the bracket table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationResult {
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    pub gross_income: Decimal,
    pub standard_deduction: Decimal,
    pub itemized_deductions: Decimal,
    pub deduction_used: DeductionKind,
    pub self_employment_deduction: Decimal,
    pub taxable_income: Decimal,
    pub federal_tax: Decimal,
    pub self_employment_tax: Decimal,
    pub total_tax: Decimal,
    pub effective_rate: Decimal,
    pub marginal_rate: Decimal,
    pub bracket_breakdown: Vec<BracketTax>,
    pub withholdings: Decimal,
    /// Negative when withholdings exceed the total tax.
    pub estimated_owed: Decimal,
    pub quarterly_payment: Decimal,
}

impl TaxCalculationResult {
    pub fn deduction_applied(&self) -> Decimal {
        match self.deduction_used {
            DeductionKind::Standard => self.standard_deduction,
            DeductionKind::Itemized => self.itemized_deductions,
        }
    }

    pub fn is_refund(&self) -> bool {
        self.estimated_owed < Decimal::ZERO
    }

    /// Amount refunded; zero when tax is owed.
    pub fn refund(&self) -> Decimal {
        if self.is_refund() {
            -self.estimated_owed
        } else {
            Decimal::ZERO
        }
    }

    /// Strips trailing zeros from every amount. Values are unchanged, only
    /// their scale, so `8341.00` prints as `8341`.
    pub fn normalized(mut self) -> Self {
        for amount in [
            &mut self.gross_income,
            &mut self.standard_deduction,
            &mut self.itemized_deductions,
            &mut self.self_employment_deduction,
            &mut self.taxable_income,
            &mut self.federal_tax,
            &mut self.self_employment_tax,
            &mut self.total_tax,
            &mut self.effective_rate,
            &mut self.marginal_rate,
            &mut self.withholdings,
            &mut self.estimated_owed,
            &mut self.quarterly_payment,
        ] {
            *amount = amount.normalize();
        }
        for entry in &mut self.bracket_breakdown {
            entry.rate = entry.rate.normalize();
            entry.taxable_amount = entry.taxable_amount.normalize();
            entry.tax = entry.tax.normalize();
        }
        self
    }
}
