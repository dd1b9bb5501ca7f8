//! Self-employment tax.
//!
//! The worksheet has four lines:
//!
//! | Line | Description |
//! |------|-------------|
//! | 1    | Net profit from self-employment (losses count as zero) |
//! | 2    | Net earnings: Line 1 × 92.35% (net earnings factor) |
//! | 3    | Self-employment tax: Line 2 × 15.3% (combined rate) |
//! | 4    | Deductible part of SE tax: Line 3 × 50% |
//!
//! The 92.35% factor removes the employer-equivalent share before the
//! combined social security and Medicare rate applies. Line 4 is the
//! above-the-line deduction subtracted from gross income before the rate
//! schedule is applied.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::{SeWorksheet, SelfEmploymentConfig};
//!
//! let worksheet = SeWorksheet::new(SelfEmploymentConfig::default()).unwrap();
//! let result = worksheet.calculate(dec!(50000));
//!
//! assert_eq!(result.net_earnings, dec!(46175));
//! assert_eq!(result.self_employment_tax, dec!(7064.775));
//! assert_eq!(result.se_tax_deduction, dec!(3532.3875));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::calculations::common::floor_at_zero;

/// Errors raised by an invalid [`SelfEmploymentConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeWorksheetError {
    /// The net earnings factor must be in (0, 1].
    #[error("net earnings factor must be between 0 and 1, got {0}")]
    InvalidNetEarningsFactor(Decimal),

    /// The combined tax rate must be in [0, 1].
    #[error("self-employment tax rate must be between 0 and 1, got {0}")]
    InvalidTaxRate(Decimal),

    /// The deduction factor must be in [0, 1].
    #[error("deduction factor must be between 0 and 1, got {0}")]
    InvalidDeductionFactor(Decimal),
}

/// Rates used by the worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfEmploymentConfig {
    /// Share of net profit subject to SE tax. Statutory value 92.35%.
    pub net_earnings_factor: Decimal,

    /// Combined social security and Medicare rate. Statutory value 15.3%.
    pub tax_rate: Decimal,

    /// Share of SE tax deductible from gross income. Statutory value 50%.
    pub deduction_factor: Decimal,
}

impl Default for SelfEmploymentConfig {
    fn default() -> Self {
        Self {
            net_earnings_factor: dec!(0.9235),
            tax_rate: dec!(0.153),
            deduction_factor: dec!(0.50),
        }
    }
}

impl SelfEmploymentConfig {
    /// Checks that every factor lies in its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`SeWorksheetError`] naming the first out-of-range value.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tax_core::calculations::{SeWorksheetError, SelfEmploymentConfig};
    ///
    /// let config = SelfEmploymentConfig {
    ///     tax_rate: dec!(1.53),
    ///     ..SelfEmploymentConfig::default()
    /// };
    ///
    /// assert_eq!(config.validate(), Err(SeWorksheetError::InvalidTaxRate(dec!(1.53))));
    /// ```
    pub fn validate(&self) -> Result<(), SeWorksheetError> {
        if self.net_earnings_factor <= Decimal::ZERO || self.net_earnings_factor > Decimal::ONE {
            return Err(SeWorksheetError::InvalidNetEarningsFactor(
                self.net_earnings_factor,
            ));
        }
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(SeWorksheetError::InvalidTaxRate(self.tax_rate));
        }
        if self.deduction_factor < Decimal::ZERO || self.deduction_factor > Decimal::ONE {
            return Err(SeWorksheetError::InvalidDeductionFactor(
                self.deduction_factor,
            ));
        }
        Ok(())
    }
}

/// Result of the SE worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeWorksheetResult {
    /// Net profit used (Line 1).
    pub se_income: Decimal,

    /// Net earnings subject to SE tax (Line 2).
    pub net_earnings: Decimal,

    /// Self-employment tax (Line 3).
    pub self_employment_tax: Decimal,

    /// Deductible part of SE tax (Line 4).
    pub se_tax_deduction: Decimal,
}

/// Calculator for the SE worksheet. Holds a validated configuration, so
/// [`SeWorksheet::calculate`] cannot fail.
#[derive(Debug, Clone, Default)]
pub struct SeWorksheet {
    config: SelfEmploymentConfig,
}

impl SeWorksheet {
    /// # Errors
    ///
    /// Returns [`SeWorksheetError`] if the configuration is invalid.
    pub fn new(config: SelfEmploymentConfig) -> Result<Self, SeWorksheetError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn calculate(
        &self,
        se_income: Decimal,
    ) -> SeWorksheetResult {
        let se_income = self.net_profit(se_income);
        let net_earnings = self.net_earnings(se_income);
        let self_employment_tax = self.self_employment_tax(net_earnings);
        let se_tax_deduction = self.se_tax_deduction(self_employment_tax);

        SeWorksheetResult {
            se_income,
            net_earnings,
            self_employment_tax,
            se_tax_deduction,
        }
    }

    /// Line 1.
    fn net_profit(
        &self,
        se_income: Decimal,
    ) -> Decimal {
        if se_income < Decimal::ZERO {
            warn!(%se_income, "self-employment loss treated as zero for SE tax");
        }
        floor_at_zero(se_income)
    }

    /// Line 2.
    fn net_earnings(
        &self,
        se_income: Decimal,
    ) -> Decimal {
        se_income * self.config.net_earnings_factor
    }

    /// Line 3.
    fn self_employment_tax(
        &self,
        net_earnings: Decimal,
    ) -> Decimal {
        net_earnings * self.config.tax_rate
    }

    /// Line 4.
    fn se_tax_deduction(
        &self,
        self_employment_tax: Decimal,
    ) -> Decimal {
        self_employment_tax * self.config.deduction_factor
    }
}
