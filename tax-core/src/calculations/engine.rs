//! Federal income tax engine.
//!
//! Applies one [`BracketTable`] to a [`TaxCalculationInput`]:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Deduction: itemized if strictly greater than standard, else standard |
//! | 2    | Self-employment tax (see [`SeWorksheet`]) |
//! | 3    | Above-the-line deduction of half the SE tax |
//! | 4    | Taxable income: gross - deduction - half SE tax (minimum 0) |
//! | 5    | Federal tax: walk the brackets, accumulating tax per bracket |
//! | 6    | Total tax: federal tax + SE tax; effective rate |
//! | 7    | Estimated owed: total tax - withholdings (negative is a refund) |
//! | 8    | Quarterly payment: estimated owed / 4 (minimum 0) |
//!
//! No step rounds; every amount is exact decimal arithmetic.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::TaxEngine;
//! use tax_core::{BracketTableProvider, FilingStatus, TaxCalculationInput, TaxTables};
//!
//! let tables = TaxTables::builtin();
//! let table = tables.lookup(FilingStatus::Single, 2024).unwrap();
//! let input = TaxCalculationInput::new(FilingStatus::Single, dec!(75000));
//!
//! let result = TaxEngine::default().calculate(&input, table);
//!
//! assert_eq!(result.taxable_income, dec!(60400));
//! assert_eq!(result.federal_tax, dec!(8341));
//! assert_eq!(result.quarterly_payment, dec!(2085.25));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::floor_at_zero;
use crate::calculations::self_emp::{SeWorksheet, SeWorksheetError, SelfEmploymentConfig};
use crate::models::{
    Bracket, BracketTable, BracketTax, DeductionKind, InputError, TaxCalculationInput,
    TaxCalculationResult,
};
use crate::tables::{BracketTableProvider, TableError};

const QUARTERS_PER_YEAR: Decimal = dec!(4);

/// Errors from [`estimate`], which validates and resolves before calculating.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Tax accumulated over the rate schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BracketAccumulation {
    federal_tax: Decimal,
    marginal_rate: Decimal,
    breakdown: Vec<BracketTax>,
}

/// The tax engine. Stateless apart from its self-employment rates, so one
/// instance can serve any number of concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct TaxEngine {
    se_worksheet: SeWorksheet,
}

impl TaxEngine {
    /// Engine with non-default self-employment rates.
    ///
    /// # Errors
    ///
    /// Returns [`SeWorksheetError`] if the configuration is invalid.
    pub fn with_self_employment(config: SelfEmploymentConfig) -> Result<Self, SeWorksheetError> {
        Ok(Self {
            se_worksheet: SeWorksheet::new(config)?,
        })
    }

    /// Runs the full calculation.
    ///
    /// The engine is total over non-negative input; validate with
    /// [`TaxCalculationInput::validate`] first or use [`estimate`].
    pub fn calculate(
        &self,
        input: &TaxCalculationInput,
        table: &BracketTable,
    ) -> TaxCalculationResult {
        let standard_deduction = table.standard_deduction();
        let (deduction, deduction_used) =
            self.select_deduction(input.deductions, standard_deduction);

        let se = self.se_worksheet.calculate(input.self_employment_income);

        let taxable_income =
            self.taxable_income(input.gross_income, deduction, se.se_tax_deduction);

        let BracketAccumulation {
            federal_tax,
            marginal_rate,
            breakdown,
        } = self.accumulate_brackets(taxable_income, table.brackets());

        let total_tax = federal_tax + se.self_employment_tax;
        let effective_rate = self.effective_rate(total_tax, input.gross_income);
        let estimated_owed = total_tax - input.withholdings;
        let quarterly_payment = self.quarterly_payment(estimated_owed);

        debug!(
            tax_year = table.tax_year(),
            filing_status = %input.filing_status,
            %taxable_income,
            %federal_tax,
            self_employment_tax = %se.self_employment_tax,
            %estimated_owed,
            "tax calculated"
        );

        TaxCalculationResult {
            tax_year: table.tax_year(),
            filing_status: input.filing_status,
            gross_income: input.gross_income,
            standard_deduction,
            itemized_deductions: input.deductions,
            deduction_used,
            self_employment_deduction: se.se_tax_deduction,
            taxable_income,
            federal_tax,
            self_employment_tax: se.self_employment_tax,
            total_tax,
            effective_rate,
            marginal_rate,
            bracket_breakdown: breakdown,
            withholdings: input.withholdings,
            estimated_owed,
            quarterly_payment,
        }
    }

    /// Itemized wins only when strictly greater; a tie goes to standard.
    fn select_deduction(
        &self,
        itemized: Decimal,
        standard: Decimal,
    ) -> (Decimal, DeductionKind) {
        if itemized > standard {
            (itemized, DeductionKind::Itemized)
        } else {
            (standard, DeductionKind::Standard)
        }
    }

    /// A difference below the representable range is negative, so it floors
    /// to zero like any other.
    fn taxable_income(
        &self,
        gross_income: Decimal,
        deduction: Decimal,
        se_tax_deduction: Decimal,
    ) -> Decimal {
        gross_income
            .checked_sub(deduction)
            .and_then(|income| income.checked_sub(se_tax_deduction))
            .map_or(Decimal::ZERO, floor_at_zero)
    }

    /// Walks the brackets below `taxable_income`. Only brackets that
    /// contribute tax appear in the breakdown, and the marginal rate is the
    /// rate of the last one.
    fn accumulate_brackets(
        &self,
        taxable_income: Decimal,
        brackets: &[Bracket],
    ) -> BracketAccumulation {
        let mut accumulation = BracketAccumulation::default();

        for bracket in brackets.iter().filter(|b| b.lower_bound < taxable_income) {
            let taxable_amount = bracket.amount_within(taxable_income);
            let tax = taxable_amount * bracket.rate;
            if tax.is_zero() {
                continue;
            }

            accumulation.federal_tax += tax;
            accumulation.marginal_rate = bracket.rate;
            accumulation.breakdown.push(BracketTax {
                bracket: bracket.label(),
                rate: bracket.rate,
                taxable_amount,
                tax,
            });
        }

        accumulation
    }

    /// Zero when there is no gross income. A ratio too large to represent
    /// saturates at [`Decimal::MAX`].
    fn effective_rate(
        &self,
        total_tax: Decimal,
        gross_income: Decimal,
    ) -> Decimal {
        if gross_income > Decimal::ZERO {
            total_tax.checked_div(gross_income).unwrap_or(Decimal::MAX)
        } else {
            Decimal::ZERO
        }
    }

    /// A refund spreads nothing across the quarters.
    fn quarterly_payment(
        &self,
        estimated_owed: Decimal,
    ) -> Decimal {
        floor_at_zero(estimated_owed / QUARTERS_PER_YEAR)
    }
}

/// Calculates with the statutory self-employment rates.
pub fn calculate(
    input: &TaxCalculationInput,
    table: &BracketTable,
) -> TaxCalculationResult {
    TaxEngine::default().calculate(input, table)
}

/// Validates `input`, resolves its table for `tax_year`, and calculates.
///
/// # Errors
///
/// * [`TaxError::Input`] when an amount is negative.
/// * [`TaxError::Table`] when the year or filing status is not modeled.
pub fn estimate<P>(
    provider: &P,
    input: &TaxCalculationInput,
    tax_year: i32,
) -> Result<TaxCalculationResult, TaxError>
where
    P: BracketTableProvider + ?Sized,
{
    input.validate()?;
    let table = provider.lookup(input.filing_status, tax_year)?;
    Ok(calculate(input, table))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::FilingStatus;
    use crate::tables::TaxTables;

    fn table_2024(filing_status: FilingStatus) -> BracketTable {
        TaxTables::builtin()
            .lookup(filing_status, 2024)
            .unwrap()
            .clone()
    }

    fn single_2024() -> BracketTable {
        table_2024(FilingStatus::Single)
    }

    fn engine() -> TaxEngine {
        TaxEngine::default()
    }

    fn single(gross_income: Decimal) -> TaxCalculationInput {
        TaxCalculationInput::new(FilingStatus::Single, gross_income)
    }

    // =========================================================================
    // select_deduction tests
    // =========================================================================

    #[test]
    fn select_deduction_uses_itemized_when_larger() {
        let (deduction, kind) = engine().select_deduction(dec!(20000), dec!(14600));

        assert_eq!(deduction, dec!(20000));
        assert_eq!(kind, DeductionKind::Itemized);
    }

    #[test]
    fn select_deduction_uses_standard_when_itemized_smaller() {
        let (deduction, kind) = engine().select_deduction(dec!(9000), dec!(14600));

        assert_eq!(deduction, dec!(14600));
        assert_eq!(kind, DeductionKind::Standard);
    }

    #[test]
    fn select_deduction_tie_goes_to_standard() {
        let (deduction, kind) = engine().select_deduction(dec!(14600), dec!(14600));

        assert_eq!(deduction, dec!(14600));
        assert_eq!(kind, DeductionKind::Standard);
    }

    // =========================================================================
    // taxable_income tests
    // =========================================================================

    #[test]
    fn taxable_income_subtracts_deduction_and_half_se_tax() {
        let result = engine().taxable_income(dec!(50000), dec!(14600), dec!(3532.3875));

        assert_eq!(result, dec!(31867.6125));
    }

    #[test]
    fn taxable_income_never_negative() {
        let result = engine().taxable_income(dec!(10000), dec!(14600), dec!(0));

        assert_eq!(result, dec!(0));
    }

    // =========================================================================
    // accumulate_brackets tests
    // =========================================================================

    #[test]
    fn accumulate_brackets_zero_income() {
        let table = single_2024();

        let acc = engine().accumulate_brackets(dec!(0), table.brackets());

        assert_eq!(acc, BracketAccumulation::default());
    }

    #[test]
    fn accumulate_brackets_three_brackets() {
        let table = single_2024();

        let acc = engine().accumulate_brackets(dec!(60400), table.brackets());

        assert_eq!(acc.federal_tax, dec!(8341));
        assert_eq!(acc.marginal_rate, dec!(0.22));
        assert_eq!(
            acc.breakdown,
            vec![
                BracketTax {
                    bracket: "10% ($0 - $11,600)".to_string(),
                    rate: dec!(0.10),
                    taxable_amount: dec!(11600),
                    tax: dec!(1160),
                },
                BracketTax {
                    bracket: "12% ($11,600 - $47,150)".to_string(),
                    rate: dec!(0.12),
                    taxable_amount: dec!(35550),
                    tax: dec!(4266),
                },
                BracketTax {
                    bracket: "22% ($47,150 - $100,525)".to_string(),
                    rate: dec!(0.22),
                    taxable_amount: dec!(13250),
                    tax: dec!(2915),
                },
            ]
        );
    }

    #[test]
    fn accumulate_brackets_on_boundary_stays_in_lower_bracket() {
        let table = single_2024();

        let acc = engine().accumulate_brackets(dec!(11600), table.brackets());

        assert_eq!(acc.federal_tax, dec!(1160));
        assert_eq!(acc.marginal_rate, dec!(0.10));
        assert_eq!(acc.breakdown.len(), 1);
    }

    #[test]
    fn accumulate_brackets_one_cent_over_boundary() {
        let table = single_2024();

        let acc = engine().accumulate_brackets(dec!(11600.01), table.brackets());

        assert_eq!(acc.federal_tax, dec!(1160.0012));
        assert_eq!(acc.marginal_rate, dec!(0.12));
    }

    #[test]
    fn accumulate_brackets_top_bracket() {
        let table = single_2024();

        let acc = engine().accumulate_brackets(dec!(700000), table.brackets());

        // 1160 + 4266 + 11742.50 + 21942 + 16568 + 127968.75 + 33540.50
        assert_eq!(acc.federal_tax, dec!(217187.75));
        assert_eq!(acc.marginal_rate, dec!(0.37));
        assert_eq!(acc.breakdown.len(), 7);
        assert_eq!(acc.breakdown[6].bracket, "37% (over $609,350)");
    }

    #[test]
    fn accumulate_brackets_skips_zero_rate_bracket() {
        let table = BracketTable::new(
            2024,
            FilingStatus::Single,
            dec!(0),
            vec![
                Bracket::bounded(dec!(0), dec!(1000), dec!(0)),
                Bracket::unbounded(dec!(1000), dec!(0.10)),
            ],
        )
        .unwrap();

        let acc = engine().accumulate_brackets(dec!(500), table.brackets());

        assert!(acc.breakdown.is_empty());
        assert_eq!(acc.marginal_rate, dec!(0));
    }

    // =========================================================================
    // effective_rate / quarterly_payment tests
    // =========================================================================

    #[test]
    fn effective_rate_zero_gross_income() {
        assert_eq!(engine().effective_rate(dec!(500), dec!(0)), dec!(0));
    }

    #[test]
    fn effective_rate_divides_total_by_gross() {
        assert_eq!(engine().effective_rate(dec!(10000), dec!(40000)), dec!(0.25));
    }

    #[test]
    fn quarterly_payment_spreads_balance() {
        assert_eq!(engine().quarterly_payment(dec!(8341)), dec!(2085.25));
    }

    #[test]
    fn quarterly_payment_zero_for_refund() {
        assert_eq!(engine().quarterly_payment(dec!(-1200)), dec!(0));
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn calculate_single_wage_earner() {
        let result = engine().calculate(&single(dec!(75000)), &single_2024());

        assert_eq!(result.tax_year, 2024);
        assert_eq!(result.gross_income, dec!(75000));
        assert_eq!(result.standard_deduction, dec!(14600));
        assert_eq!(result.itemized_deductions, dec!(0));
        assert_eq!(result.deduction_used, DeductionKind::Standard);
        assert_eq!(result.taxable_income, dec!(60400));
        assert_eq!(result.federal_tax, dec!(8341));
        assert_eq!(result.self_employment_tax, dec!(0));
        assert_eq!(result.total_tax, dec!(8341));
        assert_eq!(result.marginal_rate, dec!(0.22));
        assert_eq!(result.effective_rate, dec!(8341) / dec!(75000));
        assert_eq!(result.estimated_owed, dec!(8341));
        assert_eq!(result.quarterly_payment, dec!(2085.25));
    }

    #[test]
    fn calculate_with_self_employment_income() {
        let input = single(dec!(50000)).with_self_employment_income(dec!(50000));

        let result = engine().calculate(&input, &single_2024());

        assert_eq!(result.self_employment_tax, dec!(7064.775));
        assert_eq!(result.self_employment_deduction, dec!(3532.3875));
        assert_eq!(result.taxable_income, dec!(31867.6125));
        // 1160 + (31867.6125 - 11600) * 0.12
        assert_eq!(result.federal_tax, dec!(3592.1135));
        assert_eq!(result.total_tax, dec!(10656.8885));
        assert_eq!(result.quarterly_payment, dec!(2664.222125));
        assert_eq!(result.marginal_rate, dec!(0.12));
    }

    #[test]
    fn calculate_with_itemized_deductions() {
        let input = single(dec!(75000)).with_deductions(dec!(20000));

        let result = engine().calculate(&input, &single_2024());

        assert_eq!(result.deduction_used, DeductionKind::Itemized);
        assert_eq!(result.deduction_applied(), dec!(20000));
        assert_eq!(result.taxable_income, dec!(55000));
    }

    #[test]
    fn calculate_deduction_tie_uses_standard() {
        let input = single(dec!(75000)).with_deductions(dec!(14600));

        let result = engine().calculate(&input, &single_2024());

        assert_eq!(result.deduction_used, DeductionKind::Standard);
        assert_eq!(result.itemized_deductions, dec!(14600));
    }

    #[test]
    fn calculate_zero_income() {
        let result = engine().calculate(&single(dec!(0)), &single_2024());

        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.federal_tax, dec!(0));
        assert_eq!(result.marginal_rate, dec!(0));
        assert_eq!(result.effective_rate, dec!(0));
        assert!(result.bracket_breakdown.is_empty());
        assert_eq!(result.quarterly_payment, dec!(0));
    }

    #[test]
    fn calculate_refund_keeps_negative_balance() {
        let input = single(dec!(75000)).with_withholdings(dec!(9000));

        let result = engine().calculate(&input, &single_2024());

        assert_eq!(result.estimated_owed, dec!(-659));
        assert!(result.is_refund());
        assert_eq!(result.refund(), dec!(659));
        assert_eq!(result.quarterly_payment, dec!(0));
    }

    #[test]
    fn calculate_partial_withholdings() {
        let input = single(dec!(75000)).with_withholdings(dec!(4341));

        let result = engine().calculate(&input, &single_2024());

        assert_eq!(result.estimated_owed, dec!(4000));
        assert_eq!(result.quarterly_payment, dec!(1000));
        assert!(!result.is_refund());
    }

    #[test]
    fn calculate_huge_itemized_deduction_floors_taxable_income() {
        let input = single(dec!(0))
            .with_self_employment_income(dec!(100))
            .with_deductions(Decimal::MAX);

        let result = engine().calculate(&input, &single_2024());

        assert_eq!(result.deduction_used, DeductionKind::Itemized);
        assert_eq!(result.taxable_income, dec!(0));
        assert_eq!(result.federal_tax, dec!(0));
        assert_eq!(result.self_employment_tax, dec!(14.1295500));
    }

    #[test]
    fn calculate_tiny_gross_income_saturates_effective_rate() {
        let input = single(Decimal::new(1, 28)).with_self_employment_income(dec!(1000000000));

        let result = engine().calculate(&input, &single_2024());

        assert_eq!(result.effective_rate, Decimal::MAX);
        assert_eq!(result.federal_tax, dec!(0));
    }

    #[test]
    fn calculate_is_idempotent() {
        let input = single(dec!(123456.78))
            .with_self_employment_income(dec!(23456.78))
            .with_deductions(dec!(15000))
            .with_withholdings(dec!(10000));
        let table = single_2024();

        let first = engine().calculate(&input, &table);
        let second = engine().calculate(&input, &table);

        assert_eq!(first, second);
    }

    #[test]
    fn calculate_breakdown_sums_to_federal_tax() {
        for &filing_status in FilingStatus::all() {
            let table = table_2024(filing_status);
            for gross in [1, 12000, 26200, 61750, 115125, 206550, 258325, 623950, 2_000_000] {
                let input = TaxCalculationInput::new(filing_status, Decimal::from(gross))
                    .with_self_employment_income(dec!(15000));

                let result = engine().calculate(&input, &table);

                let sum: Decimal = result.bracket_breakdown.iter().map(|b| b.tax).sum();
                assert_eq!(sum, result.federal_tax, "{filing_status} gross {gross}");
            }
        }
    }

    #[test]
    fn calculate_is_monotonic_in_gross_income() {
        for &filing_status in FilingStatus::all() {
            let table = table_2024(filing_status);
            for se_income in [dec!(0), dec!(20000)] {
                let input_for = |gross: Decimal| {
                    TaxCalculationInput::new(filing_status, gross)
                        .with_self_employment_income(se_income)
                        .with_deductions(dec!(5000))
                };
                let mut previous = engine().calculate(&input_for(dec!(0)), &table);

                for step in 1..=400 {
                    let gross = Decimal::from(step * 2500);
                    let result = engine().calculate(&input_for(gross), &table);

                    let context = format!("{filing_status} se {se_income} gross {gross}");
                    assert!(result.total_tax >= previous.total_tax, "{context}");
                    assert!(result.federal_tax >= previous.federal_tax, "{context}");
                    previous = result;
                }
            }
        }
    }

    #[test]
    fn custom_self_employment_rates() {
        let config = SelfEmploymentConfig {
            net_earnings_factor: dec!(1),
            tax_rate: dec!(0.10),
            deduction_factor: dec!(0),
        };
        let engine = TaxEngine::with_self_employment(config).unwrap();
        let input = single(dec!(14600)).with_self_employment_income(dec!(1000));

        let result = engine.calculate(&input, &single_2024());

        assert_eq!(result.self_employment_tax, dec!(100));
        assert_eq!(result.federal_tax, dec!(0));
        assert_eq!(result.total_tax, dec!(100));
    }

    // =========================================================================
    // estimate tests
    // =========================================================================

    #[test]
    fn estimate_resolves_table_by_year() {
        let tables = TaxTables::builtin();
        let input = TaxCalculationInput::new(FilingStatus::MarriedJoint, dec!(100000));

        let result = estimate(&tables, &input, 2024).unwrap();

        // 100000 - 29200 = 70800; 2320 + (70800 - 23200) * 0.12 = 8032
        assert_eq!(result.standard_deduction, dec!(29200));
        assert_eq!(result.federal_tax, dec!(8032));
    }

    #[test]
    fn estimate_rejects_unsupported_year() {
        let tables = TaxTables::builtin();

        let result = estimate(&tables, &single(dec!(75000)), 2019);

        assert_eq!(
            result,
            Err(TaxError::Table(TableError::UnsupportedYear(2019)))
        );
    }

    #[test]
    fn estimate_rejects_negative_input() {
        let tables = TaxTables::builtin();

        let result = estimate(&tables, &single(dec!(-1)), 2024);

        assert_eq!(
            result,
            Err(TaxError::Input(InputError::Negative {
                field: "grossIncome",
                value: dec!(-1),
            }))
        );
    }

    #[test]
    fn estimate_accepts_trait_object_provider() {
        let tables = TaxTables::builtin();
        let provider: &dyn BracketTableProvider = &tables;

        let result = estimate(provider, &single(dec!(75000)), 2024).unwrap();

        assert_eq!(result.total_tax, dec!(8341));
    }

    #[test]
    fn normalized_result_keeps_values() {
        let input = TaxCalculationInput::new(FilingStatus::Single, dec!(75000));
        let result = calculate(&input, &single_2024());

        let normalized = result.clone().normalized();

        assert_eq!(normalized, result);
        assert_eq!(normalized.taxable_income.to_string(), "60400");
        assert_eq!(normalized.federal_tax.to_string(), "8341");
        assert_eq!(normalized.bracket_breakdown[0].tax.to_string(), "1160");
    }
}
