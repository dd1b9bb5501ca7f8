//! Decimal helpers shared by the calculations and by presentation code.
//!
//! The engine itself never rounds; rounding to cents happens only when a
//! value is formatted for people.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to two decimal places, midpoint away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(7064.775)), dec!(7064.78));
/// assert_eq!(round_half_up(dec!(-2.345)), dec!(-2.35));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns `value`, or zero when `value` is negative.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::floor_at_zero;
///
/// assert_eq!(floor_at_zero(dec!(-12.50)), dec!(0));
/// assert_eq!(floor_at_zero(dec!(12.50)), dec!(12.50));
/// ```
pub fn floor_at_zero(value: Decimal) -> Decimal {
    if value > Decimal::ZERO {
        value
    } else {
        Decimal::ZERO
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats an amount as US dollars with cents, e.g. `$8,341.00`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::format_currency;
///
/// assert_eq!(format_currency(dec!(2085.25)), "$2,085.25");
/// assert_eq!(format_currency(dec!(-1234.5)), "-$1,234.50");
/// ```
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_half_up(value);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}${}.{cents}", group_thousands(whole))
}

/// Formats an amount as whole US dollars, e.g. `$11,600`.
pub fn format_dollars(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let whole = rounded.abs().trunc().normalize().to_string();
    format!("{sign}${}", group_thousands(&whole))
}

/// Formats a fractional rate as a percentage, e.g. `0.22` as `22%`.
pub fn format_percent(rate: Decimal) -> String {
    let percent = (rate * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("{percent}%")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(3532.3875)), dec!(3532.39));
        assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(7064.775)), dec!(7064.78));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
    }

    #[test]
    fn round_half_up_preserves_already_rounded_values() {
        assert_eq!(round_half_up(dec!(2085.25)), dec!(2085.25));
    }

    // =========================================================================
    // floor_at_zero tests
    // =========================================================================

    #[test]
    fn floor_at_zero_keeps_positive_values() {
        assert_eq!(floor_at_zero(dec!(0.01)), dec!(0.01));
    }

    #[test]
    fn floor_at_zero_clamps_negative_values() {
        assert_eq!(floor_at_zero(dec!(-500)), dec!(0));
    }

    #[test]
    fn floor_at_zero_handles_zero() {
        assert_eq!(floor_at_zero(dec!(0)), dec!(0));
    }

    // =========================================================================
    // formatting tests
    // =========================================================================

    #[test]
    fn format_currency_groups_thousands() {
        assert_eq!(format_currency(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_currency(dec!(8341)), "$8,341.00");
        assert_eq!(format_currency(dec!(100)), "$100.00");
    }

    #[test]
    fn format_currency_small_and_zero_values() {
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(0.005)), "$0.01");
        assert_eq!(format_currency(dec!(-0.001)), "$0.00");
    }

    #[test]
    fn format_currency_negative_values() {
        assert_eq!(format_currency(dec!(-659)), "-$659.00");
    }

    #[test]
    fn format_dollars_drops_cents() {
        assert_eq!(format_dollars(dec!(11600)), "$11,600");
        assert_eq!(format_dollars(dec!(609350.00)), "$609,350");
        assert_eq!(format_dollars(dec!(0)), "$0");
        assert_eq!(format_dollars(dec!(999.5)), "$1,000");
    }

    #[test]
    fn format_percent_whole_and_fractional_rates() {
        assert_eq!(format_percent(dec!(0.22)), "22%");
        assert_eq!(format_percent(dec!(0.153)), "15.3%");
        assert_eq!(format_percent(dec!(0)), "0%");
        assert_eq!(format_percent(dec!(0.111213333)), "11.12%");
    }
}
