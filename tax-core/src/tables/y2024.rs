//! 2024 federal rate schedules (Rev. Proc. 2023-34).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{Bracket, BracketTable, FilingStatus, UpperBound};

const TAX_YEAR: i32 = 2024;

type Row = (Decimal, Option<Decimal>, Decimal);

// Schedule X
const SINGLE: [Row; 7] = [
    (dec!(0), Some(dec!(11600)), dec!(0.10)),
    (dec!(11600), Some(dec!(47150)), dec!(0.12)),
    (dec!(47150), Some(dec!(100525)), dec!(0.22)),
    (dec!(100525), Some(dec!(191950)), dec!(0.24)),
    (dec!(191950), Some(dec!(243725)), dec!(0.32)),
    (dec!(243725), Some(dec!(609350)), dec!(0.35)),
    (dec!(609350), None, dec!(0.37)),
];

// Schedule Y-1
const MARRIED_JOINT: [Row; 7] = [
    (dec!(0), Some(dec!(23200)), dec!(0.10)),
    (dec!(23200), Some(dec!(94300)), dec!(0.12)),
    (dec!(94300), Some(dec!(201050)), dec!(0.22)),
    (dec!(201050), Some(dec!(383900)), dec!(0.24)),
    (dec!(383900), Some(dec!(487450)), dec!(0.32)),
    (dec!(487450), Some(dec!(731200)), dec!(0.35)),
    (dec!(731200), None, dec!(0.37)),
];

// Schedule Y-2
const MARRIED_SEPARATE: [Row; 7] = [
    (dec!(0), Some(dec!(11600)), dec!(0.10)),
    (dec!(11600), Some(dec!(47150)), dec!(0.12)),
    (dec!(47150), Some(dec!(100525)), dec!(0.22)),
    (dec!(100525), Some(dec!(191950)), dec!(0.24)),
    (dec!(191950), Some(dec!(243725)), dec!(0.32)),
    (dec!(243725), Some(dec!(365600)), dec!(0.35)),
    (dec!(365600), None, dec!(0.37)),
];

// Schedule Z
const HEAD_OF_HOUSEHOLD: [Row; 7] = [
    (dec!(0), Some(dec!(16550)), dec!(0.10)),
    (dec!(16550), Some(dec!(63100)), dec!(0.12)),
    (dec!(63100), Some(dec!(100500)), dec!(0.22)),
    (dec!(100500), Some(dec!(191950)), dec!(0.24)),
    (dec!(191950), Some(dec!(243700)), dec!(0.32)),
    (dec!(243700), Some(dec!(609350)), dec!(0.35)),
    (dec!(609350), None, dec!(0.37)),
];

fn table(
    filing_status: FilingStatus,
    standard_deduction: Decimal,
    rows: &[Row],
) -> BracketTable {
    let brackets = rows
        .iter()
        .map(|&(lower_bound, upper, rate)| Bracket {
            lower_bound,
            upper_bound: UpperBound::from(upper),
            rate,
        })
        .collect();

    BracketTable::new_unchecked(TAX_YEAR, filing_status, standard_deduction, brackets)
}

pub(super) fn tables() -> [BracketTable; 4] {
    [
        table(FilingStatus::Single, dec!(14600), &SINGLE),
        table(FilingStatus::MarriedJoint, dec!(29200), &MARRIED_JOINT),
        table(FilingStatus::MarriedSeparate, dec!(14600), &MARRIED_SEPARATE),
        table(FilingStatus::HeadOfHousehold, dec!(21900), &HEAD_OF_HOUSEHOLD),
    ]
}
