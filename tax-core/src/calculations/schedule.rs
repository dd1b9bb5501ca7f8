//! Estimated-payment due dates.
//!
//! | Quarter | Period          | Due               |
//! |---------|-----------------|-------------------|
//! | 1       | Jan 1 - Mar 31  | Apr 15            |
//! | 2       | Apr 1 - May 31  | Jun 15            |
//! | 3       | Jun 1 - Aug 31  | Sep 15            |
//! | 4       | Sep 1 - Dec 31  | Jan 15, next year |
//!
//! [`DueDateRule::Statutory`] returns these dates as they are.
//! [`DueDateRule::NextBusinessDay`] is an extension that rolls a due date
//! falling on a weekend or a holiday forward to the next business day. The
//! holidays that can reach these dates are Martin Luther King Jr. Day for Q4
//! and DC Emancipation Day (Apr 16, observed on the Friday before or the
//! Monday after when it falls on a weekend) for Q1.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::QuarterPeriod;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),
}

/// How due dates are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueDateRule {
    /// The fixed statutory dates, unshifted.
    #[default]
    Statutory,
    /// Weekend and holiday due dates move to the next business day.
    NextBusinessDay,
}

struct QuarterLayout {
    quarter: u8,
    period: &'static str,
    start: (u32, u32),
    end: (u32, u32),
    due_year_offset: i32,
    due: (u32, u32),
}

const QUARTERS: [QuarterLayout; 4] = [
    QuarterLayout {
        quarter: 1,
        period: "Jan 1 - Mar 31",
        start: (1, 1),
        end: (3, 31),
        due_year_offset: 0,
        due: (4, 15),
    },
    QuarterLayout {
        quarter: 2,
        period: "Apr 1 - May 31",
        start: (4, 1),
        end: (5, 31),
        due_year_offset: 0,
        due: (6, 15),
    },
    QuarterLayout {
        quarter: 3,
        period: "Jun 1 - Aug 31",
        start: (6, 1),
        end: (8, 31),
        due_year_offset: 0,
        due: (9, 15),
    },
    QuarterLayout {
        quarter: 4,
        period: "Sep 1 - Dec 31",
        start: (9, 1),
        end: (12, 31),
        due_year_offset: 1,
        due: (1, 15),
    },
];

/// The four statutory periods of `year`, in order.
///
/// # Errors
///
/// Returns [`ScheduleError::YearOutOfRange`] when a date cannot be
/// represented.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use tax_core::calculations::quarterly_due_dates;
///
/// let quarters = quarterly_due_dates(2024).unwrap();
///
/// assert_eq!(quarters[3].due_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
/// ```
pub fn quarterly_due_dates(year: i32) -> Result<[QuarterPeriod; 4], ScheduleError> {
    quarterly_due_dates_with_rule(year, DueDateRule::Statutory)
}

/// The four periods of `year` with due dates derived by `rule`.
///
/// # Errors
///
/// Returns [`ScheduleError::YearOutOfRange`] when a date cannot be
/// represented.
pub fn quarterly_due_dates_with_rule(
    year: i32,
    rule: DueDateRule,
) -> Result<[QuarterPeriod; 4], ScheduleError> {
    let [q1, q2, q3, q4] = &QUARTERS;
    Ok([
        quarter_period(year, q1, rule)?,
        quarter_period(year, q2, rule)?,
        quarter_period(year, q3, rule)?,
        quarter_period(year, q4, rule)?,
    ])
}

fn quarter_period(
    year: i32,
    layout: &QuarterLayout,
    rule: DueDateRule,
) -> Result<QuarterPeriod, ScheduleError> {
    let date = |in_year: Option<i32>, (month, day): (u32, u32)| {
        in_year
            .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
            .ok_or(ScheduleError::YearOutOfRange(year))
    };

    let due_year = year.checked_add(layout.due_year_offset);
    let statutory_due = date(due_year, layout.due)?;
    let due_date = match rule {
        DueDateRule::Statutory => statutory_due,
        DueDateRule::NextBusinessDay => {
            next_business_day(statutory_due).ok_or(ScheduleError::YearOutOfRange(year))?
        }
    };

    Ok(QuarterPeriod {
        quarter: layout.quarter,
        period: layout.period.to_string(),
        period_start: date(Some(year), layout.start)?,
        period_end: date(Some(year), layout.end)?,
        due_date,
    })
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Third Monday of January.
fn is_mlk_day(date: NaiveDate) -> bool {
    date.month() == 1 && date.weekday() == Weekday::Mon && (15..=21).contains(&date.day())
}

/// Observed DC Emancipation Day.
fn is_emancipation_day(date: NaiveDate) -> bool {
    if date.month() != 4 {
        return false;
    }
    match (date.day(), date.weekday()) {
        (16, weekday) => !matches!(weekday, Weekday::Sat | Weekday::Sun),
        (15, Weekday::Fri) | (17, Weekday::Mon) => true,
        _ => false,
    }
}

/// `date` itself when it is a business day, else the next one.
pub fn next_business_day(date: NaiveDate) -> Option<NaiveDate> {
    let mut day = date;
    while is_weekend(day) || is_mlk_day(day) || is_emancipation_day(day) {
        day = day.succ_opt()?;
    }
    Some(day)
}
