use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One estimated-payment period and its due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterPeriod {
    /// 1 through 4.
    pub quarter: u8,
    /// Human-readable period, e.g. `Jan 1 - Mar 31`.
    pub period: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
}
