//! Per-quarter payment tracking.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tax_core::QuarterPeriod;
use thiserror::Error;

/// A quarter counts as due soon within this many days of its due date.
const DUE_SOON_DAYS: i64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("no such quarter: {0}")]
    UnknownQuarter(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum QuarterStatus {
    Paid,
    Overdue,
    /// Due today or within the next 30 days.
    DueSoon { days: i64 },
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedQuarter {
    #[serde(flatten)]
    pub period: QuarterPeriod,
    pub estimated_amount: Decimal,
    pub paid_amount: Decimal,
    pub paid: bool,
}

impl TrackedQuarter {
    pub fn status(
        &self,
        today: NaiveDate,
    ) -> QuarterStatus {
        if self.paid {
            return QuarterStatus::Paid;
        }
        let days = (self.period.due_date - today).num_days();
        if days < 0 {
            QuarterStatus::Overdue
        } else if days <= DUE_SOON_DAYS {
            QuarterStatus::DueSoon { days }
        } else {
            QuarterStatus::Upcoming
        }
    }
}

/// The four quarters of a year with an estimated and a paid amount each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentTracker {
    quarters: Vec<TrackedQuarter>,
}

impl PaymentTracker {
    /// Every quarter starts unpaid with `estimated_amount` due.
    pub fn new(
        periods: impl IntoIterator<Item = QuarterPeriod>,
        estimated_amount: Decimal,
    ) -> Self {
        let quarters = periods
            .into_iter()
            .map(|period| TrackedQuarter {
                period,
                estimated_amount,
                paid_amount: Decimal::ZERO,
                paid: false,
            })
            .collect();
        Self { quarters }
    }

    pub fn quarters(&self) -> &[TrackedQuarter] {
        &self.quarters
    }

    fn quarter_mut(
        &mut self,
        quarter: u8,
    ) -> Result<&mut TrackedQuarter, TrackerError> {
        self.quarters
            .iter_mut()
            .find(|q| q.period.quarter == quarter)
            .ok_or(TrackerError::UnknownQuarter(quarter))
    }

    /// Flips the paid flag. A newly paid quarter records its estimated
    /// amount as paid; an unpaid one records 0. Returns the new flag.
    pub fn toggle_paid(
        &mut self,
        quarter: u8,
    ) -> Result<bool, TrackerError> {
        let q = self.quarter_mut(quarter)?;
        q.paid = !q.paid;
        q.paid_amount = if q.paid {
            q.estimated_amount
        } else {
            Decimal::ZERO
        };
        Ok(q.paid)
    }

    /// Sets the estimate for every quarter. Amounts already paid are kept.
    pub fn set_estimated_amount(
        &mut self,
        amount: Decimal,
    ) {
        for q in &mut self.quarters {
            q.estimated_amount = amount;
        }
    }

    pub fn total_estimated(&self) -> Decimal {
        self.quarters.iter().map(|q| q.estimated_amount).sum()
    }

    pub fn total_paid(&self) -> Decimal {
        self.quarters.iter().map(|q| q.paid_amount).sum()
    }

    /// Estimated minus paid. Negative after an overpayment.
    pub fn remaining(&self) -> Decimal {
        self.total_estimated() - self.total_paid()
    }

    pub fn status(
        &self,
        quarter: u8,
        today: NaiveDate,
    ) -> Result<QuarterStatus, TrackerError> {
        self.quarters
            .iter()
            .find(|q| q.period.quarter == quarter)
            .map(|q| q.status(today))
            .ok_or(TrackerError::UnknownQuarter(quarter))
    }
}
