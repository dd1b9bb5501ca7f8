use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{format_dollars, format_percent};

/// Upper edge of a bracket. The top bracket of every table is
/// [`UpperBound::Unbounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpperBound {
    /// Exclusive upper edge.
    Bounded(Decimal),
    Unbounded,
}

impl UpperBound {
    /// The part of `income` that does not exceed this bound.
    pub fn cap(
        &self,
        income: Decimal,
    ) -> Decimal {
        match self {
            Self::Bounded(upper) => income.min(*upper),
            Self::Unbounded => income,
        }
    }
}

impl From<Option<Decimal>> for UpperBound {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Self::Unbounded, Self::Bounded)
    }
}

/// One progressive segment of a rate schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    /// Inclusive lower edge.
    pub lower_bound: Decimal,
    pub upper_bound: UpperBound,
    /// Marginal rate as a fraction, e.g. `0.22`.
    pub rate: Decimal,
}

impl Bracket {
    pub fn bounded(
        lower_bound: Decimal,
        upper_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound: UpperBound::Bounded(upper_bound),
            rate,
        }
    }

    pub fn unbounded(
        lower_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound: UpperBound::Unbounded,
            rate,
        }
    }

    /// Portion of `taxable_income` that falls inside this bracket.
    ///
    /// Zero when the income does not reach the lower bound.
    pub fn amount_within(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        if taxable_income <= self.lower_bound {
            return Decimal::ZERO;
        }
        self.upper_bound.cap(taxable_income) - self.lower_bound
    }

    /// Human-readable label, e.g. `12% ($11,600 - $47,150)` or
    /// `37% (over $609,350)`.
    pub fn label(&self) -> String {
        let rate = format_percent(self.rate);
        match self.upper_bound {
            UpperBound::Bounded(upper) => format!(
                "{rate} ({} - {})",
                format_dollars(self.lower_bound),
                format_dollars(upper)
            ),
            UpperBound::Unbounded => format!("{rate} (over {})", format_dollars(self.lower_bound)),
        }
    }
}
