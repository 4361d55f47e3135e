use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One marginal bracket: income up to `cap` is taxed at `rate`.
///
/// `cap` is an inclusive upper bound on taxable income. `None` marks the
/// unbounded top bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRow {
    pub rate: Decimal,
    pub cap: Option<Decimal>,
}

impl BracketRow {
    pub fn new(
        rate: Decimal,
        cap: Option<Decimal>,
    ) -> Self {
        Self { rate, cap }
    }

    pub fn is_unbounded(&self) -> bool {
        self.cap.is_none()
    }
}

/// An ordered bracket schedule covering income from zero upward.
///
/// Rows are ascending by cap and the last row is always unbounded, so every
/// non-negative taxable income falls in some row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTable {
    rows: Vec<BracketRow>,
}

impl BracketTable {
    /// Normalizes `rows` into a table.
    ///
    /// Rows are sorted by cap with unbounded rows last, and the final row is
    /// widened to unbounded. Returns `None` for an empty row list.
    pub fn from_rows(mut rows: Vec<BracketRow>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }

        rows.sort_by(|a, b| match (a.cap, b.cap) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        if let Some(last) = rows.last_mut() {
            last.cap = None;
        }

        Some(Self { rows })
    }

    /// Builds a table from rows in published order.
    ///
    /// An unbounded row absorbs all income above the row before it, so rows
    /// after the first unbounded one are dropped. Only the finite rows ahead
    /// of it are sorted. Returns `None` for an empty row list.
    pub fn from_published_rows(mut rows: Vec<BracketRow>) -> Option<Self> {
        if let Some(top) = rows.iter().position(BracketRow::is_unbounded) {
            rows.truncate(top + 1);
        }
        Self::from_rows(rows)
    }

    /// Wraps rows that are already ascending and end unbounded.
    pub(crate) fn from_sorted(rows: Vec<BracketRow>) -> Self {
        debug_assert!(rows.last().is_some_and(BracketRow::is_unbounded));
        Self { rows }
    }

    pub fn rows(&self) -> &[BracketRow] {
        &self.rows
    }

    /// Finite caps in ascending order.
    pub fn finite_caps(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.rows.iter().filter_map(|row| row.cap)
    }

    /// Rate of the bracket containing `taxable_income`.
    pub fn marginal_rate(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        self.rows
            .iter()
            .find(|row| row.cap.is_none_or(|cap| taxable_income <= cap))
            .map(|row| row.rate)
            .unwrap_or(Decimal::ZERO)
    }
}
