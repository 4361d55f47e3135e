//! Marginal bracket arithmetic for ordinary income.
//!
//! Taxable income is cut into slices, one per bracket, and each slice is
//! taxed at its bracket's rate.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::ProgressiveSchedule;
//! use tax_core::{BracketRow, BracketTable};
//!
//! let table = BracketTable::from_rows(vec![
//!     BracketRow::new(dec!(0.10), Some(dec!(11925))),
//!     BracketRow::new(dec!(0.12), Some(dec!(48475))),
//!     BracketRow::new(dec!(0.22), None),
//! ])
//! .unwrap();
//!
//! let result = ProgressiveSchedule::new(&table).calculate(dec!(30000));
//!
//! // 11925 × 10% + 18075 × 12%
//! assert_eq!(result.tax, dec!(3361.50));
//! assert_eq!(result.lines.len(), 2);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, rate_percent};
use crate::models::{BracketLine, BracketTable, LineKind};

/// Regular tax and the per-bracket slices that make it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveTaxResult {
    pub tax: Decimal,
    /// Slices with positive income, lowest bracket first.
    pub lines: Vec<BracketLine>,
}

/// Applies a bracket table to taxable income.
#[derive(Debug, Clone, Copy)]
pub struct ProgressiveSchedule<'a> {
    table: &'a BracketTable,
}

impl<'a> ProgressiveSchedule<'a> {
    pub fn new(table: &'a BracketTable) -> Self {
        Self { table }
    }

    /// Taxes `taxable_income` bracket by bracket.
    ///
    /// Negative input is treated as zero. The table's top bracket is
    /// unbounded, so all income lands in some slice.
    pub fn calculate(
        &self,
        taxable_income: Decimal,
    ) -> ProgressiveTaxResult {
        let taxable_income = non_negative(taxable_income);
        let mut tax = Decimal::ZERO;
        let mut lines = Vec::new();
        let mut previous_cap = Decimal::ZERO;

        for row in self.table.rows() {
            let above_previous = non_negative(taxable_income - previous_cap);
            let income_in_bracket = match row.cap {
                Some(cap) => above_previous.min(cap - previous_cap),
                None => above_previous,
            };

            if income_in_bracket > Decimal::ZERO {
                let bracket_tax = income_in_bracket.saturating_mul(row.rate);
                tax = tax.saturating_add(bracket_tax);
                lines.push(regular_line(row.rate, income_in_bracket, bracket_tax));
            }

            let Some(cap) = row.cap else { break };
            previous_cap = cap;

            if taxable_income <= previous_cap {
                break;
            }
        }

        ProgressiveTaxResult { tax, lines }
    }
}

fn regular_line(
    rate: Decimal,
    income: Decimal,
    tax: Decimal,
) -> BracketLine {
    BracketLine {
        kind: LineKind::Regular,
        rate,
        income,
        tax,
        label: format!("Regular {}%", rate_percent(rate, 1)),
    }
}
