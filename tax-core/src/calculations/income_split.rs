//! Applies the final deduction to the two income categories.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::non_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeSplit {
    pub taxable_regular_income: Decimal,
    pub taxable_cap_gains: Decimal,
    /// Deduction left after regular income reached zero.
    pub remaining_deduction: Decimal,
    /// Regular plus capital gains income; never reduced by the deduction.
    pub total_gross_income: Decimal,
}

/// Deducts from regular income first and carries any excess over to
/// capital gains.
pub fn split_income(
    regular_income: Decimal,
    cap_gain_income: Decimal,
    final_deduction: Decimal,
) -> IncomeSplit {
    let remaining_deduction = non_negative(final_deduction - regular_income);

    IncomeSplit {
        taxable_regular_income: non_negative(regular_income - final_deduction),
        taxable_cap_gains: non_negative(cap_gain_income - remaining_deduction),
        remaining_deduction,
        total_gross_income: regular_income.saturating_add(cap_gain_income),
    }
}
