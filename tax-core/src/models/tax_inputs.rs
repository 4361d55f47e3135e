use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FilingStatus;

/// Everything one estimate is computed from.
///
/// Amounts are expected to be non-negative; callers sum multiple income
/// streams before building this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxInputs {
    pub year: i32,
    pub filing_status: FilingStatus,
    pub is_senior: bool,
    pub regular_income: Decimal,
    pub cap_gain_income: Decimal,
    pub itemized_deduction: Decimal,

    /// When set, the final deduction is the larger of the standard and
    /// itemized amounts. When cleared, only the itemized amount applies.
    pub use_standard: bool,
}

impl Default for TaxInputs {
    fn default() -> Self {
        Self {
            year: 2026,
            filing_status: FilingStatus::Single,
            is_senior: false,
            regular_income: Decimal::from(60000),
            cap_gain_income: Decimal::ZERO,
            itemized_deduction: Decimal::ZERO,
            use_standard: true,
        }
    }
}
