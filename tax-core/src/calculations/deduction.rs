//! Standard deduction lookup and final deduction resolution.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{self, AddonCategory, DEFAULT_STANDARD_DEDUCTION};
use crate::models::FilingStatus;

/// The two deduction figures every estimate reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionResult {
    /// Base standard deduction plus any senior add-on.
    pub total_standard: Decimal,
    /// Amount actually subtracted from income.
    pub final_deduction: Decimal,
}

/// Standard deduction for the year and status, including the senior add-on
/// when `is_senior` is set.
///
/// Unknown year/status pairs use a base of 12000; an unknown add-on is 0.
pub fn standard_deduction(
    year: i32,
    status: FilingStatus,
    is_senior: bool,
) -> Decimal {
    let base = constants::standard_deduction(year, status).unwrap_or_else(|| {
        debug!(year, %status, "no standard deduction on file, using default");
        DEFAULT_STANDARD_DEDUCTION
    });

    let addon = if is_senior {
        let category = AddonCategory::from(status);
        constants::senior_addon(year, category).unwrap_or_else(|| {
            debug!(year, ?category, "no senior add-on on file, using 0");
            Decimal::ZERO
        })
    } else {
        Decimal::ZERO
    };

    base + addon
}

/// Resolves the deduction applied to income.
///
/// With `use_standard` the larger of the standard total and the itemized
/// amount applies; the toggle raises the floor rather than discarding the
/// itemized figure. Without it only the itemized amount applies.
pub fn resolve_deduction(
    year: i32,
    status: FilingStatus,
    is_senior: bool,
    itemized_deduction: Decimal,
    use_standard: bool,
) -> DeductionResult {
    let total_standard = standard_deduction(year, status, is_senior);
    let final_deduction = if use_standard {
        total_standard.max(itemized_deduction)
    } else {
        itemized_deduction
    };

    DeductionResult {
        total_standard,
        final_deduction,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn standard_deduction_for_known_year() {
        assert_eq!(
            standard_deduction(2026, FilingStatus::Single, false),
            dec!(16100)
        );
        assert_eq!(
            standard_deduction(2025, FilingStatus::HeadOfHousehold, false),
            dec!(23625)
        );
    }

    #[test]
    fn senior_addon_uses_single_category_for_head_of_household() {
        assert_eq!(
            standard_deduction(2026, FilingStatus::HeadOfHousehold, true),
            dec!(26200)
        );
    }

    #[test]
    fn senior_addon_uses_married_category_for_married_statuses() {
        assert_eq!(
            standard_deduction(2025, FilingStatus::MarriedJointly, true),
            dec!(33100)
        );
        assert_eq!(
            standard_deduction(2025, FilingStatus::MarriedSeparately, true),
            dec!(17350)
        );
    }

    #[test]
    fn unknown_year_defaults_base_and_drops_addon() {
        assert_eq!(
            standard_deduction(2030, FilingStatus::Single, true),
            dec!(12000)
        );
    }

    #[test]
    fn use_standard_takes_larger_itemized_amount() {
        let result = resolve_deduction(2026, FilingStatus::Single, false, dec!(50000), true);

        assert_eq!(
            result,
            DeductionResult {
                total_standard: dec!(16100),
                final_deduction: dec!(50000),
            }
        );
    }

    #[test]
    fn use_standard_floors_at_standard_total() {
        let result = resolve_deduction(2026, FilingStatus::Single, true, dec!(5000), true);

        assert_eq!(result.total_standard, dec!(18150));
        assert_eq!(result.final_deduction, dec!(18150));
    }

    #[test]
    fn itemized_only_ignores_standard() {
        let result = resolve_deduction(2026, FilingStatus::Single, false, dec!(5000), false);

        assert_eq!(result.total_standard, dec!(16100));
        assert_eq!(result.final_deduction, dec!(5000));
    }

    #[test]
    fn itemized_only_allows_zero_deduction() {
        let result = resolve_deduction(2026, FilingStatus::Single, false, Decimal::ZERO, false);

        assert_eq!(result.final_deduction, Decimal::ZERO);
    }
}
