//! Built-in reference tables.
//!
//! These ship with the binary and are used for everything the bracket data
//! source does not provide: standard deductions, the senior add-on, the
//! capital gains thresholds, and the ordinary bracket fallback used while a
//! bracket document is missing or failed to load.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{BracketRow, BracketTable, FilingStatus};

/// Tax years the built-in tables and default data URLs cover.
pub const SUPPORTED_YEARS: [i32; 2] = [2025, 2026];

/// Standard deduction used when a year/status pair is not in the table.
pub const DEFAULT_STANDARD_DEDUCTION: Decimal = dec!(12000);

/// Capital gains thresholds used when a year/status pair is not in the table.
pub const DEFAULT_CAP_GAINS_THRESHOLDS: (Decimal, Decimal) = (dec!(40000), dec!(400000));

/// Long-term capital gains rates for the three layers.
pub const CAP_GAINS_RATES: [Decimal; 3] = [dec!(0), dec!(0.15), dec!(0.20)];

/// Largest income or deduction amount accepted from user input.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Distance within which a dragged income value is pulled onto a snap point.
pub const DEFAULT_SNAP_RADIUS: Decimal = dec!(2000);

/// Senior add-on category: both married statuses share one amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonCategory {
    Single,
    Married,
}

impl From<FilingStatus> for AddonCategory {
    fn from(status: FilingStatus) -> Self {
        if status.is_married() {
            AddonCategory::Married
        } else {
            AddonCategory::Single
        }
    }
}

/// Default location of the published bracket document for `year`.
pub fn tax_data_url(year: i32) -> Option<&'static str> {
    match year {
        2025 => Some(
            "https://raw.githubusercontent.com/multifol-io/financial-variables/refs/heads/main/data/usa/irs/irs.tax-rates.2025.json",
        ),
        2026 => Some(
            "https://raw.githubusercontent.com/multifol-io/financial-variables/refs/heads/main/data/usa/irs/irs.tax-rates.2026.json",
        ),
        _ => None,
    }
}

pub fn standard_deduction(
    year: i32,
    status: FilingStatus,
) -> Option<Decimal> {
    use FilingStatus::*;

    match (year, status) {
        (2025, Single) => Some(dec!(15750)),
        (2025, MarriedJointly) => Some(dec!(31500)),
        (2025, MarriedSeparately) => Some(dec!(15750)),
        (2025, HeadOfHousehold) => Some(dec!(23625)),
        (2026, Single) => Some(dec!(16100)),
        (2026, MarriedJointly) => Some(dec!(32200)),
        (2026, MarriedSeparately) => Some(dec!(16100)),
        (2026, HeadOfHousehold) => Some(dec!(24150)),
        _ => None,
    }
}

pub fn senior_addon(
    year: i32,
    category: AddonCategory,
) -> Option<Decimal> {
    match (year, category) {
        (2025, AddonCategory::Single) => Some(dec!(2000)),
        (2025, AddonCategory::Married) => Some(dec!(1600)),
        (2026, AddonCategory::Single) => Some(dec!(2050)),
        (2026, AddonCategory::Married) => Some(dec!(1650)),
        _ => None,
    }
}

/// Upper bounds of the 0% and 15% capital gains layers.
pub fn cap_gains_thresholds(
    year: i32,
    status: FilingStatus,
) -> Option<(Decimal, Decimal)> {
    use FilingStatus::*;

    match (year, status) {
        (2025, Single) => Some((dec!(48350), dec!(533400))),
        (2025, MarriedJointly) => Some((dec!(96700), dec!(600050))),
        (2025, MarriedSeparately) => Some((dec!(48350), dec!(300000))),
        (2025, HeadOfHousehold) => Some((dec!(64750), dec!(566700))),
        (2026, Single) => Some((dec!(49450), dec!(545500))),
        (2026, MarriedJointly) => Some((dec!(98900), dec!(613700))),
        (2026, MarriedSeparately) => Some((dec!(49450), dec!(306850))),
        (2026, HeadOfHousehold) => Some((dec!(66200), dec!(579600))),
        _ => None,
    }
}

const FALLBACK_SINGLE: [(Decimal, Option<Decimal>); 7] = [
    (dec!(0.10), Some(dec!(11925))),
    (dec!(0.12), Some(dec!(48475))),
    (dec!(0.22), Some(dec!(103350))),
    (dec!(0.24), Some(dec!(197300))),
    (dec!(0.32), Some(dec!(250525))),
    (dec!(0.35), Some(dec!(626350))),
    (dec!(0.37), None),
];

const FALLBACK_MARRIED_JOINTLY: [(Decimal, Option<Decimal>); 7] = [
    (dec!(0.10), Some(dec!(23850))),
    (dec!(0.12), Some(dec!(96950))),
    (dec!(0.22), Some(dec!(206700))),
    (dec!(0.24), Some(dec!(394600))),
    (dec!(0.32), Some(dec!(501050))),
    (dec!(0.35), Some(dec!(751600))),
    (dec!(0.37), None),
];

/// Year-agnostic ordinary brackets for `status`, if the fallback set has
/// them. Only single and married-jointly tables are bundled.
pub fn fallback_brackets(status: FilingStatus) -> Option<BracketTable> {
    match status {
        FilingStatus::Single => Some(bundled_table(&FALLBACK_SINGLE)),
        FilingStatus::MarriedJointly => Some(bundled_table(&FALLBACK_MARRIED_JOINTLY)),
        _ => None,
    }
}

/// The single-filer fallback table, used for statuses without their own.
pub fn default_fallback_brackets() -> BracketTable {
    bundled_table(&FALLBACK_SINGLE)
}

fn bundled_table(raw: &[(Decimal, Option<Decimal>)]) -> BracketTable {
    BracketTable::from_sorted(
        raw.iter()
            .map(|&(rate, cap)| BracketRow::new(rate, cap))
            .collect(),
    )
}
