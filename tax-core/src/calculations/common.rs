//! Small decimal helpers shared by the calculation modules.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents using half-up (away from zero) rounding.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Floors `value` at zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// `part` as a percentage of `whole`, or zero when `whole` is not positive.
pub fn percent_of(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole > Decimal::ZERO {
        (part / whole).saturating_mul(Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    }
}

/// Formats a rate such as `0.12` as a percentage with `dp` decimals: `12.0`.
pub fn rate_percent(
    rate: Decimal,
    dp: u32,
) -> String {
    let pct = (rate * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{pct:.prec$}", prec = dp as usize)
}
