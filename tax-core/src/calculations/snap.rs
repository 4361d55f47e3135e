//! Bracket boundaries expressed as gross income, for slider guidance.

use rust_decimal::Decimal;

use crate::models::BracketTable;

/// Gross-income values at which each finite bracket boundary is reached
/// under `final_deduction`, ascending.
pub fn snap_points(
    table: &BracketTable,
    final_deduction: Decimal,
) -> Vec<Decimal> {
    let mut points: Vec<Decimal> = table
        .finite_caps()
        .map(|cap| cap.saturating_add(final_deduction))
        .collect();
    points.sort_unstable();
    points
}

/// Pulls `value` onto the nearest snap point strictly within `radius`.
///
/// Ties go to the lower point. Values with no point in range come back
/// unchanged.
pub fn snap_value(
    value: Decimal,
    points: &[Decimal],
    radius: Decimal,
) -> Decimal {
    points
        .iter()
        .map(|point| (*point, (value - *point).abs()))
        .filter(|(_, distance)| *distance < radius)
        .min_by(|(a_point, a_dist), (b_point, b_dist)| {
            a_dist.cmp(b_dist).then(a_point.cmp(b_point))
        })
        .map(|(point, _)| point)
        .unwrap_or(value)
}
