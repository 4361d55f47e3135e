//! Long-term capital gains layering.
//!
//! Gains are stacked on top of ordinary taxable income. Ordinary income
//! fills the 0% and 15% layers first, so the gains are taxed at whatever
//! layers remain above it.
//!
//! | Layer | Taxed range of stacked income |
//! |-------|-------------------------------|
//! | 0%    | up to `t0`                    |
//! | 15%   | `t0` to `t1`                  |
//! | 20%   | above `t1`                    |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, rate_percent};
use crate::constants::{self, CAP_GAINS_RATES, DEFAULT_CAP_GAINS_THRESHOLDS};
use crate::models::{BracketLine, FilingStatus, LineKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapGainsResult {
    pub tax: Decimal,
    /// Gains falling in each layer, in rate order (0%, 15%, 20%).
    pub layer_income: [Decimal; 3],
    /// Layers with positive income, lowest rate first.
    pub lines: Vec<BracketLine>,
}

/// Upper bounds of the 0% and 15% layers for a year and status, falling back
/// to `[40000, 400000]`.
pub fn thresholds_for(
    year: i32,
    status: FilingStatus,
) -> (Decimal, Decimal) {
    constants::cap_gains_thresholds(year, status).unwrap_or_else(|| {
        debug!(year, %status, "no capital gains thresholds on file, using default");
        DEFAULT_CAP_GAINS_THRESHOLDS
    })
}

/// Taxes `taxable_cap_gains` stacked above `taxable_regular_income`.
pub fn layer_cap_gains(
    taxable_regular_income: Decimal,
    taxable_cap_gains: Decimal,
    (t0, t1): (Decimal, Decimal),
) -> CapGainsResult {
    let stacked_floor = taxable_regular_income;
    let stacked_top = taxable_regular_income.saturating_add(taxable_cap_gains);

    let layer_income = [
        non_negative(stacked_top.min(t0) - stacked_floor),
        non_negative(stacked_top.min(t1) - stacked_floor.max(t0)),
        non_negative(stacked_top - stacked_floor.max(t1)),
    ];

    let mut tax = Decimal::ZERO;
    let mut lines = Vec::new();
    for (income, rate) in layer_income.into_iter().zip(CAP_GAINS_RATES) {
        let layer_tax = income.saturating_mul(rate);
        tax = tax.saturating_add(layer_tax);
        if income > Decimal::ZERO {
            lines.push(BracketLine {
                kind: LineKind::CapGains,
                rate,
                income,
                tax: layer_tax,
                label: format!("Cap Gains {}%", rate_percent(rate, 0)),
            });
        }
    }

    CapGainsResult {
        tax,
        layer_income,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const DEFAULTS: (Decimal, Decimal) = (dec!(40000), dec!(400000));

    #[test]
    fn gains_above_first_threshold_are_taxed_at_fifteen() {
        let result = layer_cap_gains(dec!(40000), dec!(20000), DEFAULTS);

        assert_eq!(result.layer_income, [dec!(0), dec!(20000), dec!(0)]);
        assert_eq!(result.tax, dec!(3000));
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].label, "Cap Gains 15%");
    }

    #[test]
    fn gains_straddling_first_threshold_split_across_layers() {
        let result = layer_cap_gains(dec!(30000), dec!(20000), DEFAULTS);

        assert_eq!(result.layer_income, [dec!(10000), dec!(10000), dec!(0)]);
        assert_eq!(result.tax, dec!(1500));
        let labels: Vec<_> = result.lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Cap Gains 0%", "Cap Gains 15%"]);
    }

    #[test]
    fn gains_spanning_all_layers() {
        let result = layer_cap_gains(dec!(10000), dec!(500000), DEFAULTS);

        assert_eq!(
            result.layer_income,
            [dec!(30000), dec!(360000), dec!(110000)]
        );
        // 360000 × 15% + 110000 × 20%
        assert_eq!(result.tax, dec!(76000));
        assert_eq!(result.lines.len(), 3);
    }

    #[test]
    fn ordinary_income_above_top_threshold_pushes_all_gains_to_twenty() {
        let result = layer_cap_gains(dec!(450000), dec!(10000), DEFAULTS);

        assert_eq!(result.layer_income, [dec!(0), dec!(0), dec!(10000)]);
        assert_eq!(result.tax, dec!(2000));
        assert_eq!(result.lines[0].kind, LineKind::CapGains);
        assert_eq!(result.lines[0].rate, dec!(0.20));
    }

    #[test]
    fn zero_gains_emit_no_lines() {
        let result = layer_cap_gains(dec!(10000), Decimal::ZERO, DEFAULTS);

        assert_eq!(result.tax, Decimal::ZERO);
        assert!(result.lines.is_empty());
    }

    #[test]
    fn zero_layer_line_carries_no_tax() {
        let result = layer_cap_gains(Decimal::ZERO, dec!(5000), DEFAULTS);

        assert_eq!(result.lines[0].rate, Decimal::ZERO);
        assert_eq!(result.lines[0].tax, Decimal::ZERO);
        assert_eq!(result.lines[0].income, dec!(5000));
    }

    #[test]
    fn thresholds_use_table_then_default() {
        assert_eq!(
            thresholds_for(2026, FilingStatus::MarriedJointly),
            (dec!(98900), dec!(613700))
        );
        assert_eq!(thresholds_for(2031, FilingStatus::Single), DEFAULTS);
    }
}
