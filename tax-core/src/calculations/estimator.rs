//! The full estimate: deduction, income split, regular tax, capital gains.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::TaxEstimator;
//! use tax_core::{FilingStatus, TaxInputs};
//!
//! let inputs = TaxInputs {
//!     year: 2026,
//!     filing_status: FilingStatus::Single,
//!     is_senior: false,
//!     regular_income: dec!(60000),
//!     cap_gain_income: dec!(10000),
//!     itemized_deduction: dec!(0),
//!     use_standard: true,
//! };
//!
//! // No fetched bracket document: the built-in tables are used.
//! let result = TaxEstimator::new(None).calculate(&inputs);
//!
//! assert_eq!(result.final_deduction, dec!(16100));
//! assert_eq!(result.taxable_regular_income, dec!(43900));
//! // 11925 × 10% + 31975 × 12%
//! assert_eq!(result.regular_tax, dec!(5029.50));
//! // gains stack from 43900: 5550 at 0%, 4450 at 15%
//! assert_eq!(result.cap_gain_tax, dec!(667.50));
//! ```

use rust_decimal::Decimal;

use crate::calculations::cap_gains::{layer_cap_gains, thresholds_for};
use crate::calculations::common::percent_of;
use crate::calculations::deduction::resolve_deduction;
use crate::calculations::income_split::split_income;
use crate::calculations::progressive::ProgressiveSchedule;
use crate::calculations::resolver::resolve_brackets;
use crate::calculations::snap;
use crate::models::{BracketLine, BracketTable, FilingStatus, LineKind, TaxInputs, TaxResult};
use crate::source::BracketDocument;

/// Computes estimates against an optional fetched bracket document.
///
/// Holds no state beyond the borrowed document; the same inputs always
/// produce the same result.
#[derive(Debug, Clone, Copy)]
pub struct TaxEstimator<'a> {
    document: Option<&'a BracketDocument>,
}

impl<'a> TaxEstimator<'a> {
    pub fn new(document: Option<&'a BracketDocument>) -> Self {
        Self { document }
    }

    /// Ordinary bracket table that applies to `status`.
    pub fn bracket_table(
        &self,
        status: FilingStatus,
    ) -> BracketTable {
        resolve_brackets(self.document, status)
    }

    /// Gross-income bracket boundaries for `status` under `final_deduction`.
    pub fn snap_points(
        &self,
        status: FilingStatus,
        final_deduction: Decimal,
    ) -> Vec<Decimal> {
        snap::snap_points(&self.bracket_table(status), final_deduction)
    }

    pub fn calculate(
        &self,
        inputs: &TaxInputs,
    ) -> TaxResult {
        let deduction = resolve_deduction(
            inputs.year,
            inputs.filing_status,
            inputs.is_senior,
            inputs.itemized_deduction,
            inputs.use_standard,
        );

        let split = split_income(
            inputs.regular_income,
            inputs.cap_gain_income,
            deduction.final_deduction,
        );

        let table = self.bracket_table(inputs.filing_status);
        let regular = ProgressiveSchedule::new(&table).calculate(split.taxable_regular_income);

        let cap_gains = layer_cap_gains(
            split.taxable_regular_income,
            split.taxable_cap_gains,
            thresholds_for(inputs.year, inputs.filing_status),
        );

        let mut tax_breakdown = Vec::with_capacity(1 + regular.lines.len() + cap_gains.lines.len());
        if deduction.final_deduction > Decimal::ZERO {
            tax_breakdown.push(BracketLine {
                kind: LineKind::Deduction,
                rate: Decimal::ZERO,
                income: deduction.final_deduction,
                tax: Decimal::ZERO,
                label: "Deduction".to_string(),
            });
        }
        tax_breakdown.extend(regular.lines);
        tax_breakdown.extend(cap_gains.lines);

        let total_tax = regular.tax.saturating_add(cap_gains.tax);

        TaxResult {
            total_standard: deduction.total_standard,
            final_deduction: deduction.final_deduction,
            taxable_regular_income: split.taxable_regular_income,
            taxable_cap_gains: split.taxable_cap_gains,
            regular_tax: regular.tax,
            cap_gain_tax: cap_gains.tax,
            total_tax,
            effective_rate: percent_of(total_tax, split.total_gross_income),
            total_gross_income: split.total_gross_income,
            tax_breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::{prop_assert_eq, proptest};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::BracketRow;

    fn inputs() -> TaxInputs {
        TaxInputs {
            year: 2026,
            filing_status: FilingStatus::Single,
            is_senior: false,
            regular_income: dec!(60000),
            cap_gain_income: Decimal::ZERO,
            itemized_deduction: Decimal::ZERO,
            use_standard: true,
        }
    }

    fn kinds(result: &TaxResult) -> Vec<LineKind> {
        result.tax_breakdown.iter().map(|l| l.kind).collect()
    }

    #[test]
    fn zero_income_has_zero_tax_and_rate() {
        let mut input = inputs();
        input.regular_income = Decimal::ZERO;

        let result = TaxEstimator::new(None).calculate(&input);

        assert_eq!(result.total_tax, Decimal::ZERO);
        assert_eq!(result.effective_rate, Decimal::ZERO);
        assert_eq!(result.total_gross_income, Decimal::ZERO);
        // The deduction line is still reported.
        assert_eq!(kinds(&result), vec![LineKind::Deduction]);
    }

    #[test]
    fn zero_income_with_no_deduction_has_empty_breakdown() {
        let mut input = inputs();
        input.regular_income = Decimal::ZERO;
        input.use_standard = false;

        let result = TaxEstimator::new(None).calculate(&input);

        assert!(result.tax_breakdown.is_empty());
    }

    #[test]
    fn itemized_above_standard_wins_even_with_standard_selected() {
        let mut input = inputs();
        input.itemized_deduction = dec!(50000);

        let result = TaxEstimator::new(None).calculate(&input);

        assert_eq!(result.total_standard, dec!(16100));
        assert_eq!(result.final_deduction, dec!(50000));
        assert_eq!(result.taxable_regular_income, dec!(10000));
        assert_eq!(result.regular_tax, dec!(1000));
    }

    #[test]
    fn leftover_deduction_shelters_gains() {
        let mut input = inputs();
        input.regular_income = dec!(10000);
        input.cap_gain_income = dec!(5000);
        input.itemized_deduction = dec!(12000);
        input.use_standard = false;

        let result = TaxEstimator::new(None).calculate(&input);

        assert_eq!(result.taxable_regular_income, Decimal::ZERO);
        assert_eq!(result.taxable_cap_gains, dec!(3000));
        assert_eq!(result.cap_gain_tax, Decimal::ZERO);
        assert_eq!(result.total_gross_income, dec!(15000));
    }

    #[test]
    fn breakdown_orders_deduction_regular_then_gains() {
        let mut input = inputs();
        input.cap_gain_income = dec!(20000);

        let result = TaxEstimator::new(None).calculate(&input);

        assert_eq!(
            kinds(&result),
            vec![
                LineKind::Deduction,
                LineKind::Regular,
                LineKind::Regular,
                LineKind::CapGains,
                LineKind::CapGains,
            ]
        );
        let rates: Vec<_> = result.lines(LineKind::CapGains).map(|l| l.rate).collect();
        assert_eq!(rates, vec![dec!(0), dec!(0.15)]);
    }

    #[test]
    fn totals_add_up() {
        let mut input = inputs();
        input.regular_income = dec!(120000);
        input.cap_gain_income = dec!(30000);

        let result = TaxEstimator::new(None).calculate(&input);

        assert_eq!(result.total_tax, result.regular_tax + result.cap_gain_tax);
        let line_tax: Decimal = result.tax_breakdown.iter().map(|l| l.tax).sum();
        assert_eq!(line_tax, result.total_tax);
        assert_eq!(result.net_income(), dec!(150000) - result.total_tax);
    }

    #[test]
    fn effective_rate_is_a_percentage_of_gross() {
        let mut input = inputs();
        input.regular_income = dec!(26100);

        let result = TaxEstimator::new(None).calculate(&input);

        // taxable 10000 → tax 1000 on gross 26100
        assert_eq!(result.total_tax, dec!(1000));
        assert_eq!(
            result.effective_rate.round_dp(4),
            dec!(3.8314)
        );
    }

    #[test]
    fn largest_amounts_saturate_instead_of_overflowing() {
        let result = TaxEstimator::new(None).calculate(&TaxInputs {
            regular_income: Decimal::MAX,
            cap_gain_income: Decimal::ONE,
            itemized_deduction: Decimal::MAX,
            use_standard: false,
            ..inputs()
        });

        assert_eq!(result.total_gross_income, Decimal::MAX);
        assert_eq!(result.final_deduction, Decimal::MAX);
        assert_eq!(result.taxable_regular_income, Decimal::ZERO);
        assert_eq!(result.total_tax, Decimal::ZERO);

        let result = TaxEstimator::new(None).calculate(&TaxInputs {
            regular_income: Decimal::MAX,
            cap_gain_income: Decimal::MAX,
            ..inputs()
        });
        assert_eq!(result.total_gross_income, Decimal::MAX);
        assert!(result.total_tax > Decimal::ZERO);
        assert!(result.effective_rate <= dec!(100));
    }

    #[test]
    fn fetched_document_replaces_fallback_brackets() {
        let table = BracketTable::from_rows(vec![BracketRow::new(dec!(0.05), None)]).unwrap();
        let doc = BracketDocument::from_tables([(FilingStatus::Single, table)]);

        let result = TaxEstimator::new(Some(&doc)).calculate(&inputs());

        assert_eq!(result.regular_tax, dec!(2195));
        assert_eq!(result.tax_breakdown[1].label, "Regular 5.0%");
    }

    #[test]
    fn unknown_year_uses_default_deduction_and_thresholds() {
        let mut input = inputs();
        input.year = 2031;
        input.regular_income = dec!(52000);
        input.cap_gain_income = dec!(1000);

        let result = TaxEstimator::new(None).calculate(&input);

        assert_eq!(result.final_deduction, dec!(12000));
        // taxable regular 40000 fills the default 0% layer exactly
        assert_eq!(result.cap_gain_tax, dec!(150));
    }

    #[test]
    fn snap_points_follow_final_deduction() {
        let estimator = TaxEstimator::new(None);

        let points = estimator.snap_points(FilingStatus::Single, dec!(16100));

        assert!(points.contains(&dec!(64575)));
        assert!(points.iter().all(|p| *p < dec!(1000000)));
    }

    #[test]
    fn flow_splits_net_income_by_source() {
        let mut input = inputs();
        input.cap_gain_income = dec!(10000);

        let result = TaxEstimator::new(None).calculate(&input);
        let flow = result.flow();

        assert_eq!(
            flow.net_from_regular + flow.net_from_cap_gains + flow.deduction,
            flow.net_income
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_identical_inputs_give_identical_results(
            regular in 0u32..1_000_000,
            gains in 0u32..500_000,
            itemized in 0u32..60_000,
            use_standard in proptest::bool::ANY,
            is_senior in proptest::bool::ANY,
            status_idx in 0usize..4,
        ) {
            let input = TaxInputs {
                year: 2025,
                filing_status: FilingStatus::all()[status_idx],
                is_senior,
                regular_income: Decimal::from(regular),
                cap_gain_income: Decimal::from(gains),
                itemized_deduction: Decimal::from(itemized),
                use_standard,
            };
            let estimator = TaxEstimator::new(None);

            prop_assert_eq!(estimator.calculate(&input), estimator.calculate(&input));
        }
    }
}
