//! Rendering of an estimate as a text report or JSON.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;
use tax_core::calculations::common::{percent_of, rate_percent};
use tax_core::{BracketLine, IncomeFlow, LineKind, TaxInputs, TaxResult};

use crate::utils::{format_currency, format_percent};

/// Rate drawn at full bar height.
pub const CHART_MAX_RATE: Decimal = dec!(0.40);

const MIN_BAR_HEIGHT: Decimal = dec!(1);
const CHART_COLUMNS: u32 = 40;

/// One breakdown line as a chart bar. Widths are shares of gross income,
/// heights are shares of [`CHART_MAX_RATE`], both in percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarSegment {
    pub label: String,
    pub kind: LineKind,
    pub rate: Decimal,
    pub income: Decimal,
    pub tax: Decimal,
    pub width_pct: Decimal,
    pub height_pct: Decimal,
}

/// Chart bars for `result`, in breakdown order. Empty when there is no
/// gross income.
pub fn bar_segments(result: &TaxResult) -> Vec<BarSegment> {
    if result.total_gross_income <= Decimal::ZERO {
        return Vec::new();
    }

    result
        .tax_breakdown
        .iter()
        .map(|line| bar_segment(line, result.total_gross_income))
        .collect()
}

fn bar_segment(
    line: &BracketLine,
    gross: Decimal,
) -> BarSegment {
    let height = line.rate.min(CHART_MAX_RATE) / CHART_MAX_RATE * Decimal::ONE_HUNDRED;

    BarSegment {
        label: line.label.clone(),
        kind: line.kind,
        rate: line.rate,
        income: line.income,
        tax: line.tax,
        width_pct: percent_of(line.income, gross),
        height_pct: height.max(MIN_BAR_HEIGHT),
    }
}

/// Everything shown for one estimate.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub inputs: TaxInputs,
    pub result: TaxResult,
    pub net_income: Decimal,
    /// Rate of the regular bracket the last dollar of ordinary income falls in.
    pub marginal_rate: Decimal,
    pub flow: IncomeFlow,
    pub data_status: String,
    pub data_source: String,
    pub advisory: Option<String>,
    pub snap_points: Vec<Decimal>,
    pub chart: Vec<BarSegment>,
}

impl Report {
    pub fn new(
        inputs: TaxInputs,
        result: TaxResult,
        marginal_rate: Decimal,
        data_status: impl ToString,
        data_source: String,
        advisory: Option<&str>,
        snap_points: Vec<Decimal>,
    ) -> Self {
        Self {
            net_income: result.net_income(),
            marginal_rate,
            flow: result.flow(),
            chart: bar_segments(&result),
            inputs,
            result,
            data_status: data_status.to_string(),
            data_source,
            advisory: advisory.map(str::to_string),
            snap_points,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(
        &self,
        out: &mut String,
    ) -> std::fmt::Result {
        let r = &self.result;
        let senior = if self.inputs.is_senior { ", 65+" } else { "" };

        writeln!(
            out,
            "Tax estimate for {} ({}{senior})",
            self.inputs.year,
            self.inputs.filing_status.label()
        )?;
        writeln!(out, "Data: {} [{}]", self.data_status, self.data_source)?;
        if let Some(advisory) = &self.advisory {
            writeln!(out, "! {advisory}")?;
        }
        writeln!(out)?;

        row(out, "Gross income", r.total_gross_income)?;
        let deduction_note = if r.final_deduction == r.total_standard {
            "standard"
        } else {
            "itemized"
        };
        writeln!(
            out,
            "{:<24}{:>14}  ({deduction_note}; standard {})",
            "Deduction",
            format_currency(r.final_deduction),
            format_currency(r.total_standard)
        )?;
        row(out, "Taxable regular income", r.taxable_regular_income)?;
        row(out, "Taxable capital gains", r.taxable_cap_gains)?;
        writeln!(out)?;

        self.write_lines(out, LineKind::Regular, "Regular income tax", r.regular_tax)?;
        self.write_lines(out, LineKind::CapGains, "Capital gains tax", r.cap_gain_tax)?;

        row(out, "Total tax", r.total_tax)?;
        writeln!(out, "{:<24}{:>14}", "Effective rate", format_percent(r.effective_rate))?;
        writeln!(
            out,
            "{:<24}{:>13}%",
            "Marginal rate",
            rate_percent(self.marginal_rate, 1)
        )?;
        row(out, "Net income", self.net_income)?;

        self.write_flow(out)?;
        self.write_chart(out)?;

        if !self.snap_points.is_empty() {
            let points: Vec<String> = self.snap_points.iter().map(|p| format_currency(*p)).collect();
            writeln!(out)?;
            writeln!(out, "Bracket boundaries (gross income): {}", points.join(", "))?;
        }
        Ok(())
    }

    fn write_lines(
        &self,
        out: &mut String,
        kind: LineKind,
        title: &str,
        total: Decimal,
    ) -> std::fmt::Result {
        writeln!(out, "{title}")?;
        for line in self.result.lines(kind) {
            writeln!(
                out,
                "  {:>14} @ {:>5}% = {:>12}",
                format_currency(line.income),
                rate_percent(line.rate, 1),
                format_currency(line.tax)
            )?;
        }
        row(out, &format!("  Total {}", kind.to_string().to_lowercase()), total)?;
        writeln!(out)
    }

    fn write_flow(
        &self,
        out: &mut String,
    ) -> std::fmt::Result {
        let f = &self.flow;
        writeln!(out)?;
        writeln!(out, "Income flow")?;
        writeln!(
            out,
            "  deduction {} -> untaxed",
            format_currency(f.deduction)
        )?;
        writeln!(
            out,
            "  regular   {} -> tax {}, net {}",
            format_currency(f.taxable_regular),
            format_currency(f.regular_tax),
            format_currency(f.net_from_regular)
        )?;
        writeln!(
            out,
            "  gains     {} -> tax {}, net {}",
            format_currency(f.taxable_cap_gains),
            format_currency(f.cap_gain_tax),
            format_currency(f.net_from_cap_gains)
        )?;
        writeln!(
            out,
            "  gross     {} -> net {}",
            format_currency(f.gross),
            format_currency(f.net_income)
        )
    }

    fn write_chart(
        &self,
        out: &mut String,
    ) -> std::fmt::Result {
        if self.chart.is_empty() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "Tax map (width: share of income, shade: rate)")?;
        for bar in &self.chart {
            writeln!(
                out,
                "  {:<16}|{:<width$}| {:>6} of income",
                bar.label,
                bar_text(bar),
                format_percent(bar.width_pct),
                width = CHART_COLUMNS as usize
            )?;
        }
        Ok(())
    }
}

fn row(
    out: &mut String,
    label: &str,
    amount: Decimal,
) -> std::fmt::Result {
    writeln!(out, "{label:<24}{:>14}", format_currency(amount))
}

/// A bar `width_pct` of the chart wide, shaded by `height_pct`.
fn bar_text(bar: &BarSegment) -> String {
    let glyph = match bar.height_pct {
        h if h >= dec!(75) => '█',
        h if h >= dec!(50) => '▓',
        h if h >= dec!(25) => '▒',
        _ => '░',
    };
    let columns = (bar.width_pct.min(Decimal::ONE_HUNDRED) * Decimal::from(CHART_COLUMNS)
        / Decimal::ONE_HUNDRED)
        .round()
        .max(Decimal::ONE);
    std::iter::repeat_n(glyph, columns.to_usize().unwrap_or(1)).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tax_core::calculations::common::round_half_up;
    use tax_core::{FilingStatus, TaxEstimator};

    use super::*;

    fn report(inputs: TaxInputs) -> Report {
        let result = TaxEstimator::new(None).calculate(&inputs);
        Report::new(
            inputs,
            result,
            dec!(0.12),
            "Built-in Data",
            "built-in tables".to_string(),
            None,
            vec![],
        )
    }

    fn inputs(
        regular: Decimal,
        gains: Decimal,
    ) -> TaxInputs {
        TaxInputs {
            year: 2026,
            filing_status: FilingStatus::Single,
            regular_income: regular,
            cap_gain_income: gains,
            ..TaxInputs::default()
        }
    }

    #[test]
    fn bar_widths_are_income_shares_and_heights_rate_shares() {
        let report = report(inputs(dec!(60000), dec!(20000)));

        let bars: Vec<_> = report
            .chart
            .iter()
            .map(|b| (b.label.as_str(), round_half_up(b.width_pct), b.height_pct))
            .collect();

        assert_eq!(
            bars,
            vec![
                ("Deduction", dec!(20.13), dec!(1)),
                ("Regular 10.0%", dec!(14.91), dec!(25)),
                ("Regular 12.0%", dec!(39.97), dec!(30)),
                ("Cap Gains 0%", dec!(6.94), dec!(1)),
                ("Cap Gains 15%", dec!(18.06), dec!(37.5)),
            ]
        );
    }

    #[test]
    fn bar_height_is_capped_at_full() {
        let line = BracketLine {
            kind: LineKind::Regular,
            rate: dec!(0.50),
            income: dec!(10),
            tax: dec!(5),
            label: "Regular 50.0%".to_string(),
        };

        assert_eq!(bar_segment(&line, dec!(10)).height_pct, dec!(100));
    }

    #[test]
    fn no_chart_without_income() {
        let report = report(inputs(Decimal::ZERO, Decimal::ZERO));

        assert!(report.chart.is_empty());
        assert!(!report.render_text().contains("Tax map"));
    }

    #[test]
    fn bar_text_scales_to_chart_width() {
        let report = report(inputs(dec!(60000), dec!(20000)));

        // 39.97% of 40 columns, 12% rate shade
        assert_eq!(bar_text(&report.chart[2]), "▒".repeat(16));
        // deduction: 0% rate
        assert_eq!(bar_text(&report.chart[0]), "░".repeat(8));
    }

    #[test]
    fn text_report_shows_totals_and_advisory() {
        let inputs = inputs(dec!(60000), dec!(10000));
        let result = TaxEstimator::new(None).calculate(&inputs);
        let report = Report::new(
            inputs,
            result,
            dec!(0.12),
            "Fallback Data (Fetch Failed)",
            "http (default URLs)".to_string(),
            Some("Could not load tax tables. Using fallback data."),
            vec![dec!(28025), dec!(64575)],
        );

        let text = report.render_text();

        assert!(text.starts_with("Tax estimate for 2026 (Single)\n"));
        assert!(text.contains("Data: Fallback Data (Fetch Failed) [http (default URLs)]"));
        assert!(text.contains("! Could not load tax tables. Using fallback data."));
        assert!(text.contains("Total tax"));
        assert!(text.contains("$5,697"));
        assert!(text.contains("$28,025, $64,575"));
        assert!(text.contains("Marginal rate"));
        assert!(text.contains("12.0%"));
    }

    #[test]
    fn json_report_includes_contract_fields() {
        let report = report(inputs(dec!(60000), Decimal::ZERO));

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["data_status"], "Built-in Data");
        assert_eq!(value["inputs"]["filing_status"], "single");
        assert!(value["result"]["tax_breakdown"].is_array());
        assert!(value["flow"]["net_income"].is_string());
        assert_eq!(value["chart"].as_array().map(Vec::len), Some(3));
    }
}
