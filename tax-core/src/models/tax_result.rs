use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which part of the estimate a breakdown line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineKind {
    Deduction,
    Regular,
    CapGains,
}

impl fmt::Display for LineKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Deduction => "Deduction",
            Self::Regular => "Regular",
            Self::CapGains => "Cap Gains",
        })
    }
}

/// One slice of income taxed at a single rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketLine {
    pub kind: LineKind,
    pub rate: Decimal,
    pub income: Decimal,
    pub tax: Decimal,
    pub label: String,
}

/// Full result of one estimate.
///
/// `tax_breakdown` is ordered for rendering: the deduction line (if any),
/// then regular brackets low to high, then capital gains layers low to high.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub total_standard: Decimal,
    pub final_deduction: Decimal,
    pub taxable_regular_income: Decimal,
    pub taxable_cap_gains: Decimal,
    pub regular_tax: Decimal,
    pub cap_gain_tax: Decimal,
    pub total_tax: Decimal,
    /// Percentage of gross income, e.g. `12.5` for 12.5%.
    pub effective_rate: Decimal,
    pub total_gross_income: Decimal,
    pub tax_breakdown: Vec<BracketLine>,
}

impl TaxResult {
    pub fn net_income(&self) -> Decimal {
        self.total_gross_income - self.total_tax
    }

    pub fn lines(
        &self,
        kind: LineKind,
    ) -> impl Iterator<Item = &BracketLine> {
        self.tax_breakdown.iter().filter(move |line| line.kind == kind)
    }

    /// Amounts for an income-to-tax flow diagram.
    pub fn flow(&self) -> IncomeFlow {
        IncomeFlow {
            gross: self.total_gross_income,
            taxable_regular: self.taxable_regular_income,
            taxable_cap_gains: self.taxable_cap_gains,
            deduction: self.final_deduction,
            regular_tax: self.regular_tax,
            cap_gain_tax: self.cap_gain_tax,
            net_from_regular: self.taxable_regular_income - self.regular_tax,
            net_from_cap_gains: self.taxable_cap_gains - self.cap_gain_tax,
            net_income: self.net_income(),
        }
    }
}

/// Gross income split into taxable parts, taxes and what is left.
///
/// The deduction passes through untaxed, so it flows straight into net
/// income alongside the two `net_from_*` amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeFlow {
    pub gross: Decimal,
    pub taxable_regular: Decimal,
    pub taxable_cap_gains: Decimal,
    pub deduction: Decimal,
    pub regular_tax: Decimal,
    pub cap_gain_tax: Decimal,
    pub net_from_regular: Decimal,
    pub net_from_cap_gains: Decimal,
    pub net_income: Decimal,
}
