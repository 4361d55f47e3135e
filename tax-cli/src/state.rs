//! Session state for the estimator front end.
//!
//! Holds the user's selections and income streams between recalculations.
//! Streams are summed into one [`TaxInputs`] when an estimate is requested.

use rust_decimal::Decimal;
use tax_core::constants::{DEFAULT_SNAP_RADIUS, MAX_AMOUNT};
use tax_core::{FilingStatus, TaxInputs};
use thiserror::Error;
use tracing::debug;

/// Upper limit on streams of each kind.
pub const MAX_STREAMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Regular,
    CapGains,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("at most {MAX_STREAMS} income streams of each kind")]
    TooManyStreams,

    #[error("the primary income stream cannot be removed")]
    PrimaryStream,

    #[error("no income stream at position {0}")]
    NoSuchStream(usize),

    #[error("income amounts must not be negative")]
    NegativeAmount,

    #[error("income amounts must not exceed {MAX_AMOUNT}")]
    AmountTooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub year: i32,
    pub filing_status: FilingStatus,
    pub is_senior: bool,
    pub itemized_deduction: Decimal,
    pub use_standard: bool,

    /// Pull regular income streams onto bracket boundaries when they are set.
    pub snap_enabled: bool,
    pub snap_radius: Decimal,

    regular_incomes: Vec<Decimal>,
    cap_gain_incomes: Vec<Decimal>,
}

impl Default for AppState {
    fn default() -> Self {
        let inputs = TaxInputs::default();
        Self {
            year: inputs.year,
            filing_status: inputs.filing_status,
            is_senior: inputs.is_senior,
            itemized_deduction: inputs.itemized_deduction,
            use_standard: inputs.use_standard,
            snap_enabled: false,
            snap_radius: DEFAULT_SNAP_RADIUS,
            regular_incomes: vec![inputs.regular_income],
            cap_gain_incomes: vec![inputs.cap_gain_income],
        }
    }
}

impl AppState {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }

    pub fn streams(
        &self,
        kind: StreamKind,
    ) -> &[Decimal] {
        match kind {
            StreamKind::Regular => &self.regular_incomes,
            StreamKind::CapGains => &self.cap_gain_incomes,
        }
    }

    fn streams_mut(
        &mut self,
        kind: StreamKind,
    ) -> &mut Vec<Decimal> {
        match kind {
            StreamKind::Regular => &mut self.regular_incomes,
            StreamKind::CapGains => &mut self.cap_gain_incomes,
        }
    }

    /// Appends a zero-valued stream and returns its position.
    pub fn add_stream(
        &mut self,
        kind: StreamKind,
    ) -> Result<usize, StateError> {
        let streams = self.streams_mut(kind);
        if streams.len() >= MAX_STREAMS {
            return Err(StateError::TooManyStreams);
        }
        streams.push(Decimal::ZERO);
        Ok(streams.len() - 1)
    }

    /// Removes a stream. The first stream of each kind always stays.
    pub fn remove_stream(
        &mut self,
        kind: StreamKind,
        index: usize,
    ) -> Result<Decimal, StateError> {
        let streams = self.streams_mut(kind);
        if index == 0 {
            return Err(StateError::PrimaryStream);
        }
        if index >= streams.len() {
            return Err(StateError::NoSuchStream(index));
        }
        Ok(streams.remove(index))
    }

    /// Sets a stream's amount and returns the value actually stored.
    ///
    /// With snapping on, regular income within `snap_radius` of one of
    /// `snap_points` is stored as that point. Capital gains never snap.
    pub fn set_stream(
        &mut self,
        kind: StreamKind,
        index: usize,
        amount: Decimal,
        snap_points: &[Decimal],
    ) -> Result<Decimal, StateError> {
        if amount < Decimal::ZERO {
            return Err(StateError::NegativeAmount);
        }
        if amount > MAX_AMOUNT {
            return Err(StateError::AmountTooLarge);
        }

        let value = if self.snap_enabled && kind == StreamKind::Regular {
            let snapped = tax_core::calculations::snap_value(amount, snap_points, self.snap_radius);
            if snapped != amount {
                debug!(%amount, %snapped, "income snapped to bracket boundary");
            }
            snapped
        } else {
            amount
        };

        let slot = self
            .streams_mut(kind)
            .get_mut(index)
            .ok_or(StateError::NoSuchStream(index))?;
        *slot = value;
        Ok(value)
    }

    /// Replaces every stream of `kind`, keeping at least one.
    pub fn replace_streams(
        &mut self,
        kind: StreamKind,
        amounts: &[Decimal],
        snap_points: &[Decimal],
    ) -> Result<(), StateError> {
        if amounts.len() > MAX_STREAMS {
            return Err(StateError::TooManyStreams);
        }

        self.streams_mut(kind).truncate(1);
        for (index, amount) in amounts.iter().enumerate() {
            if index > 0 {
                self.add_stream(kind)?;
            }
            self.set_stream(kind, index, *amount, snap_points)?;
        }
        if amounts.is_empty() {
            self.set_stream(kind, 0, Decimal::ZERO, snap_points)?;
        }
        Ok(())
    }

    pub fn total(
        &self,
        kind: StreamKind,
    ) -> Decimal {
        self.streams(kind)
            .iter()
            .fold(Decimal::ZERO, |total, amount| total.saturating_add(*amount))
    }

    pub fn to_inputs(&self) -> TaxInputs {
        TaxInputs {
            year: self.year,
            filing_status: self.filing_status,
            is_senior: self.is_senior,
            regular_income: self.total(StreamKind::Regular),
            cap_gain_income: self.total(StreamKind::CapGains),
            itemized_deduction: self.itemized_deduction,
            use_standard: self.use_standard,
        }
    }
}
