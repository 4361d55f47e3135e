//! Estimator session: owns the bracket data source and the fetch cache and
//! turns [`TaxInputs`] into results.

use std::sync::Arc;

use rust_decimal::Decimal;
use tax_core::source::{
    BracketCache, BracketDocument, BracketSource, DataStatus, FetchTicket, SourceConfig,
    SourceError, SourceRegistry,
};
use tax_core::{FilingStatus, TaxEstimator, TaxInputs, TaxResult};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::report::Report;

/// Builds the registry of every available data source backend.
pub fn build_registry() -> SourceRegistry {
    let registry = tax_data::default_registry();
    debug!(backends = ?registry.available_backends(), "source registry ready");
    registry
}

struct PendingFetch {
    ticket: FetchTicket,
    handle: JoinHandle<Result<BracketDocument, SourceError>>,
}

/// One estimator run.
///
/// Fetches are started in the background when a year is selected and
/// collected with [`EstimatorSession::settle`]. Each year is fetched at most
/// once; a failed year stays on the fallback tables.
pub struct EstimatorSession {
    source: Option<Arc<dyn BracketSource>>,
    cache: BracketCache,
    pending: Vec<PendingFetch>,
    selected_year: Option<i32>,
}

impl EstimatorSession {
    /// A session that fetches from `source`, or uses only the built-in
    /// tables when `source` is `None`.
    pub fn new(source: Option<Box<dyn BracketSource>>) -> Self {
        Self {
            source: source.map(Arc::from),
            cache: BracketCache::new(),
            pending: Vec::new(),
            selected_year: None,
        }
    }

    /// Creates the session's source through `registry`.
    pub fn from_config(
        registry: &SourceRegistry,
        config: &SourceConfig,
    ) -> Result<Self, SourceError> {
        let source = registry.create(config)?;
        info!(source = %source.describe(), "bracket data source configured");
        Ok(Self::new(Some(source)))
    }

    pub fn offline() -> Self {
        Self::new(None)
    }

    pub fn source_description(&self) -> String {
        self.source
            .as_ref()
            .map_or_else(|| "built-in tables".to_string(), |s| s.describe())
    }

    pub fn selected_year(&self) -> Option<i32> {
        self.selected_year
    }

    /// Makes `year` current and starts fetching its tables if that has not
    /// happened yet.
    pub fn select_year(
        &mut self,
        year: i32,
    ) {
        self.selected_year = Some(year);

        let Some(source) = &self.source else {
            return;
        };
        if self.cache.status(year) != DataStatus::BuiltIn {
            return;
        }

        let ticket = self.cache.begin(year);
        let source = Arc::clone(source);
        let handle = tokio::spawn(async move { source.fetch(year).await });
        self.pending.push(PendingFetch { ticket, handle });
    }

    /// Waits for every started fetch and records its outcome.
    pub async fn settle(&mut self) {
        for PendingFetch { ticket, handle } in std::mem::take(&mut self.pending) {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(SourceError::Io(format!("fetch task failed: {e}"))));
            self.cache.resolve(ticket, result);
        }
    }

    /// Status of the currently selected year's tables.
    pub fn status(&self) -> DataStatus {
        self.selected_year
            .map_or(DataStatus::BuiltIn, |year| self.cache.status(year))
    }

    pub fn advisory(&self) -> Option<&'static str> {
        self.selected_year.and_then(|year| self.cache.advisory(year))
    }

    /// The fetched document for the selected year, if it has arrived.
    fn current_document(&self) -> Option<&BracketDocument> {
        self.selected_year.and_then(|year| self.cache.document(year))
    }

    fn estimator(&self) -> TaxEstimator<'_> {
        TaxEstimator::new(self.current_document())
    }

    /// Estimates `inputs` against the selected year's tables.
    ///
    /// Selects `inputs.year` first, so tables fetched for another year are
    /// never applied.
    pub fn calculate(
        &mut self,
        inputs: &TaxInputs,
    ) -> TaxResult {
        if self.selected_year != Some(inputs.year) {
            self.select_year(inputs.year);
        }
        self.estimator().calculate(inputs)
    }

    pub fn snap_points(
        &self,
        status: FilingStatus,
        final_deduction: Decimal,
    ) -> Vec<Decimal> {
        self.estimator().snap_points(status, final_deduction)
    }

    /// Calculates `inputs` and gathers everything the report shows.
    pub fn report(
        &mut self,
        inputs: &TaxInputs,
    ) -> Report {
        let result = self.calculate(inputs);
        let snap_points = self.snap_points(inputs.filing_status, result.final_deduction);
        let marginal_rate = self
            .estimator()
            .bracket_table(inputs.filing_status)
            .marginal_rate(result.taxable_regular_income);
        Report::new(
            inputs.clone(),
            result,
            marginal_rate,
            self.status(),
            self.source_description(),
            self.advisory(),
            snap_points,
        )
    }
}
