//! Year-keyed record of bracket document fetches.
//!
//! Each year moves through `NotRequested → Pending → Ready | Failed`. Every
//! fetch is issued a [`FetchTicket`]; only the newest ticket for a year may
//! store its result, so a slow response for an earlier request can never
//! overwrite a later one.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use super::{BracketDocument, SourceError};

/// Shown while a year's tables could not be fetched.
pub const FALLBACK_ADVISORY: &str = "Could not load tax tables. Using fallback data.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableState {
    #[default]
    NotRequested,
    Pending,
    Ready(BracketDocument),
    Failed(String),
}

/// Where the tables for a calculation currently come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStatus {
    BuiltIn,
    Fetching,
    Live,
    Fallback,
}

impl fmt::Display for DataStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::BuiltIn => "Built-in Data",
            Self::Fetching => "Fetching...",
            Self::Live => "Live JSON Loaded",
            Self::Fallback => "Fallback Data (Fetch Failed)",
        })
    }
}

/// Proof that a fetch was started; hand it back to [`BracketCache::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    year: i32,
    generation: u64,
}

impl FetchTicket {
    pub fn year(&self) -> i32 {
        self.year
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    state: TableState,
    generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct BracketCache {
    entries: HashMap<i32, Entry>,
    next_generation: u64,
}

impl BracketCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `year` as pending and returns the ticket for this fetch.
    ///
    /// Any earlier ticket for the same year becomes stale.
    pub fn begin(
        &mut self,
        year: i32,
    ) -> FetchTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.entries.insert(
            year,
            Entry {
                state: TableState::Pending,
                generation,
            },
        );
        debug!(year, generation, "bracket fetch started");
        FetchTicket { year, generation }
    }

    /// Stores a fetch result. Returns `false` and drops the result when the
    /// ticket is no longer the newest one for its year.
    pub fn resolve(
        &mut self,
        ticket: FetchTicket,
        result: Result<BracketDocument, SourceError>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.year) else {
            debug!(year = ticket.year, "discarding result for unknown fetch");
            return false;
        };
        if entry.generation != ticket.generation {
            debug!(
                year = ticket.year,
                stale = ticket.generation,
                current = entry.generation,
                "discarding stale bracket fetch result"
            );
            return false;
        }

        entry.state = match result {
            Ok(document) => {
                debug!(year = ticket.year, statuses = ?document.statuses(), "bracket fetch ready");
                TableState::Ready(document)
            }
            Err(err) => {
                warn!(year = ticket.year, error = %err, "bracket fetch failed");
                TableState::Failed(err.to_string())
            }
        };
        true
    }

    pub fn state(
        &self,
        year: i32,
    ) -> &TableState {
        static NOT_REQUESTED: TableState = TableState::NotRequested;
        self.entries
            .get(&year)
            .map(|entry| &entry.state)
            .unwrap_or(&NOT_REQUESTED)
    }

    /// The fetched document for `year`, if one has arrived.
    pub fn document(
        &self,
        year: i32,
    ) -> Option<&BracketDocument> {
        match self.state(year) {
            TableState::Ready(document) => Some(document),
            _ => None,
        }
    }

    pub fn status(
        &self,
        year: i32,
    ) -> DataStatus {
        match self.state(year) {
            TableState::NotRequested => DataStatus::BuiltIn,
            TableState::Pending => DataStatus::Fetching,
            TableState::Ready(_) => DataStatus::Live,
            TableState::Failed(_) => DataStatus::Fallback,
        }
    }

    /// User-facing notice for a failed fetch.
    pub fn advisory(
        &self,
        year: i32,
    ) -> Option<&'static str> {
        matches!(self.state(year), TableState::Failed(_)).then_some(FALLBACK_ADVISORY)
    }
}
