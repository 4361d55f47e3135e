//! Bracket data sources: document normalization, the fetch seam, backend
//! registry and the year-keyed fetch cache.

pub mod cache;
pub mod document;
pub mod factory;
pub mod provider;

pub use cache::{BracketCache, DataStatus, FALLBACK_ADVISORY, FetchTicket, TableState};
pub use document::BracketDocument;
pub use factory::{SourceConfig, SourceFactory, SourceRegistry};
pub use provider::{BracketSource, SourceError};
