use async_trait::async_trait;
use thiserror::Error;

use super::BracketDocument;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("No bracket data location for tax year {0}")]
    UnknownYear(i32),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Bracket data request returned status {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid bracket document: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Somewhere a year's bracket document can be fetched from.
#[async_trait]
pub trait BracketSource: Send + Sync {
    /// Short description of where documents come from, for status output.
    fn describe(&self) -> String;

    async fn fetch(
        &self,
        year: i32,
    ) -> Result<BracketDocument, SourceError>;
}
