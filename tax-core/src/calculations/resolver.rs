//! Picks the ordinary bracket table for a calculation.

use tracing::debug;

use crate::constants::{default_fallback_brackets, fallback_brackets};
use crate::models::{BracketTable, FilingStatus};
use crate::source::BracketDocument;

/// Table for `status` from `document` when it has one, otherwise the
/// built-in fallback.
///
/// The fallback set only carries single and married-jointly tables; other
/// statuses borrow the single table.
pub fn resolve_brackets(
    document: Option<&BracketDocument>,
    status: FilingStatus,
) -> BracketTable {
    if let Some(table) = document.and_then(|doc| doc.table(status)) {
        return table.clone();
    }

    debug!(%status, "using built-in fallback brackets");
    fallback_brackets(status).unwrap_or_else(default_fallback_brackets)
}
