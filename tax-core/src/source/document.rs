//! Normalization of external bracket documents.
//!
//! A published bracket document maps filing-status keys to either a list of
//! rows or an object wrapping that list under `brackets`. Rows name their
//! fields inconsistently (`rate` or `tax_rate`; `cap`, `threshold` or
//! `max`). Everything is folded into canonical [`BracketRow`]s here so the
//! calculation core never sees the raw shape.
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::FilingStatus;
//! use tax_core::source::BracketDocument;
//!
//! let doc = BracketDocument::from_json_str(
//!     r#"{ "single": { "brackets": [
//!         { "tax_rate": 0.10, "threshold": 11925 },
//!         { "rate": 0.12 }
//!     ] } }"#,
//! )
//! .unwrap();
//!
//! let table = doc.table(FilingStatus::Single).unwrap();
//! assert_eq!(table.rows()[0].rate, dec!(0.10));
//! assert_eq!(table.rows()[0].cap, Some(dec!(11925)));
//! assert!(table.rows()[1].is_unbounded());
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::SourceError;
use crate::models::{BracketRow, BracketTable, FilingStatus};

const RATE_KEYS: [&str; 2] = ["rate", "tax_rate"];
const CAP_KEYS: [&str; 3] = ["cap", "threshold", "max"];

/// Bracket tables for one tax year, keyed by filing status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BracketDocument {
    tables: BTreeMap<FilingStatus, BracketTable>,
}

impl BracketDocument {
    pub fn from_tables<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = (FilingStatus, BracketTable)>,
    {
        Self {
            tables: tables
                .into_iter()
                .collect(),
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self, SourceError> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| SourceError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    /// Normalizes a parsed JSON document.
    ///
    /// Keys that are not filing statuses are ignored, as are entries that
    /// yield no rows. Only a non-object top level is an error.
    pub fn from_value(value: Value) -> Result<Self, SourceError> {
        let Value::Object(entries) = value else {
            return Err(SourceError::Parse(
                "bracket document must be a JSON object".to_string(),
            ));
        };

        let mut tables = BTreeMap::new();
        for (key, entry) in entries {
            let Some(status) = FilingStatus::parse(&key) else {
                debug!(key = %key, "ignoring non filing-status key in bracket document");
                continue;
            };

            let rows = entry_rows(&key, &entry);
            match BracketTable::from_published_rows(rows) {
                Some(table) => {
                    tables.insert(status, table);
                }
                None => debug!(status = %status, "bracket document entry has no rows"),
            }
        }

        Ok(Self { tables })
    }

    pub fn table(
        &self,
        status: FilingStatus,
    ) -> Option<&BracketTable> {
        self.tables.get(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Filing statuses that have a table.
    pub fn statuses(&self) -> Vec<FilingStatus> {
        self.tables.keys().copied().collect()
    }

    /// Canonical JSON form: `{ status: { "brackets": [{ "rate", "cap" }] } }`
    /// with `null` for the unbounded cap.
    pub fn to_value(&self) -> Value {
        let entries: Map<String, Value> = self
            .tables
            .iter()
            .map(|(status, table)| {
                let rows: Vec<Value> = table
                    .rows()
                    .iter()
                    .map(|row| json!({ "rate": row.rate, "cap": row.cap }))
                    .collect();
                (status.as_str().to_string(), json!({ "brackets": rows }))
            })
            .collect();
        Value::Object(entries)
    }
}

impl Serialize for BracketDocument {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BracketDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

fn entry_rows(
    key: &str,
    entry: &Value,
) -> Vec<BracketRow> {
    let raw_rows = match entry {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(obj) => match obj.get("brackets") {
            Some(Value::Array(rows)) => rows.as_slice(),
            _ => {
                warn!(status = key, "bracket entry object has no `brackets` list");
                return Vec::new();
            }
        },
        _ => {
            warn!(status = key, "bracket entry is neither a list nor an object");
            return Vec::new();
        }
    };

    raw_rows
        .iter()
        .filter_map(|raw| match raw {
            Value::Object(fields) => Some(normalize_row(key, fields)),
            _ => {
                warn!(status = key, "skipping bracket row that is not an object");
                None
            }
        })
        .collect()
}

/// Resolves the aliased fields of one row. An unresolvable rate becomes
/// zero and an unresolvable cap becomes unbounded.
fn normalize_row(
    key: &str,
    fields: &Map<String, Value>,
) -> BracketRow {
    let rate = RATE_KEYS
        .iter()
        .find_map(|name| fields.get(*name).and_then(decimal_from_value))
        .unwrap_or_else(|| {
            warn!(status = key, "bracket row has no usable rate, using 0");
            Decimal::ZERO
        });

    let cap = CAP_KEYS
        .iter()
        .find_map(|name| fields.get(*name).and_then(decimal_from_value))
        .filter(|cap| *cap > Decimal::ZERO);

    BracketRow::new(rate, cap)
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().replace(',', ""),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
