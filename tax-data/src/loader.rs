use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::FilingStatus;
use tax_core::models::{BracketRow, BracketTable};
use tax_core::source::BracketDocument;
use thiserror::Error;
use tracing::debug;

use crate::file::document_file_name;

/// Errors that can occur when converting bracket CSV data into documents.
#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Row {row}: unknown filing status '{value}'")]
    UnknownFilingStatus { row: usize, value: String },

    #[error("Row {row}: rate {rate} is outside 0..=1")]
    InvalidRate { row: usize, rate: Decimal },

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// Maps IRS schedule codes to the filing status they describe.
///
/// - Schedule X → single
/// - Schedule Y-1 → married_jointly
/// - Schedule Y-2 → married_separately
/// - Schedule Z → head_of_household
fn schedule_to_filing_status(schedule: &str) -> Option<FilingStatus> {
    match schedule.trim() {
        "X" => Some(FilingStatus::Single),
        "Y-1" => Some(FilingStatus::MarriedJointly),
        "Y-2" => Some(FilingStatus::MarriedSeparately),
        "Z" => Some(FilingStatus::HeadOfHousehold),
        _ => None,
    }
}

/// A single record from the bracket CSV file.
///
/// - `tax_year`: the tax year (e.g., 2025)
/// - `filing_status`: a status name (`single`, `married_jointly`, ...) or an
///   IRS schedule code (X, Y-1, Y-2, Z)
/// - `rate`: the marginal rate as a decimal (e.g., 0.10 for 10%)
/// - `cap`: upper bound of the bracket (empty for unlimited)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub tax_year: i32,
    pub filing_status: String,
    pub rate: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub cap: Option<Decimal>,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Converts bracket CSV data into per-year bracket documents that the
/// `file` backend can read.
pub struct BracketLoader;

impl BracketLoader {
    /// Parse bracket records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records into one document per tax year.
    ///
    /// Rows for the same year and status may appear in any order; each
    /// table is sorted by cap and its top bracket made unbounded.
    pub fn build_documents(
        records: &[BracketRecord]
    ) -> Result<BTreeMap<i32, BracketDocument>, BracketLoaderError> {
        let mut grouped: BTreeMap<i32, BTreeMap<FilingStatus, Vec<BracketRow>>> = BTreeMap::new();

        for (index, record) in records.iter().enumerate() {
            let row = index + 1;
            let status = FilingStatus::parse(&record.filing_status)
                .or_else(|| schedule_to_filing_status(&record.filing_status))
                .ok_or_else(|| BracketLoaderError::UnknownFilingStatus {
                    row,
                    value: record.filing_status.clone(),
                })?;

            if record.rate < Decimal::ZERO || record.rate > Decimal::ONE {
                return Err(BracketLoaderError::InvalidRate {
                    row,
                    rate: record.rate,
                });
            }

            grouped
                .entry(record.tax_year)
                .or_default()
                .entry(status)
                .or_default()
                .push(BracketRow::new(record.rate, record.cap));
        }

        Ok(grouped
            .into_iter()
            .map(|(year, tables)| {
                let tables = tables
                    .into_iter()
                    .filter_map(|(status, rows)| BracketTable::from_rows(rows).map(|t| (status, t)));
                (year, BracketDocument::from_tables(tables))
            })
            .collect())
    }

    /// Write each document as `irs.tax-rates.{year}.json` into `dir`,
    /// replacing existing files. Returns the written paths.
    pub fn write_documents(
        dir: &Path,
        documents: &BTreeMap<i32, BracketDocument>,
    ) -> Result<Vec<PathBuf>, BracketLoaderError> {
        let mut written = Vec::with_capacity(documents.len());

        for (year, document) in documents {
            let path = dir.join(document_file_name(*year));
            let write_err = |message: String| BracketLoaderError::Write {
                path: path.clone(),
                message,
            };

            let json = serde_json::to_string_pretty(document).map_err(|e| write_err(e.to_string()))?;
            std::fs::write(&path, json).map_err(|e| write_err(e.to_string()))?;

            debug!(year, path = %path.display(), "wrote bracket document");
            written.push(path);
        }

        Ok(written)
    }
}
