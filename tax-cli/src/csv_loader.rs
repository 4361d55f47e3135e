//! CSV loader for batch estimate scenarios.
//!
//! ## CSV Format
//!
//! Columns are matched by header name, so order does not matter.
//!
//! | Column               | Required | Type    | Notes                                   |
//! |----------------------|----------|---------|-----------------------------------------|
//! | `tax_year`           | yes      | integer | e.g. `2026`                             |
//! | `filing_status`      | yes      | string  | `single`, `married_jointly`, `married_separately`, `head_of_household` (or `S`, `MFJ`, `MFS`, `HOH`) |
//! | `regular_income`     | yes      | decimal | total of all regular income streams     |
//! | `cap_gain_income`    | yes      | decimal | total long-term capital gains           |
//! | `is_senior`          | no       | bool    | `true`/`false`, `yes`/`no`, `1`/`0`; default `false` |
//! | `itemized_deduction` | no       | decimal | default `0`                             |
//! | `use_standard`       | no       | bool    | default `true`                          |
//!
//! ### Minimal example
//!
//! ```csv
//! tax_year,filing_status,regular_income,cap_gain_income
//! 2026,single,60000,0
//! ```
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::constants::MAX_AMOUNT;
use tax_core::{FilingStatus, TaxInputs};

#[derive(Debug, Deserialize)]
struct CsvRow {
    tax_year: i32,
    filing_status: String,
    regular_income: Decimal,
    cap_gain_income: Decimal,
    is_senior: Option<String>,
    itemized_deduction: Option<Decimal>,
    use_standard: Option<String>,
}

/// Errors that can occur while loading or converting CSV data.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    /// The underlying CSV deserialisation failed (bad structure, missing
    /// required column, type mismatch, etc.).
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `row` is 1-based (header = row 0).
    #[error("unrecognised filing status '{status}' on row {row}")]
    InvalidFilingStatus { status: String, row: usize },

    #[error("invalid {column} value '{value}' on row {row}")]
    InvalidFlag {
        column: &'static str,
        value: String,
        row: usize,
    },

    #[error("negative {column} on row {row}")]
    NegativeAmount { column: &'static str, row: usize },

    #[error("{column} on row {row} is larger than {MAX_AMOUNT}")]
    AmountTooLarge { column: &'static str, row: usize },
}

fn parse_flag(
    value: Option<String>,
    default: bool,
    column: &'static str,
    row: usize,
) -> Result<bool, CsvLoadError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(CsvLoadError::InvalidFlag { column, value, row }),
    }
}

fn checked_amount(
    value: Decimal,
    column: &'static str,
    row: usize,
) -> Result<Decimal, CsvLoadError> {
    if value < Decimal::ZERO {
        Err(CsvLoadError::NegativeAmount { column, row })
    } else if value > MAX_AMOUNT {
        Err(CsvLoadError::AmountTooLarge { column, row })
    } else {
        Ok(value)
    }
}

/// Convert a single CSV row into [`TaxInputs`]. `row_number` is 1-based.
fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<TaxInputs, CsvLoadError> {
    let filing_status = FilingStatus::parse(&row.filing_status).ok_or_else(|| {
        CsvLoadError::InvalidFilingStatus {
            status: row.filing_status.clone(),
            row: row_number,
        }
    })?;

    Ok(TaxInputs {
        year: row.tax_year,
        filing_status,
        is_senior: parse_flag(row.is_senior, false, "is_senior", row_number)?,
        regular_income: checked_amount(row.regular_income, "regular_income", row_number)?,
        cap_gain_income: checked_amount(row.cap_gain_income, "cap_gain_income", row_number)?,
        itemized_deduction: checked_amount(
            row.itemized_deduction.unwrap_or_default(),
            "itemized_deduction",
            row_number,
        )?,
        use_standard: parse_flag(row.use_standard, true, "use_standard", row_number)?,
    })
}

/// Parse CSV text and return one [`TaxInputs`] per row, in file order.
///
/// # Errors
///
/// * [`CsvLoadError::Parse`] if the CSV is structurally invalid or a
///   required field cannot be deserialised.
/// * The row-level variants for values that parse but are not acceptable.
pub fn load_from_str(input: &str) -> Result<Vec<TaxInputs>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &std::path::Path) -> Result<Vec<TaxInputs>, CsvLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CsvLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}
