mod filing_status;
mod tax_bracket;
mod tax_inputs;
mod tax_result;

pub use filing_status::FilingStatus;
pub use tax_bracket::{BracketRow, BracketTable};
pub use tax_inputs::TaxInputs;
pub use tax_result::{BracketLine, IncomeFlow, LineKind, TaxResult};
