//! Tax calculation modules.
//!
//! Each step of an estimate lives in its own module; [`TaxEstimator`]
//! strings them together.

pub mod cap_gains;
pub mod common;
pub mod deduction;
pub mod estimator;
pub mod income_split;
pub mod progressive;
pub mod resolver;
pub mod snap;

pub use cap_gains::{CapGainsResult, layer_cap_gains, thresholds_for};
pub use deduction::{DeductionResult, resolve_deduction, standard_deduction};
pub use estimator::TaxEstimator;
pub use income_split::{IncomeSplit, split_income};
pub use progressive::{ProgressiveSchedule, ProgressiveTaxResult};
pub use resolver::resolve_brackets;
pub use snap::{snap_points, snap_value};
