pub mod calculations;
pub mod constants;
pub mod models;
pub mod source;

pub use calculations::TaxEstimator;
pub use models::*;
