pub mod app;
pub mod config;
pub mod csv_loader;
pub mod logging;
pub mod report;
pub mod state;
pub mod utils;
