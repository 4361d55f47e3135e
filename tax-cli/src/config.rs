//! Optional TOML configuration for the estimator.
//!
//! ```toml
//! [defaults]
//! year = 2025
//! filing_status = "married_jointly"
//! senior = false
//! snap = true
//! snap_radius = 2000
//!
//! [source]
//! backend = "file"          # "http", "file" or "none"
//! location = "./brackets"
//! timeout_secs = 10
//!
//! [source.urls]
//! 2025 = "https://example.com/irs.tax-rates.2025.json"
//! ```
//!
//! Every section and key is optional; missing values use the defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::FilingStatus;
use tax_core::constants::DEFAULT_SNAP_RADIUS;
use tax_core::source::SourceConfig;
use thiserror::Error;

/// Backend name that disables fetching entirely.
pub const OFFLINE_BACKEND: &str = "none";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub defaults: Defaults,
    pub source: SourceSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub year: i32,
    pub filing_status: FilingStatus,
    pub senior: bool,
    pub snap: bool,
    pub snap_radius: Decimal,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            year: 2026,
            filing_status: FilingStatus::Single,
            senior: false,
            snap: false,
            snap_radius: DEFAULT_SNAP_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub backend: String,
    pub location: String,
    pub timeout_secs: u64,
    /// Keyed by tax year; TOML table keys are always strings.
    pub urls: BTreeMap<String, String>,
}

impl Default for SourceSection {
    fn default() -> Self {
        let defaults = SourceConfig::default();
        Self {
            backend: defaults.backend,
            location: defaults.location,
            timeout_secs: defaults.timeout_secs,
            urls: BTreeMap::new(),
        }
    }
}

impl SourceSection {
    pub fn is_offline(&self) -> bool {
        self.backend.eq_ignore_ascii_case(OFFLINE_BACKEND)
    }

    pub fn to_source_config(&self) -> Result<SourceConfig, ConfigError> {
        let urls = self
            .urls
            .iter()
            .map(|(year, url)| {
                year.trim()
                    .parse::<i32>()
                    .map(|year| (year, url.clone()))
                    .map_err(|_| ConfigError::Invalid(format!("source.urls key '{year}' is not a year")))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(SourceConfig {
            backend: self.backend.trim().to_ascii_lowercase(),
            location: self.location.clone(),
            urls,
            timeout_secs: self.timeout_secs,
        })
    }
}

impl EstimatorConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.snap_radius <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "defaults.snap_radius must be positive".to_string(),
            ));
        }
        self.source.to_source_config().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = EstimatorConfig::from_toml_str("").unwrap();

        assert_eq!(config, EstimatorConfig::default());
        assert_eq!(config.source.backend, "http");
        assert_eq!(config.defaults.snap_radius, dec!(2000));
    }

    #[test]
    fn full_file_is_read() {
        let config = EstimatorConfig::from_toml_str(
            r#"
            [defaults]
            year = 2025
            filing_status = "head_of_household"
            senior = true
            snap = true
            snap_radius = 500

            [source]
            backend = "File"
            location = "/srv/brackets"
            timeout_secs = 3

            [source.urls]
            2025 = "http://localhost/2025.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults.year, 2025);
        assert_eq!(config.defaults.filing_status, FilingStatus::HeadOfHousehold);
        assert!(config.defaults.senior && config.defaults.snap);
        assert_eq!(config.defaults.snap_radius, dec!(500));

        let source = config.source.to_source_config().unwrap();
        assert_eq!(source.backend, "file");
        assert_eq!(source.location, "/srv/brackets");
        assert_eq!(source.timeout_secs, 3);
        assert_eq!(source.urls.get(&2025).map(String::as_str), Some("http://localhost/2025.json"));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = EstimatorConfig::from_toml_str("[source]\nbackend = \"none\"\n").unwrap();

        assert!(config.source.is_offline());
        assert_eq!(config.source.timeout_secs, 10);
        assert_eq!(config.defaults, Defaults::default());
    }

    #[test]
    fn non_year_url_key_is_rejected() {
        let err = EstimatorConfig::from_toml_str("[source.urls]\nlatest = \"http://x\"\n").unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("latest")));
    }

    #[test]
    fn non_positive_snap_radius_is_rejected() {
        let err = EstimatorConfig::from_toml_str("[defaults]\nsnap_radius = 0\n").unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_filing_status_is_a_parse_error() {
        let err = EstimatorConfig::from_toml_str("[defaults]\nfiling_status = \"widowed\"\n").unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = EstimatorConfig::load(Path::new("/this/path/does/not/exist.toml")).unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
