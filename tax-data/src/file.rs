use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tax_core::source::{BracketDocument, BracketSource, SourceConfig, SourceError, SourceFactory};
use tracing::debug;

/// File name of the bracket document for `year`, as published and as
/// written by the loader.
pub fn document_file_name(year: i32) -> String {
    format!("irs.tax-rates.{year}.json")
}

/// Reads bracket documents from a local directory.
#[derive(Debug, Clone)]
pub struct FileBracketSource {
    dir: PathBuf,
}

impl FileBracketSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(
        &self,
        year: i32,
    ) -> PathBuf {
        self.dir.join(document_file_name(year))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl BracketSource for FileBracketSource {
    fn describe(&self) -> String {
        format!("file ({})", self.dir.display())
    }

    async fn fetch(
        &self,
        year: i32,
    ) -> Result<BracketDocument, SourceError> {
        let path = self.path_for(year);
        debug!(year, path = %path.display(), "reading bracket document");

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SourceError::UnknownYear(year),
                _ => SourceError::Io(format!("{}: {e}", path.display())),
            })?;

        BracketDocument::from_json_str(&contents)
    }
}

/// Builds [`FileBracketSource`]s; `location` is the directory.
pub struct FileSourceFactory;

impl SourceFactory for FileSourceFactory {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    fn create(
        &self,
        config: &SourceConfig,
    ) -> Result<Box<dyn BracketSource>, SourceError> {
        if config.location.trim().is_empty() {
            return Err(SourceError::Configuration(
                "file backend requires a directory location".to_string(),
            ));
        }

        Ok(Box::new(FileBracketSource::new(config.location.trim())))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::FilingStatus;

    use super::*;

    #[test]
    fn file_name_includes_year() {
        assert_eq!(document_file_name(2026), "irs.tax-rates.2026.json");
    }

    #[tokio::test]
    async fn fetch_reads_and_normalizes_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("irs.tax-rates.2025.json"),
            r#"{ "married_jointly": [ { "tax_rate": "0.10", "max": "23,850" }, { "rate": 0.12 } ] }"#,
        )
        .unwrap();
        let source = FileBracketSource::new(dir.path());

        let doc = source.fetch(2025).await.unwrap();

        let table = doc.table(FilingStatus::MarriedJointly).unwrap();
        assert_eq!(table.rows()[0].cap, Some(dec!(23850)));
        assert_eq!(table.rows()[1].rate, dec!(0.12));
        assert!(doc.table(FilingStatus::Single).is_none());
    }

    #[tokio::test]
    async fn missing_file_is_unknown_year() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileBracketSource::new(dir.path());

        let err = source.fetch(2026).await.unwrap_err();

        assert_eq!(err, SourceError::UnknownYear(2026));
    }

    #[tokio::test]
    async fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(document_file_name(2026)), "[1, 2]").unwrap();
        let source = FileBracketSource::new(dir.path());

        let err = source.fetch(2026).await.unwrap_err();

        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn factory_requires_location() {
        let config = SourceConfig {
            backend: "file".to_string(),
            location: "  ".to_string(),
            ..SourceConfig::default()
        };

        let result = FileSourceFactory.create(&config);

        assert!(matches!(result, Err(SourceError::Configuration(_))));
    }
}
