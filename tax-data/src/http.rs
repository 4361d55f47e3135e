use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tax_core::constants::tax_data_url;
use tax_core::source::{BracketDocument, BracketSource, SourceConfig, SourceError, SourceFactory};
use tracing::{debug, info};

/// Fetches bracket documents over HTTP, one URL per tax year.
///
/// Years without a configured URL use the built-in default URL, if any.
#[derive(Debug, Clone)]
pub struct HttpBracketSource {
    client: reqwest::Client,
    urls: BTreeMap<i32, String>,
}

impl HttpBracketSource {
    pub fn new(
        urls: BTreeMap<i32, String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self { client, urls })
    }

    pub fn url_for(
        &self,
        year: i32,
    ) -> Option<&str> {
        self.urls
            .get(&year)
            .map(String::as_str)
            .or_else(|| tax_data_url(year))
    }
}

#[async_trait]
impl BracketSource for HttpBracketSource {
    fn describe(&self) -> String {
        if self.urls.is_empty() {
            "http (default URLs)".to_string()
        } else {
            format!("http ({} configured URLs)", self.urls.len())
        }
    }

    async fn fetch(
        &self,
        year: i32,
    ) -> Result<BracketDocument, SourceError> {
        let url = self.url_for(year).ok_or(SourceError::UnknownYear(year))?;
        debug!(year, url, "requesting bracket document");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let document = BracketDocument::from_value(value)?;
        info!(year, statuses = document.statuses().len(), "bracket document loaded");
        Ok(document)
    }
}

/// Builds [`HttpBracketSource`]s from `urls` and `timeout_secs`.
pub struct HttpSourceFactory;

impl SourceFactory for HttpSourceFactory {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    fn create(
        &self,
        config: &SourceConfig,
    ) -> Result<Box<dyn BracketSource>, SourceError> {
        if config.timeout_secs == 0 {
            return Err(SourceError::Configuration(
                "http timeout_secs must be positive".to_string(),
            ));
        }

        let source = HttpBracketSource::new(
            config.urls.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Box::new(source))
    }
}
