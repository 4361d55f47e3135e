use std::collections::{BTreeMap, HashMap};

use super::provider::{BracketSource, SourceError};

/// Backend-agnostic data source configuration.
///
/// `backend` must match the [`SourceFactory::backend_name`] of a registered
/// factory. The remaining fields are interpreted by that factory.
///
/// | backend | uses                                                   |
/// |---------|--------------------------------------------------------|
/// | `http`  | `urls` (per-year overrides), `timeout_secs`            |
/// | `file`  | `location`: directory holding `irs.tax-rates.{year}.json` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"http"`).
    pub backend: String,
    /// Backend-specific location, such as a directory path.
    pub location: String,
    /// Document URL per tax year. Years missing here use built-in defaults.
    pub urls: BTreeMap<i32, String>,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            location: String::new(),
            urls: BTreeMap::new(),
            timeout_secs: 10,
        }
    }
}

/// One implementation per data source backend, registered with a
/// [`SourceRegistry`] at startup.
pub trait SourceFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    fn create(
        &self,
        config: &SourceConfig,
    ) -> Result<Box<dyn BracketSource>, SourceError>;
}

/// Registry of [`SourceFactory`] instances, keyed by backend name.
pub struct SourceRegistry {
    factories: HashMap<&'static str, Box<dyn SourceFactory>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn SourceFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`SourceError::Configuration`] when no factory is registered for
    ///   the requested backend name.
    /// * Any error the chosen factory returns.
    pub fn create(
        &self,
        config: &SourceConfig,
    ) -> Result<Box<dyn BracketSource>, SourceError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                SourceError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::source::BracketDocument;

    // ── stub source ──────────────────────────────────────────────────────
    struct StubSource;

    #[async_trait]
    impl BracketSource for StubSource {
        fn describe(&self) -> String {
            "stub".to_string()
        }

        async fn fetch(
            &self,
            _year: i32,
        ) -> Result<BracketDocument, SourceError> {
            Ok(BracketDocument::default())
        }
    }

    // ── stub factories ───────────────────────────────────────────────────
    /// Flips an `AtomicBool` in `create` so tests can prove it was called.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    impl SourceFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        fn create(
            &self,
            _config: &SourceConfig,
        ) -> Result<Box<dyn BracketSource>, SourceError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubSource))
        }
    }

    struct FailingFactory;

    impl SourceFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        fn create(
            &self,
            _config: &SourceConfig,
        ) -> Result<Box<dyn BracketSource>, SourceError> {
            Err(SourceError::Io("intentional failure".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn SourceFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config_for(backend: &str) -> SourceConfig {
        SourceConfig {
            backend: backend.to_string(),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn default_config_is_http_with_builtin_urls() {
        let cfg = SourceConfig::default();

        assert_eq!(cfg.backend, "http");
        assert!(cfg.urls.is_empty());
        assert_eq!(cfg.timeout_secs, 10);
    }

    #[test]
    fn new_registry_has_no_backends() {
        assert!(SourceRegistry::new().available_backends().is_empty());
        assert!(SourceRegistry::default().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = SourceRegistry::new();
        let (f1, _) = stub_factory("http");
        let (f2, _) = stub_factory("file");
        reg.register(f1);
        reg.register(f2);

        assert_eq!(reg.available_backends(), vec!["file", "http"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = SourceRegistry::new();
        let (old, old_called) = stub_factory("http");
        let (new, new_called) = stub_factory("http");
        reg.register(old);
        reg.register(new);

        assert_eq!(reg.available_backends(), vec!["http"]);
        reg.create(&config_for("http")).unwrap();
        assert!(!old_called.load(Ordering::SeqCst));
        assert!(new_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn create_calls_matching_factory_only() {
        let mut reg = SourceRegistry::new();
        let (http, http_called) = stub_factory("http");
        let (file, file_called) = stub_factory("file");
        reg.register(http);
        reg.register(file);

        let source = reg.create(&config_for("file")).unwrap();

        assert!(file_called.load(Ordering::SeqCst));
        assert!(!http_called.load(Ordering::SeqCst));
        assert_eq!(source.describe(), "stub");
        assert!(source.fetch(2026).await.unwrap().is_empty());
    }

    #[test]
    fn unknown_backend_names_requested_and_available_backends() {
        let mut reg = SourceRegistry::new();
        let (f, _) = stub_factory("http");
        reg.register(f);

        match reg.create(&config_for("ftp")) {
            Err(SourceError::Configuration(msg)) => {
                assert!(msg.contains("ftp"), "error should name the requested backend");
                assert!(msg.contains("http"), "error should list available backends");
            }
            Err(other) => panic!("expected Configuration error, got {other:?}"),
            Ok(_) => panic!("expected Configuration error, got a source"),
        }
    }

    #[test]
    fn create_propagates_factory_error() {
        let mut reg = SourceRegistry::new();
        reg.register(Box::new(FailingFactory));

        match reg.create(&config_for("failing")) {
            Err(err) => assert_eq!(err, SourceError::Io("intentional failure".to_string())),
            Ok(_) => panic!("expected factory error"),
        }
    }
}
