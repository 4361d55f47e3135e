//! Bracket data backends and the CSV bracket loader.

mod file;
mod http;
mod loader;

pub use file::{FileBracketSource, FileSourceFactory, document_file_name};
pub use http::{HttpBracketSource, HttpSourceFactory};
pub use loader::{BracketLoader, BracketLoaderError, BracketRecord};

use tax_core::source::SourceRegistry;

/// A registry with every backend this crate provides.
pub fn default_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(Box::new(HttpSourceFactory));
    registry.register(Box::new(FileSourceFactory));
    registry
}
