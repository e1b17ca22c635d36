//! Include resolution.
//!
//! `.include` content comes through an abstract provider so a live editor
//! can interpose unsaved buffers in front of the file system. The core
//! depends only on the trait; the file-backed provider is the plain case
//! and `NullProvider` serves contexts with no include support.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to resolve an include path.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// No content exists under the given path.
    #[error("not found: {0}")]
    NotFound(String),
    /// The content exists but could not be read.
    #[error("unreadable: {0}: {1}")]
    Unreadable(String, String),
}

/// Source of include file content.
pub trait SourceProvider {
    /// Resolves a path to its source text.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NotFound`] when nothing exists under the path,
    /// [`ProviderError::Unreadable`] when reading fails.
    fn resolve(&self, path: &str) -> Result<String, ProviderError>;
}

/// Provider that resolves nothing; every include is a diagnostic.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProvider;

impl SourceProvider for NullProvider {
    fn resolve(&self, path: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotFound(path.to_string()))
    }
}

/// File-system provider rooted at a base directory.
#[derive(Clone, Debug)]
pub struct FileProvider {
    base: PathBuf,
}

impl FileProvider {
    /// Creates a provider resolving paths relative to `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl SourceProvider for FileProvider {
    fn resolve(&self, path: &str) -> Result<String, ProviderError> {
        let full = self.base.join(path);
        match std::fs::read_to_string(&full) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ProviderError::NotFound(path.to_string()))
            }
            Err(err) => Err(ProviderError::Unreadable(path.to_string(), err.to_string())),
        }
    }
}
