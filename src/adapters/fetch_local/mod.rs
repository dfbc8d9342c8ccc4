//! Local-file source adapter
//!
//! The simplest implementation of the source-acquisition contract: the
//! locator is already a path on disk. Also hosts the diagnostic-text
//! classifier that maps a downloader's error output onto the fetch
//! taxonomy, shared by any remote adapter plugged in behind the same
//! port.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::ports::{FetchError, SourcePort};

/// Source adapter for locators that are local file paths
pub struct LocalFileSource;

#[async_trait]
impl SourcePort for LocalFileSource {
    async fn fetch(&self, locator: &str, _into_dir: &Path) -> Result<PathBuf, FetchError> {
        let path = PathBuf::from(locator);
        if !path.is_file() {
            return Err(FetchError::Unavailable(format!(
                "no such file: {}",
                path.display()
            )));
        }
        debug!("using local source {}", path.display());
        Ok(path)
    }
}

/// Classify a source-acquisition diagnostic into the fetch taxonomy.
///
/// The match strings follow the upstream downloader's error text.
pub fn classify_fetch_diagnostic(text: &str) -> FetchError {
    let lowered = text.to_lowercase();
    if text.contains("Requested format is not available") {
        FetchError::Unavailable(text.to_string())
    } else if text.contains("HTTP Error 403") || text.contains("Forbidden") {
        FetchError::Forbidden(text.to_string())
    } else if lowered.contains("network") || lowered.contains("connection") {
        FetchError::Network(text.to_string())
    } else {
        FetchError::Other(text.to_string())
    }
}
