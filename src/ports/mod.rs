// Ports - Interface definitions for external collaborators

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::model::MediaInfo;
use crate::error::StickClipResult;

/// Port for media file probing
#[async_trait]
pub trait MediaProbePort: Send + Sync {
    /// Probe a local media file and return its intrinsic properties.
    ///
    /// Fails with `UnreadableMedia` when the file cannot be opened or
    /// carries no usable video stream.
    async fn probe(&self, path: &Path) -> StickClipResult<MediaInfo>;
}

/// Port for source acquisition.
///
/// The remote side is a black box: given a locator, the adapter either
/// materializes a local file inside `into_dir` or fails with one of the
/// taxonomy categories below.
#[async_trait]
pub trait SourcePort: Send + Sync {
    async fn fetch(&self, locator: &str, into_dir: &Path) -> Result<PathBuf, FetchError>;
}

/// Failure taxonomy of the source-acquisition collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Source removed, private, or not offered in a usable format
    #[error("source is unavailable: {0}")]
    Unavailable(String),

    /// The remote side refused access
    #[error("access to source is forbidden: {0}")]
    Forbidden(String),

    /// Transport-level failure
    #[error("network failure while fetching source: {0}")]
    Network(String),

    /// Anything the taxonomy does not recognize
    #[error("{0}")]
    Other(String),
}
