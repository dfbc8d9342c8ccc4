//! StickClip Library
//!
//! An iterative trim/crop/re-encode pipeline for short clips: probe a
//! source, adjust a bounded time window and a clamped crop region with
//! annotated previews, encode through an external encoder subprocess,
//! and retry with an escalating compression ladder until the artifact
//! fits the 256 KiB size ceiling.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::session::{EditPhase, EditSession, EncodeOutcome};
pub use domain::model::{
    CropRegion, EncodingProfile, MediaInfo, OutputArtifact, TimeWindow,
};
pub use error::{StickClipError, StickClipResult};
